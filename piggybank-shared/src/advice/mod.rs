/// AI spending advice
///
/// Turns a [`SpendingSummary`](crate::analysis::SpendingSummary) into advice
/// from an external text-generation service.
///
/// # Flow
///
/// ```text
/// SpendingSummary
///   ├─> build_prompt()            deterministic prompt text
///   ├─> AdviceClient::complete()  one call, temperature 0.7, no retry
///   ├─> parse_advice()            strict four-field JSON
///   └─> AdviceOutcome
///         ├─ Generated(advice)
///         └─ Fallback { advice: fallback_advice(), error }
/// ```
///
/// Generation never fails outward: any client or parse error becomes a
/// `Fallback` carrying the error text, so callers can tell the two apart.
///
/// # Modules
///
/// - [`client`]: The `AdviceClient` trait and its error type
/// - [`openai`]: Chat-completions client over HTTP
/// - [`mock`]: Deterministic client for tests and demos
/// - [`generator`]: Prompt construction, parsing and the report envelope

use serde::{Deserialize, Serialize};

pub mod client;
pub mod generator;
pub mod mock;
pub mod openai;

pub use client::{AdviceClient, AdviceError, CompletionRequest};
pub use generator::{AdviceGenerator, AdviceOutcome, AnalysisReport};
pub use mock::MockAdviceClient;
pub use openai::{OpenAiClient, OpenAiConfig};

/// Overall assessment of the user's spending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceStatus {
    Safe,
    Warning,
    Danger,
}

/// Structured advice returned by the model
///
/// Length hints in the prompt (`message` about 50 characters, `advice`
/// about 150) are not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiAdvice {
    pub status: AdviceStatus,
    pub message: String,
    pub advice: String,
    pub action_items: Vec<String>,
}

/// Static advice served when generation fails
pub fn fallback_advice() -> AiAdvice {
    AiAdvice {
        status: AdviceStatus::Safe,
        message: "Analyzing your data".to_string(),
        advice: "An error occurred while generating AI advice. Please try again later."
            .to_string(),
        action_items: vec![
            "Review your transactions".to_string(),
            "Organize your categories".to_string(),
        ],
    }
}
