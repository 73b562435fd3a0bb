/// Advice generation
///
/// Builds the prompt from a spending summary, calls the advice client once,
/// and parses the reply. Failures are absorbed into a fallback so the
/// analysis endpoint always answers with a complete report.

use std::sync::{Arc, OnceLock};

use numfmt::{Formatter, Precision};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::client::{AdviceClient, AdviceError, CompletionRequest};
use super::{fallback_advice, AiAdvice};
use crate::analysis::{self, CategoryTotal, SpendingSummary};
use crate::store::{StoreResult, TransactionStore};

/// Fixed system instruction
pub const SYSTEM_INSTRUCTION: &str =
    "You are a financial planner. Always answer with a single JSON object and nothing else.";

/// Sampling temperature for every advice request
pub const TEMPERATURE: f64 = 0.7;

/// Result of one advice attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceOutcome {
    /// The service answered with well-formed advice
    Generated(AiAdvice),

    /// Generation failed; `advice` is the static fallback
    Fallback { advice: AiAdvice, error: String },
}

impl AdviceOutcome {
    fn fallback(error: &AdviceError) -> Self {
        Self::Fallback {
            advice: fallback_advice(),
            error: error.to_string(),
        }
    }

    pub fn advice(&self) -> &AiAdvice {
        match self {
            Self::Generated(advice) | Self::Fallback { advice, .. } => advice,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Generated(_) => None,
            Self::Fallback { error, .. } => Some(error),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    fn into_parts(self) -> (AiAdvice, Option<String>) {
        match self {
            Self::Generated(advice) => (advice, None),
            Self::Fallback { advice, error } => (advice, Some(error)),
        }
    }
}

/// Body of `GET /api/v1/analysis/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_amount: i64,
    pub transaction_count: i64,
    pub top_categories: Vec<CategoryTotal>,
    pub ai_advice: AiAdvice,

    /// Present only when the advice is the fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisReport {
    pub fn new(summary: SpendingSummary, outcome: AdviceOutcome) -> Self {
        let (ai_advice, error) = outcome.into_parts();
        Self {
            total_amount: summary.total_amount,
            transaction_count: summary.transaction_count,
            top_categories: summary.top_categories,
            ai_advice,
            error,
        }
    }
}

fn thousands_separator_formatter() -> &'static Formatter {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();

    FORMATTER.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .unwrap_or_else(|_| Formatter::new())
            .precision(Precision::Decimals(0))
    })
}

/// Formats an integer amount with `,` thousands separators
pub fn format_amount(amount: i64) -> String {
    let digits = thousands_separator_formatter().fmt_string(amount.unsigned_abs());
    if amount < 0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Builds the user prompt for a summary
///
/// Identical summaries always yield identical prompts.
pub fn build_prompt(summary: &SpendingSummary) -> String {
    let categories = if summary.top_categories.is_empty() {
        "- none recorded".to_string()
    } else {
        summary
            .top_categories
            .iter()
            .map(|c| format!("- {}: {}", c.category, format_amount(c.amount)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Analyze the user's spending data below and give advice.
All amounts are integers in the smallest currency unit.

Total spending: {total}
Number of transactions: {count}
Top spending categories (up to 5):
{categories}

Respond with JSON only, in exactly this format:
{{
    "status": "safe" | "warning" | "danger",
    "message": "short message (about 50 characters)",
    "advice": "specific advice (about 150 characters)",
    "action_items": ["action 1", "action 2", "action 3"]
}}"#,
        total = format_amount(summary.total_amount),
        count = summary.transaction_count,
        categories = categories,
    )
}

/// Parses the reply text as advice
///
/// The text must be exactly one JSON object with the four advice fields;
/// surrounding whitespace is tolerated, anything else is not.
pub fn parse_advice(text: &str) -> Result<AiAdvice, AdviceError> {
    serde_json::from_str(text.trim()).map_err(|e| AdviceError::MalformedAdvice(e.to_string()))
}

/// Produces advice for spending summaries through an [`AdviceClient`]
#[derive(Clone)]
pub struct AdviceGenerator {
    client: Arc<dyn AdviceClient>,
    model: String,
    max_tokens: u32,
}

impl AdviceGenerator {
    pub fn new(client: Arc<dyn AdviceClient>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }

    /// The request sent for `summary`
    pub fn request_for(&self, summary: &SpendingSummary) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(summary),
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
        }
    }

    /// Generates advice, falling back on any failure
    ///
    /// Makes exactly one client call.
    pub async fn generate(&self, summary: &SpendingSummary) -> AdviceOutcome {
        let request = self.request_for(summary);

        let result = match self.client.complete(&request).await {
            Ok(text) => parse_advice(&text),
            Err(err) => Err(err),
        };

        match result {
            Ok(advice) => {
                debug!(client = self.client.name(), status = ?advice.status, "Advice generated");
                AdviceOutcome::Generated(advice)
            }
            Err(err) => {
                warn!(client = self.client.name(), error = %err, "Advice generation failed, using fallback");
                AdviceOutcome::fallback(&err)
            }
        }
    }

    /// Summarizes a user's spending and attaches advice
    ///
    /// # Errors
    ///
    /// Only storage failures propagate; advice failures become a fallback.
    pub async fn analyze(
        &self,
        store: &dyn TransactionStore,
        user_id: i64,
    ) -> StoreResult<AnalysisReport> {
        let summary = analysis::summarize(store, user_id).await?;
        let outcome = self.generate(&summary).await;
        Ok(AnalysisReport::new(summary, outcome))
    }
}
