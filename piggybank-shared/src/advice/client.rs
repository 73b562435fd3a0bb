/// Advice service client contract
///
/// An `AdviceClient` sends one system instruction and one user prompt to a
/// text-generation service and returns the raw reply text. Interpreting the
/// text is the generator's job.
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use piggybank_shared::advice::{AdviceClient, AdviceError, CompletionRequest};
///
/// struct EchoClient;
///
/// #[async_trait]
/// impl AdviceClient for EchoClient {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn complete(&self, request: &CompletionRequest) -> Result<String, AdviceError> {
///         Ok(request.prompt.clone())
///     }
/// }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Advice client error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdviceError {
    /// The request could not be sent or the connection failed
    #[error("Advice service request failed: {0}")]
    Request(String),

    /// The request did not finish within the configured timeout
    #[error("Advice service request timed out")]
    Timeout,

    /// The service answered with a non-success status
    #[error("Advice service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service's response envelope could not be decoded
    #[error("Invalid advice service response: {0}")]
    InvalidResponse(String),

    /// The response contained no reply text
    #[error("Advice service returned no content")]
    EmptyResponse,

    /// The reply text was not advice JSON of the expected shape
    #[error("Malformed advice: {0}")]
    MalformedAdvice(String),
}

/// One text-generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// Fixed system instruction
    pub system: String,

    /// User prompt built from the spending summary
    pub prompt: String,

    /// Output token budget
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f64,
}

/// Text-generation backend
#[async_trait]
pub trait AdviceClient: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Sends the request once and returns the reply text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AdviceError>;
}
