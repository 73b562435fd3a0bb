/// Mock advice client for testing
///
/// Returns a canned reply (or error) without any network access and records
/// every request it receives.
///
/// # Example
///
/// ```
/// use piggybank_shared::advice::{AdviceClient, AdviceError, MockAdviceClient};
///
/// let ok = MockAdviceClient::new();
/// let failing = MockAdviceClient::failing(AdviceError::Timeout);
/// assert_eq!(ok.name(), "mock");
/// assert!(failing.requests().is_empty());
/// ```

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::client::{AdviceClient, AdviceError, CompletionRequest};

/// Reply used by [`MockAdviceClient::new`]
pub const DEFAULT_REPLY: &str = r#"{
    "status": "warning",
    "message": "Spending is piling up",
    "advice": "Most of your spending has no category. Tag purchases so you can see where money goes.",
    "action_items": ["Categorize past purchases", "Set a weekly food budget", "Review subscriptions"]
}"#;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(AdviceError),
}

/// Deterministic [`AdviceClient`]
#[derive(Debug)]
pub struct MockAdviceClient {
    reply: Reply,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockAdviceClient {
    /// Replies with [`DEFAULT_REPLY`]
    pub fn new() -> Self {
        Self::replying(DEFAULT_REPLY)
    }

    /// Replies with `text` verbatim
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `error`
    pub fn failing(error: AdviceError) -> Self {
        Self {
            reply: Reply::Error(error),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for MockAdviceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdviceClient for MockAdviceClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AdviceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Error(err) => Err(err.clone()),
        }
    }
}
