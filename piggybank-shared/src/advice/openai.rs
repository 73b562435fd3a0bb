/// OpenAI-compatible chat-completions client
///
/// Sends the system instruction and prompt as two chat messages to
/// `{base_url}/chat/completions` and returns the first choice's content.
///
/// # Example
///
/// ```no_run
/// use piggybank_shared::advice::{OpenAiClient, OpenAiConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OpenAiClient::new(OpenAiConfig {
///     api_key: "sk-...".to_string(),
///     base_url: "https://api.openai.com/v1".to_string(),
///     timeout: None,
/// })?;
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{AdviceClient, AdviceError, CompletionRequest};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer API key
    pub api_key: String,

    /// API root, without the `/chat/completions` suffix
    pub base_url: String,

    /// Whole-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

/// HTTP client for the chat-completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Builds the client
    ///
    /// # Errors
    ///
    /// Returns `AdviceError::Request` if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> Result<Self, AdviceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AdviceError::Request(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    /// Full URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(err: reqwest::Error) -> AdviceError {
    if err.is_timeout() {
        AdviceError::Timeout
    } else {
        AdviceError::Request(err.to_string())
    }
}

#[async_trait]
impl AdviceClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AdviceError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(model = %request.model, endpoint = %self.endpoint, "Requesting chat completion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(AdviceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AdviceError::Timeout
            } else {
                AdviceError::InvalidResponse(e.to_string())
            }
        })?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AdviceError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn client_for(base_url: String, timeout: Option<Duration>) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig {
            api_key: "test-key".to_string(),
            base_url,
            timeout,
        })
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            system: "system text".to_string(),
            prompt: "prompt text".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = client_for("http://localhost:9/v1/".to_string(), None);
        assert_eq!(client.endpoint(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                assert_eq!(auth, "Bearer test-key");
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["max_tokens"], 1000);
                assert_eq!(body["temperature"], 0.7);
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "prompt text");

                Json(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "first" } },
                        { "message": { "role": "assistant", "content": "second" } }
                    ]
                }))
            }),
        );
        let client = client_for(spawn_server(router).await, None);

        let reply = client.complete(&request()).await.unwrap();
        assert_eq!(reply, "first");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let client = client_for(spawn_server(router).await, None);

        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(
            err,
            AdviceError::Status {
                status: 429,
                body: "slow down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_reported() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            // The request body is a JSON object
            while !received.ends_with(b"}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        let client = client_for(format!("http://{}/v1", addr), None);

        match client.complete(&request()).await.unwrap_err() {
            AdviceError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.starts_with("<unreadable body:"), "{}", body);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let client = client_for(spawn_server(router).await, None);

        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(err, AdviceError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "choices": [] }))
            }),
        );
        let client = client_for(
            spawn_server(router).await,
            Some(Duration::from_millis(100)),
        );

        let err = client.complete(&request()).await.unwrap_err();
        assert_eq!(err, AdviceError::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}/v1", addr), None);
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AdviceError::Request(_)));
    }
}
