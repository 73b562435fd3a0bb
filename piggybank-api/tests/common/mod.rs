//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory store and a mock advice client,
//! so the HTTP surface can be exercised without PostgreSQL or network access.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use piggybank_api::app::{build_router, AppState};
use piggybank_api::config::Config;
use piggybank_shared::advice::MockAdviceClient;
use piggybank_shared::auth::jwt::{create_token, Claims};
use piggybank_shared::store::{MemoryStore, SharedStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the app and its backing services
pub struct TestContext {
    pub app: axum::Router,
    pub store: SharedStore,
    pub advice: Arc<MockAdviceClient>,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "postgresql://localhost/piggybank_test",
            "JWT_SECRET" => JWT_SECRET,
            "OPENAI_API_KEY" => "sk-test",
            "OPENAI_MODEL" => "test-model",
            "OPENAI_MAX_TOKENS" => "400",
            "APP_NAME" => "Piggy Bank API",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test configuration is valid")
}

impl TestContext {
    /// Context whose advice client returns the default canned reply
    pub fn new() -> Self {
        Self::with_advice(MockAdviceClient::new())
    }

    pub fn with_advice(advice: MockAdviceClient) -> Self {
        let config = test_config();
        let store: SharedStore = Arc::new(MemoryStore::new());
        let advice = Arc::new(advice);

        let state = AppState::new(store.clone(), advice.clone(), config.clone());
        let app = build_router(state);

        TestContext {
            app,
            store,
            advice,
            config,
        }
    }

    /// Signs a token for `subject` carrying profile claims
    pub fn token_for(&self, subject: &str) -> String {
        let claims = Claims::new(subject, Duration::minutes(30))
            .with_profile(format!("{}@example.com", subject), format!("User {}", subject));
        create_token(&claims, JWT_SECRET).expect("token is signed")
    }

    /// Sends a request and returns the status with the decoded JSON body
    ///
    /// Empty bodies decode to `Value::Null`; non-JSON bodies to a string.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, value)
    }

    /// Registers `subject` and returns a token for it
    pub async fn register(&self, subject: &str) -> String {
        let token = self.token_for(subject);
        let (status, body) = self
            .send("POST", "/api/v1/users/", Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
        token
    }

    /// Creates a transaction and returns its JSON
    pub async fn create_transaction(
        &self,
        token: &str,
        item_name: &str,
        amount: i64,
        category: Option<&str>,
    ) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/transactions/",
                Some(token),
                Some(json!({
                    "item_name": item_name,
                    "amount": amount,
                    "category": category,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }
}
