/// JWT token generation and validation
///
/// Bearer tokens carry the identity of a user authenticated by an external
/// provider. The `sub` claim is the provider's subject identifier and maps to
/// `users.auth_id`; optional `email` and `name` claims describe the profile.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: signature, expiration, and issuer when one is configured
/// - **Secret Management**: secrets should be at least 32 bytes
///
/// # Example
///
/// ```
/// use piggybank_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
///
/// let claims = Claims::new("google-oauth2|1234", Duration::minutes(30))
///     .with_profile("user@example.com", "Hanako");
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret, None)?;
/// assert_eq!(validated.sub, "google-oauth2|1234");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Issuer did not match the configured one
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
///
/// # Standard Claims
///
/// - `sub`: external auth subject (`users.auth_id`)
/// - `iss`: issuer, checked only when the server is configured with one
/// - `iat`, `exp`, `nbf`: issued at, expiration, not before
///
/// # Profile Claims
///
/// - `email`, `name`: used as defaults when registering the subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - external auth identity
    pub sub: String,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Email address reported by the identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Display name reported by the identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Claims {
    /// Creates claims for `subject` expiring after `expires_in`
    ///
    /// A negative duration yields an already-expired token, which is handy
    /// in tests.
    pub fn new(subject: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: subject.into(),
            iss: None,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: Some(now.timestamp()),
            email: None,
            name: None,
        }
    }

    /// Attaches profile claims
    pub fn with_profile(mut self, email: impl Into<String>, name: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.name = Some(name.into());
        self
    }

    /// Sets the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a token using HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues an access token for a subject
///
/// Convenience for tooling and tests that need a token matching the
/// server's configuration.
pub fn issue_access_token(
    subject: &str,
    secret: &str,
    issuer: Option<&str>,
    lifetime: Duration,
) -> Result<String, JwtError> {
    let mut claims = Claims::new(subject, lifetime);
    if let Some(issuer) = issuer {
        claims = claims.with_issuer(issuer);
    }
    create_token(&claims, secret)
}

/// Validates a token and extracts its claims
///
/// Verifies the signature and expiration. When `issuer` is `Some`, the
/// `iss` claim must be present and equal to it.
///
/// # Errors
///
/// - `JwtError::Expired` if the token has expired
/// - `JwtError::InvalidIssuer` if the issuer doesn't match
/// - `JwtError::ValidationError` for any other failure
pub fn validate_token(token: &str, secret: &str, issuer: Option<&str>) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
    }

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: issuer.unwrap_or_default().to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    if token_data.claims.sub.is_empty() {
        return Err(JwtError::ValidationError("Token subject is empty".to_string()));
    }

    Ok(token_data.claims)
}
