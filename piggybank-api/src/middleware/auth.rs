/// Authentication middleware
///
/// Two layers, applied in order:
///
/// 1. [`jwt_auth_layer`] validates the bearer token and inserts an
///    [`AuthContext`].
/// 2. [`require_user`] resolves the token subject to a registered user and
///    inserts a [`CurrentUser`]. Routes that only need the identity (user
///    registration) skip this layer.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use piggybank_shared::auth::context::{AuthContext, CurrentUser};
use piggybank_shared::auth::jwt;

use crate::{app::AppState, config::JwtConfig, error::ApiError};

/// Extracts the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
    }

    Ok(token)
}

/// Issues a token this server accepts, for tooling and tests
pub fn mint_access_token(config: &JwtConfig, subject: &str) -> Result<String, jwt::JwtError> {
    jwt::issue_access_token(
        subject,
        &config.secret,
        config.issuer.as_deref(),
        chrono::Duration::minutes(config.access_token_expire_minutes),
    )
}

/// JWT authentication middleware layer
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;

    let claims = jwt::validate_token(
        token,
        &state.config.jwt.secret,
        state.config.jwt.issuer.as_deref(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(claims));

    Ok(next.run(req).await)
}

/// Registered-user middleware layer
///
/// Must run after [`jwt_auth_layer`].
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = req
        .extensions()
        .get::<AuthContext>()
        .map(|auth| auth.subject.clone())
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    let user = state
        .store
        .find_user_by_auth_id(&subject)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User is not registered".to_string()))?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
