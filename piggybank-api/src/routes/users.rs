/// User profile endpoints
///
/// Identity comes from the external provider's token; these endpoints only
/// link the token subject to a local profile and manage it.
///
/// # Endpoints
///
/// - `POST /api/v1/users/` - Register the token subject (201, 409 if already registered)
/// - `GET /api/v1/users/me` - Own profile
/// - `PUT /api/v1/users/me` - Update `name` and/or `avatar_url`
/// - `DELETE /api/v1/users/me` - Delete profile and all transactions (204)
///
/// The `me` routes answer 404 while the token subject is not registered.

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use piggybank_shared::{
    auth::context::AuthContext,
    models::{
        double_option,
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::Deserialize;
use validator::Validate;

const AVATAR_URL_MAX: usize = 512;

/// Registration request
///
/// Fields left out are taken from the token's `email` and `name` claims.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 512, message = "Avatar URL must be at most 512 characters"))]
    pub avatar_url: Option<String>,
}

/// Profile update request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    /// `null` removes the avatar
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

/// Register the token subject
pub async fn register(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    validate_request(&req)?;

    let email = req
        .email
        .or(auth.email)
        .ok_or_else(|| ApiError::invalid_field("email", "Email is required"))?;
    let name = req
        .name
        .or(auth.name)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_field("name", "Name is required"))?;

    let user = state
        .store
        .create_user(CreateUser {
            auth_id: auth.subject,
            email,
            name,
            avatar_url: req.avatar_url,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

async fn registered_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    state
        .store
        .find_user_by_auth_id(&auth.subject)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Own profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    registered_user(&state, &auth).await.map(Json)
}

/// Update own profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let user = registered_user(&state, &auth).await?;
    validate_request(&req)?;
    if let Some(Some(url)) = &req.avatar_url {
        if url.chars().count() > AVATAR_URL_MAX {
            return Err(ApiError::invalid_field(
                "avatar_url",
                "Avatar URL must be at most 512 characters",
            ));
        }
    }

    let updated = state
        .store
        .update_user(
            user.id,
            UpdateUser {
                name: req.name,
                avatar_url: req.avatar_url,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete own profile and every transaction it owns
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    let user = registered_user(&state, &auth).await?;
    if !state.store.delete_user(user.id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = user.id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
