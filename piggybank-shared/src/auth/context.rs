/// Authenticated request context
///
/// The API's auth middleware validates the bearer token, then inserts an
/// [`AuthContext`] into the request extensions. Routes that act on behalf of a
/// registered user additionally receive a [`CurrentUser`].

use serde::{Deserialize, Serialize};

use super::jwt::Claims;
use crate::models::user::User;

/// Identity taken from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// External auth subject (`users.auth_id`)
    pub subject: String,

    /// Email claim, if the provider sent one
    pub email: Option<String>,

    /// Name claim, if the provider sent one
    pub name: Option<String>,
}

impl AuthContext {
    /// Creates auth context from JWT claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// The registered user behind the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Database ID used to scope every store call
    pub fn id(&self) -> i64 {
        self.0.id
    }
}
