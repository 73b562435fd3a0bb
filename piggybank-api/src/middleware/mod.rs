/// Middleware modules for the API server
///
/// - `auth`: Bearer token validation and registered-user resolution
/// - `security`: Security response headers

pub mod auth;
pub mod security;
