/// Authentication utilities
///
/// Piggy Bank does not manage credentials. Users sign in with an external
/// identity provider and call the API with an HS256 bearer token whose `sub`
/// claim identifies them.
///
/// # Modules
///
/// - [`jwt`]: Token creation and validation
/// - [`context`]: Request extensions carrying the authenticated identity

pub mod context;
pub mod jwt;
