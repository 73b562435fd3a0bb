/// API route handlers
///
/// - `health`: Service banner and health check
/// - `users`: Registration and own profile
/// - `transactions`: Owner-scoped transaction CRUD
/// - `analysis`: Spending summary with AI advice

pub mod analysis;
pub mod health;
pub mod transactions;
pub mod users;
