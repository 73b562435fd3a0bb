/// Database layer for Piggy Bank
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Embedded sqlx migrations
///
/// Queries live on the models in [`crate::models`].

pub mod migrations;
pub mod pool;
