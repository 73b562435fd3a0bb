/// Database models for Piggy Bank
///
/// This module contains the persisted entities and their PostgreSQL queries.
///
/// # Models
///
/// - `user`: Users linked to an external auth identity
/// - `transaction`: Spending records owned by a user
///
/// # Example
///
/// ```no_run
/// use piggybank_shared::models::transaction::{CreateTransaction, Transaction};
/// use piggybank_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new("postgresql://localhost/piggybank", 5)).await?;
///
/// let transaction = Transaction::create(&pool, 1, CreateTransaction {
///     item_name: "Lunch".to_string(),
///     amount: 1200,
///     category: Some("food".to_string()),
///     note: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod transaction;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "explicitly null"
///
/// Use together with `#[serde(default)]`: a missing field stays `None`,
/// `null` becomes `Some(None)` and a value becomes `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
