/// PostgreSQL store
///
/// Thin adapter from the store traits to the sqlx queries on the models.
/// Each call borrows a pooled connection for the duration of one query and
/// returns it to the pool when the query future completes or is dropped.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, StoreResult, TransactionStore, UserStore};
use crate::analysis::{CategoryTotal, SpendingTotals};
use crate::db::pool::health_check;
use crate::models::transaction::{CreateTransaction, Transaction, UpdateTransaction};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique constraint violations to [`StoreError::Conflict`]
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(constraint) = db_err.constraint() {
            if constraint.contains("email") {
                return StoreError::Conflict("Email already registered".to_string());
            }
            if constraint.contains("auth_id") {
                return StoreError::Conflict("User already registered".to_string());
            }
            return StoreError::Conflict(format!("Constraint violation: {}", constraint));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn create(&self, user_id: i64, data: CreateTransaction) -> StoreResult<Transaction> {
        Ok(Transaction::create(&self.pool, user_id, data).await?)
    }

    async fn find(&self, user_id: i64, id: i64) -> StoreResult<Option<Transaction>> {
        Ok(Transaction::find_for_user(&self.pool, user_id, id).await?)
    }

    async fn list(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Transaction>> {
        Ok(Transaction::list_for_user(&self.pool, user_id, offset, limit).await?)
    }

    async fn update(
        &self,
        user_id: i64,
        id: i64,
        data: UpdateTransaction,
    ) -> StoreResult<Option<Transaction>> {
        Ok(Transaction::update_for_user(&self.pool, user_id, id, data).await?)
    }

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<bool> {
        Ok(Transaction::delete_for_user(&self.pool, user_id, id).await?)
    }

    async fn totals(&self, user_id: i64) -> StoreResult<SpendingTotals> {
        Ok(Transaction::totals_for_user(&self.pool, user_id).await?)
    }

    async fn top_categories(&self, user_id: i64) -> StoreResult<Vec<CategoryTotal>> {
        Ok(Transaction::top_categories_for_user(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_user_by_auth_id(&self, auth_id: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_auth_id(&self.pool, auth_id).await?)
    }

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, id, data).await?)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
