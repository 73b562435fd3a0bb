/// Storage abstraction
///
/// Handlers talk to persistence only through the traits in this module, so
/// the same routes run against PostgreSQL in production and against the
/// in-memory store in tests and demos.
///
/// # Owner Scoping
///
/// Every transaction operation takes the requesting user's ID. A lookup,
/// update or delete of a transaction owned by someone else returns
/// `None`/`false`, exactly as if the transaction did not exist.
///
/// # Implementations
///
/// - [`PgStore`]: PostgreSQL via sqlx
/// - [`MemoryStore`]: process-local maps behind a lock

use async_trait::async_trait;
use std::sync::Arc;

use crate::analysis::{AmountOverflow, CategoryTotal, SpendingTotals};
use crate::models::transaction::{CreateTransaction, Transaction, UpdateTransaction};
use crate::models::user::{CreateUser, UpdateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (e.g. duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An aggregate did not fit in `i64`
    #[error(transparent)]
    Overflow(#[from] AmountOverflow),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Owner-scoped transaction persistence
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Creates a transaction owned by `user_id`
    async fn create(&self, user_id: i64, data: CreateTransaction) -> StoreResult<Transaction>;

    /// Point lookup scoped to the owner
    async fn find(&self, user_id: i64, id: i64) -> StoreResult<Option<Transaction>>;

    /// Lists the owner's transactions, newest first
    async fn list(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Transaction>>;

    /// Partial update scoped to the owner; refreshes `updated_at`
    async fn update(
        &self,
        user_id: i64,
        id: i64,
        data: UpdateTransaction,
    ) -> StoreResult<Option<Transaction>>;

    /// Deletes a transaction scoped to the owner
    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<bool>;

    /// Sum and count over all of the owner's transactions
    async fn totals(&self, user_id: i64) -> StoreResult<SpendingTotals>;

    /// Top categories by summed amount (see [`crate::analysis::rank_categories`])
    async fn top_categories(&self, user_id: i64) -> StoreResult<Vec<CategoryTotal>>;
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Registers a user; fails with [`StoreError::Conflict`] on a duplicate
    /// `auth_id` or `email`
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Looks a user up by external auth subject
    async fn find_user_by_auth_id(&self, auth_id: &str) -> StoreResult<Option<User>>;

    /// Updates a profile
    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Deletes a user together with all their transactions
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Everything the API needs from persistence
pub trait Store: TransactionStore + UserStore {
    /// Upcasts to the transaction half
    fn transactions(&self) -> &dyn TransactionStore;
}

impl<T: TransactionStore + UserStore> Store for T {
    fn transactions(&self) -> &dyn TransactionStore {
        self
    }
}

/// Shared, type-erased store handle
pub type SharedStore = Arc<dyn Store>;
