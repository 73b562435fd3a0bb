/// In-memory store
///
/// A process-local implementation of the store traits. Data lives in
/// ordered maps behind a single async `RwLock` and disappears with the
/// process. Semantics match [`super::PgStore`]: owner scoping, cascade on
/// user deletion, unique `auth_id` and `email`, and the same category
/// ranking rule.
///
/// # Example
///
/// ```
/// use piggybank_shared::models::transaction::CreateTransaction;
/// use piggybank_shared::store::{MemoryStore, TransactionStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let created = store.create(1, CreateTransaction {
///     item_name: "Bus ticket".to_string(),
///     amount: 230,
///     category: Some("transport".to_string()),
///     note: None,
/// }).await?;
///
/// assert!(store.find(2, created.id).await?.is_none());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, TransactionStore, UserStore};
use crate::analysis::{rank_categories, CategoryTotal, SpendingTotals};
use crate::models::transaction::{CreateTransaction, Transaction, UpdateTransaction};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    transactions: BTreeMap<i64, Transaction>,
    last_user_id: i64,
    last_transaction_id: i64,
}

impl Inner {
    fn owned_by(&self, user_id: i64) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .values()
            .filter(move |transaction| transaction.user_id == user_id)
    }
}

/// Store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(&self, user_id: i64, data: CreateTransaction) -> StoreResult<Transaction> {
        let mut inner = self.inner.write().await;
        inner.last_transaction_id += 1;

        let now = Utc::now();
        let transaction = Transaction {
            id: inner.last_transaction_id,
            user_id,
            item_name: data.item_name,
            amount: data.amount,
            category: data.category,
            note: data.note,
            created_at: now,
            updated_at: now,
        };

        inner.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn find(&self, user_id: i64, id: i64) -> StoreResult<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .get(&id)
            .filter(|transaction| transaction.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: i64, offset: i64, limit: i64) -> StoreResult<Vec<Transaction>> {
        let inner = self.inner.read().await;
        let mut owned: Vec<Transaction> = inner.owned_by(user_id).cloned().collect();

        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update(
        &self,
        user_id: i64,
        id: i64,
        data: UpdateTransaction,
    ) -> StoreResult<Option<Transaction>> {
        let mut inner = self.inner.write().await;

        let Some(transaction) = inner
            .transactions
            .get_mut(&id)
            .filter(|transaction| transaction.user_id == user_id)
        else {
            return Ok(None);
        };

        data.apply_to(transaction);
        transaction.updated_at = Utc::now();
        Ok(Some(transaction.clone()))
    }

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;

        let owned = inner
            .transactions
            .get(&id)
            .is_some_and(|transaction| transaction.user_id == user_id);
        if owned {
            inner.transactions.remove(&id);
        }

        Ok(owned)
    }

    async fn totals(&self, user_id: i64) -> StoreResult<SpendingTotals> {
        let inner = self.inner.read().await;
        let totals = inner
            .owned_by(user_id)
            .try_fold(SpendingTotals::default(), |totals, transaction| {
                totals.record(transaction.amount)
            })?;
        Ok(totals)
    }

    async fn top_categories(&self, user_id: i64) -> StoreResult<Vec<CategoryTotal>> {
        let inner = self.inner.read().await;
        let ranked = rank_categories(inner.owned_by(user_id).map(|transaction| {
            (transaction.category.as_deref(), transaction.amount)
        }))?;
        Ok(ranked)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|user| user.auth_id == data.auth_id) {
            return Err(StoreError::Conflict("User already registered".to_string()));
        }
        if inner.users.values().any(|user| user.email == data.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        inner.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.last_user_id,
            auth_id: data.auth_id,
            email: data.email,
            name: data.name,
            avatar_url: data.avatar_url,
            created_at: now,
            updated_at: now,
        };

        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_auth_id(&self, auth_id: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.auth_id == auth_id)
            .cloned())
    }

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(avatar_url) = data.avatar_url {
            user.avatar_url = avatar_url;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;

        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }
        inner.transactions.retain(|_, transaction| transaction.user_id != id);

        Ok(true)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
