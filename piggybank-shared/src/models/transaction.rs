/// Transaction model and database operations
///
/// A transaction is a single spending record owned by exactly one user.
/// Every query in this module that takes a `user_id` is owner scoped: a row
/// belonging to another user behaves exactly like a row that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE transactions (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     item_name VARCHAR(255) NOT NULL,
///     amount BIGINT NOT NULL CHECK (amount > 0 AND amount <= 2147483647),
///     category VARCHAR(100),
///     note VARCHAR(500),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::analysis::{CategoryTotal, SpendingTotals, TOP_CATEGORY_LIMIT, UNCATEGORIZED};

/// Largest amount a single transaction may carry
pub const MAX_AMOUNT: i64 = i32::MAX as i64;

/// Transaction model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: i64,

    /// Owning user ID
    pub user_id: i64,

    /// What was bought (1-255 characters)
    pub item_name: String,

    /// Amount in the smallest currency unit, `1..=MAX_AMOUNT`
    pub amount: i64,

    /// Optional spending category (at most 100 characters)
    pub category: Option<String>,

    /// Optional free-text note (at most 500 characters)
    pub note: Option<String>,

    /// When the transaction was recorded
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new transaction
///
/// Field constraints are validated by the API layer before this reaches a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub item_name: String,
    pub amount: i64,
    pub category: Option<String>,
    pub note: Option<String>,
}

/// Input for a partial update
///
/// Only `Some` fields are written. `category` and `note` are nullable, so
/// `Some(None)` clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTransaction {
    pub item_name: Option<String>,
    pub amount: Option<i64>,
    pub category: Option<Option<String>>,
    pub note: Option<Option<String>>,
}

impl UpdateTransaction {
    /// Applies the supplied fields to an existing transaction
    ///
    /// Does not touch `updated_at`; callers that persist the result set it.
    pub fn apply_to(self, transaction: &mut Transaction) {
        if let Some(item_name) = self.item_name {
            transaction.item_name = item_name;
        }
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(category) = self.category {
            transaction.category = category;
        }
        if let Some(note) = self.note {
            transaction.note = note;
        }
    }
}

const COLUMNS: &str = "id, user_id, item_name, amount, category, note, created_at, updated_at";

impl Transaction {
    /// Inserts a transaction owned by `user_id`
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        data: CreateTransaction,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO transactions (user_id, item_name, amount, category, note) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Transaction>(&query)
            .bind(user_id)
            .bind(data.item_name)
            .bind(data.amount)
            .bind(data.category)
            .bind(data.note)
            .fetch_one(pool)
            .await
    }

    /// Finds a transaction by ID with owner isolation
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM transactions WHERE id = $1 AND user_id = $2");

        sqlx::query_as::<_, Transaction>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's transactions, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transactions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, Transaction>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Applies a partial update with owner isolation
    ///
    /// Returns `None` if the transaction does not exist or belongs to
    /// another user. An empty update still refreshes `updated_at`.
    pub async fn update_for_user(
        pool: &PgPool,
        user_id: i64,
        id: i64,
        data: UpdateTransaction,
    ) -> Result<Option<Self>, sqlx::Error> {
        // $1 and $2 are reserved for id and user_id
        let mut query = String::from("UPDATE transactions SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.item_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", item_name = ${}", bind_count));
        }
        if data.amount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", amount = ${}", bind_count));
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.note.is_some() {
            bind_count += 1;
            query.push_str(&format!(", note = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Transaction>(&query).bind(id).bind(user_id);

        if let Some(item_name) = data.item_name {
            q = q.bind(item_name);
        }
        if let Some(amount) = data.amount {
            q = q.bind(amount);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(note) = data.note {
            q = q.bind(note);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a transaction with owner isolation
    ///
    /// Returns false if nothing was deleted.
    pub async fn delete_for_user(pool: &PgPool, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sums and counts all of a user's transactions
    pub async fn totals_for_user(pool: &PgPool, user_id: i64) -> Result<SpendingTotals, sqlx::Error> {
        // SUM(BIGINT) is NUMERIC in PostgreSQL
        let (total_amount, transaction_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT, COUNT(id)
            FROM transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(SpendingTotals {
            total_amount,
            transaction_count,
        })
    }

    /// Returns the user's top spending categories
    ///
    /// Rows without a category are grouped under [`UNCATEGORIZED`]. Equal
    /// sums are ordered by category name, byte-wise like the in-memory store.
    pub async fn top_categories_for_user(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<CategoryTotal>, sqlx::Error> {
        // ORDER BY only accepts output aliases as bare names, so the
        // collated sort key repeats the grouping expression
        let query = format!(
            r#"
            SELECT COALESCE(category, '{UNCATEGORIZED}') AS label, SUM(amount)::BIGINT AS total
            FROM transactions
            WHERE user_id = $1
            GROUP BY COALESCE(category, '{UNCATEGORIZED}')
            ORDER BY SUM(amount) DESC, COALESCE(category, '{UNCATEGORIZED}') COLLATE "C" ASC
            LIMIT $2
            "#
        );

        let rows: Vec<(String, i64)> = sqlx::query_as(&query)
            .bind(user_id)
            .bind(TOP_CATEGORY_LIMIT as i64)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(category, amount)| CategoryTotal { category, amount })
            .collect())
    }
}
