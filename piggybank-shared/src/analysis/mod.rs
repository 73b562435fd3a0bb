/// Spending aggregation
///
/// Computes the numeric half of a user's spending report: the total amount,
/// the number of transactions and the top categories by summed amount. The
/// report is recomputed from the store on every call.
///
/// # Ranking Rule
///
/// - Transactions without a category share one [`UNCATEGORIZED`] bucket
/// - Buckets are sorted by summed amount, largest first
/// - Equal sums are sorted by category name, ascending
/// - At most [`TOP_CATEGORY_LIMIT`] buckets are returned
///
/// # Example
///
/// ```
/// use piggybank_shared::analysis::{rank_categories, CategoryTotal};
///
/// let ranked = rank_categories([
///     (Some("food"), 1000),
///     (Some("food"), 500),
///     (None, 2000),
/// ]);
///
/// assert_eq!(ranked, Ok(vec![
///     CategoryTotal { category: "uncategorized".to_string(), amount: 2000 },
///     CategoryTotal { category: "food".to_string(), amount: 1500 },
/// ]));
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::{StoreResult, TransactionStore};

/// Label used for transactions without a category
pub const UNCATEGORIZED: &str = "uncategorized";

/// Number of categories included in a report
pub const TOP_CATEGORY_LIMIT: usize = 5;

/// Summed spending for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: i64,
}

/// A sum left the `i64` range
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Spending total exceeds the supported range")]
pub struct AmountOverflow;

/// Sum and count over all of a user's transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingTotals {
    pub total_amount: i64,
    pub transaction_count: i64,
}

impl SpendingTotals {
    /// Adds one transaction's amount
    pub fn record(self, amount: i64) -> Result<Self, AmountOverflow> {
        Ok(Self {
            total_amount: self.total_amount.checked_add(amount).ok_or(AmountOverflow)?,
            transaction_count: self.transaction_count + 1,
        })
    }
}

/// Aggregated spending figures for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingSummary {
    /// Sum of all amounts (0 when there are no transactions)
    pub total_amount: i64,

    /// Number of transactions
    pub transaction_count: i64,

    /// Top categories, largest first
    pub top_categories: Vec<CategoryTotal>,
}

/// Groups `(category, amount)` pairs and returns the top categories
///
/// This is the reference implementation of the ranking rule; stores that
/// aggregate natively must produce the same result.
pub fn rank_categories<'a, I>(entries: I) -> Result<Vec<CategoryTotal>, AmountOverflow>
where
    I: IntoIterator<Item = (Option<&'a str>, i64)>,
{
    let mut sums: HashMap<&str, i64> = HashMap::new();
    for (category, amount) in entries {
        let sum = sums.entry(category.unwrap_or(UNCATEGORIZED)).or_default();
        *sum = sum.checked_add(amount).ok_or(AmountOverflow)?;
    }

    let mut ranked: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(TOP_CATEGORY_LIMIT);
    Ok(ranked)
}

/// Builds the spending summary for a user
///
/// Read-only. Store errors are returned to the caller unchanged.
pub async fn summarize(store: &dyn TransactionStore, user_id: i64) -> StoreResult<SpendingSummary> {
    let totals = store.totals(user_id).await?;
    let top_categories = store.top_categories(user_id).await?;

    tracing::debug!(
        user_id,
        total_amount = totals.total_amount,
        transaction_count = totals.transaction_count,
        categories = top_categories.len(),
        "Computed spending summary"
    );

    Ok(SpendingSummary {
        total_amount: totals.total_amount,
        transaction_count: totals.transaction_count,
        top_categories,
    })
}
