/// Spending analysis endpoint
///
/// ```text
/// GET /api/v1/analysis/
/// ```
///
/// Answers 200 with totals, the top five categories and AI advice. When the
/// advice service fails the static fallback advice is returned together with
/// an `error` field; only storage failures produce an error status.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use piggybank_shared::{advice::AnalysisReport, auth::context::CurrentUser};

pub async fn get_analysis(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<AnalysisReport>> {
    let report = state
        .advisor
        .analyze(state.store.transactions(), user.id())
        .await?;

    tracing::info!(
        user_id = user.id(),
        transaction_count = report.transaction_count,
        fallback = report.error.is_some(),
        "Spending analysis served"
    );

    Ok(Json(report))
}
