//! Dashboard counts. A pure read.

use super::observe;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::AnalyticsSnapshot;

pub async fn snapshot(state: &AppState) -> Result<AnalyticsSnapshot, AppError> {
    let result = state.store.analytics().await.map_err(AppError::from);
    observe(state, "analytics", result)
}
