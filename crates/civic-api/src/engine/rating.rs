//! Ratings: one 1..=5 value per (user, problem), overwritten in place.
//! The problem's cached average is recomputed in the same transaction.

use civic_core::{ProblemId, RatingValue};

use super::observe;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Record the caller's rating and return the new average.
pub async fn submit_rating(
    state: &AppState,
    caller: &CallerIdentity,
    problem: ProblemId,
    value: i64,
) -> Result<f64, AppError> {
    let result = async {
        let value = RatingValue::new(value)?;
        let average = state
            .store
            .upsert_rating(caller.user_id, problem, value)
            .await?;
        tracing::info!(
            user_id = %caller.user_id,
            problem_id = %problem,
            rating = %value,
            average,
            "rating recorded"
        );
        Ok::<_, AppError>(average)
    }
    .await;
    observe(state, "rate", result)
}

/// Mean rating of `problem`, 0 when unrated or absent.
pub async fn average_rating(state: &AppState, problem: ProblemId) -> Result<f64, AppError> {
    Ok(state.store.average_rating(problem).await?)
}

/// The caller's own rating of `problem`, 0 when none.
pub async fn user_rating(
    state: &AppState,
    caller: &CallerIdentity,
    problem: ProblemId,
) -> Result<i16, AppError> {
    let rating = state.store.user_rating(caller.user_id, problem).await?;
    Ok(rating.map_or(0, RatingValue::get))
}
