//! Vote toggling. A vote is the presence of a (user, problem) row; the
//! problem's `vote_count` follows it inside the same store transaction.

use civic_core::ProblemId;

use super::observe;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::VoteOutcome;

/// Add the caller's vote if absent, remove it if present.
pub async fn toggle_vote(
    state: &AppState,
    caller: &CallerIdentity,
    problem: ProblemId,
) -> Result<VoteOutcome, AppError> {
    let result = state
        .store
        .toggle_vote(caller.user_id, problem)
        .await
        .map_err(AppError::from);
    if let Ok(outcome) = &result {
        tracing::info!(
            user_id = %caller.user_id,
            problem_id = %problem,
            voted = outcome.voted,
            vote_count = outcome.vote_count,
            "vote toggled"
        );
    }
    observe(state, "vote", result)
}

/// Whether the caller currently has a vote on `problem`. A missing
/// problem has no votes.
pub async fn has_voted(
    state: &AppState,
    caller: &CallerIdentity,
    problem: ProblemId,
) -> Result<bool, AppError> {
    Ok(state.store.has_voted(caller.user_id, problem).await?)
}
