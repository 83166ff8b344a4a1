//! Government triage. Each transition moves a problem to its target
//! status and applies the owner's coin delta in one atomic store call.
//! Whether the current status is checked first depends on the configured
//! [`civic_state::TransitionPolicy`].

use civic_core::ProblemId;
use civic_state::StatusTransition;

use super::observe;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::ProblemRecord;

/// Apply `transition` to `problem`.
pub async fn apply(
    state: &AppState,
    official: &CallerIdentity,
    problem: ProblemId,
    transition: StatusTransition,
) -> Result<ProblemRecord, AppError> {
    let policy = state.config.transition_policy;
    let result = state
        .store
        .apply_transition(problem, transition, policy)
        .await
        .map_err(AppError::from);
    match &result {
        Ok(record) => tracing::info!(
            official_id = %official.user_id,
            problem_id = %problem,
            owner_id = %record.user_id,
            transition = %transition,
            status = %record.status,
            coin_delta = transition.coin_delta(),
            "problem transitioned"
        ),
        Err(e) => tracing::warn!(
            official_id = %official.user_id,
            problem_id = %problem,
            transition = %transition,
            error = %e,
            "problem transition refused"
        ),
    }
    observe(state, transition.as_str(), result)
}

/// `REPORTED -> IN_PROGRESS`, crediting the owner.
pub async fn approve(
    state: &AppState,
    official: &CallerIdentity,
    problem: ProblemId,
) -> Result<ProblemRecord, AppError> {
    apply(state, official, problem, StatusTransition::Approve).await
}

/// `REPORTED -> REJECTED`, debiting the owner.
pub async fn reject(
    state: &AppState,
    official: &CallerIdentity,
    problem: ProblemId,
) -> Result<ProblemRecord, AppError> {
    apply(state, official, problem, StatusTransition::Reject).await
}

/// `IN_PROGRESS -> COMPLETED`.
pub async fn complete(
    state: &AppState,
    official: &CallerIdentity,
    problem: ProblemId,
) -> Result<ProblemRecord, AppError> {
    apply(state, official, problem, StatusTransition::Complete).await
}
