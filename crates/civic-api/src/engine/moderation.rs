//! Flags: one report per (user, problem). A second flag from the same
//! user is a conflict, never a silent overwrite.

use civic_core::{ProblemId, ValidationError};

use super::observe;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{FlagRecord, FlaggedIssueView};

/// Reason stored when the flagging user gives none.
pub const DEFAULT_FLAG_REASON: &str = "Inappropriate content";

/// Longest accepted flag reason, in characters.
pub const MAX_REASON_LEN: usize = 500;

/// Trim `reason`, substituting the default when it is absent or blank.
fn normalize_reason(reason: Option<String>) -> Result<String, ValidationError> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_FLAG_REASON.to_string());
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::FieldTooLong {
            field: "reason",
            max: MAX_REASON_LEN,
        });
    }
    Ok(reason)
}

/// Flag `problem` on behalf of the caller.
pub async fn flag(
    state: &AppState,
    caller: &CallerIdentity,
    problem: ProblemId,
    reason: Option<String>,
) -> Result<FlagRecord, AppError> {
    let result = async {
        let reason = normalize_reason(reason)?;
        let record = state
            .store
            .insert_flag(caller.user_id, problem, reason)
            .await?;
        tracing::info!(
            user_id = %caller.user_id,
            problem_id = %problem,
            flag_id = %record.id,
            "problem flagged"
        );
        Ok::<_, AppError>(record)
    }
    .await;
    observe(state, "flag", result)
}

/// Withdraw the caller's flag on `problem`.
pub async fn unflag(
    state: &AppState,
    caller: &CallerIdentity,
    problem: ProblemId,
) -> Result<(), AppError> {
    let result = state
        .store
        .delete_flag(caller.user_id, problem)
        .await
        .map_err(AppError::from);
    if result.is_ok() {
        tracing::info!(user_id = %caller.user_id, problem_id = %problem, "flag withdrawn");
    }
    observe(state, "unflag", result)
}

/// Number of flags on `problem`. Computed on demand.
pub async fn flag_count(state: &AppState, problem: ProblemId) -> Result<i64, AppError> {
    Ok(state.store.flag_count(problem).await?)
}

/// Every flag with its problem and both users, newest first.
pub async fn flagged_issues(state: &AppState) -> Result<Vec<FlaggedIssueView>, AppError> {
    Ok(state.store.list_flags().await?)
}
