//! # Engines
//!
//! One module per group of operations. Every operation is a free async
//! function over [`AppState`] that validates its input, runs exactly one
//! atomic store call, logs the result with structured fields, and counts
//! its outcome in `civic_engine_operations_total`.
//!
//! | Module        | Operations                                         |
//! |---------------|----------------------------------------------------|
//! | [`voting`]    | toggle vote, has-voted                             |
//! | [`rating`]    | submit rating, average, caller's own rating        |
//! | [`moderation`]| flag, unflag, flag count, flagged-issue listing    |
//! | [`status`]    | approve, reject, complete                          |
//! | [`ban`]       | ban, unban                                         |
//! | [`problems`]  | submit, get, nearby listing, delete                |
//! | [`analytics`] | dashboard counts                                   |

pub mod analytics;
pub mod ban;
pub mod moderation;
pub mod problems;
pub mod rating;
pub mod status;
pub mod voting;

use crate::error::AppError;
use crate::state::AppState;

/// Count the outcome of `operation` and pass the result through.
pub(crate) fn observe<T>(
    state: &AppState,
    operation: &'static str,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    state.metrics.record_operation(operation, outcome);
    if let Err(e) = &result {
        tracing::debug!(operation, outcome, error = %e, "engine operation refused");
    }
    result
}
