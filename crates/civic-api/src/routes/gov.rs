//! # Government Console API
//!
//! Every route here sits behind [`crate::auth::government_only`], applied
//! once as a layer over this router.
//!
//! Routes:
//! - POST /gov/approve/:id       REPORTED -> IN_PROGRESS, owner +10 coins
//! - POST /gov/reject/:id        REPORTED -> REJECTED, owner -5 coins
//! - POST /gov/complete/:id      IN_PROGRESS -> COMPLETED
//! - POST /gov/ban-user/:id      ban a citizen account
//! - POST /gov/unban-user/:id    lift a ban
//! - GET  /gov/flagged-issues    all flags with problem and users
//! - GET  /gov/flag-count/:id    number of flags on a problem
//! - GET  /gov/analytics         dashboard counts

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use civic_core::{ProblemId, UserId};

use crate::auth::{government_only, CallerIdentity};
use crate::engine::{analytics, ban, moderation, status};
use crate::error::AppError;
use crate::extractors::extract_id;
use crate::state::AppState;
use crate::store::{AnalyticsSnapshot, FlaggedIssueView, ProblemRecord, UserRecord};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlagCountResponse {
    pub flag_count: i64,
}

/// Build the government router, gated on the government role.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gov/approve/:id", post(approve_problem))
        .route("/gov/reject/:id", post(reject_problem))
        .route("/gov/complete/:id", post(complete_problem))
        .route("/gov/ban-user/:id", post(ban_user))
        .route("/gov/unban-user/:id", post(unban_user))
        .route("/gov/flagged-issues", get(flagged_issues))
        .route("/gov/flag-count/:id", get(flag_count))
        .route("/gov/analytics", get(dashboard))
        .route_layer(from_fn(government_only))
}

// -- Lifecycle ----------------------------------------------------------------

/// POST /gov/approve/:id — Approve a reported problem.
#[utoipa::path(
    post,
    path = "/gov/approve/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem in progress", body = ProblemRecord),
        (status = 403, description = "Caller is not a government account", body = crate::error::ErrorBody),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
        (status = 409, description = "Problem is not REPORTED", body = crate::error::ErrorBody),
    ),
    tag = "government"
)]
pub(crate) async fn approve_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProblemRecord>, AppError> {
    let id: ProblemId = extract_id(id)?;
    Ok(Json(status::approve(&state, &caller, id).await?))
}

/// POST /gov/reject/:id — Reject a reported problem.
#[utoipa::path(
    post,
    path = "/gov/reject/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem rejected", body = ProblemRecord),
        (status = 403, description = "Caller is not a government account", body = crate::error::ErrorBody),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
        (status = 409, description = "Problem is not REPORTED", body = crate::error::ErrorBody),
    ),
    tag = "government"
)]
pub(crate) async fn reject_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProblemRecord>, AppError> {
    let id: ProblemId = extract_id(id)?;
    Ok(Json(status::reject(&state, &caller, id).await?))
}

/// POST /gov/complete/:id — Mark an in-progress problem completed.
#[utoipa::path(
    post,
    path = "/gov/complete/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem completed", body = ProblemRecord),
        (status = 403, description = "Caller is not a government account", body = crate::error::ErrorBody),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
        (status = 409, description = "Problem is not IN_PROGRESS", body = crate::error::ErrorBody),
    ),
    tag = "government"
)]
pub(crate) async fn complete_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProblemRecord>, AppError> {
    let id: ProblemId = extract_id(id)?;
    Ok(Json(status::complete(&state, &caller, id).await?))
}

// -- Accounts -----------------------------------------------------------------

/// POST /gov/ban-user/:id — Ban a user.
#[utoipa::path(
    post,
    path = "/gov/ban-user/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User banned", body = UserRecord),
        (status = 403, description = "Caller is not a government account, or target is", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "government"
)]
pub(crate) async fn ban_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserRecord>, AppError> {
    let target: UserId = extract_id(id)?;
    Ok(Json(ban::ban(&state, &caller, target).await?))
}

/// POST /gov/unban-user/:id — Lift a ban.
#[utoipa::path(
    post,
    path = "/gov/unban-user/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User unbanned", body = UserRecord),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
    ),
    tag = "government"
)]
pub(crate) async fn unban_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserRecord>, AppError> {
    let target: UserId = extract_id(id)?;
    Ok(Json(ban::unban(&state, &caller, target).await?))
}

// -- Moderation & dashboard ---------------------------------------------------

/// GET /gov/flagged-issues — Every flag, newest first.
#[utoipa::path(
    get,
    path = "/gov/flagged-issues",
    responses(
        (status = 200, description = "Flags with problem and users", body = [FlaggedIssueView]),
    ),
    tag = "government"
)]
pub(crate) async fn flagged_issues(
    State(state): State<AppState>,
) -> Result<Json<Vec<FlaggedIssueView>>, AppError> {
    Ok(Json(moderation::flagged_issues(&state).await?))
}

/// GET /gov/flag-count/:id — Flags on one problem.
#[utoipa::path(
    get,
    path = "/gov/flag-count/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Flag count, 0 for unknown problems", body = FlagCountResponse),
    ),
    tag = "government"
)]
pub(crate) async fn flag_count(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<FlagCountResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    let flag_count = moderation::flag_count(&state, id).await?;
    Ok(Json(FlagCountResponse { flag_count }))
}

/// GET /gov/analytics — Dashboard counts.
#[utoipa::path(
    get,
    path = "/gov/analytics",
    responses(
        (status = 200, description = "User and problem counts", body = AnalyticsSnapshot),
    ),
    tag = "government"
)]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsSnapshot>, AppError> {
    Ok(Json(analytics::snapshot(&state).await?))
}
