//! # Citizen Issue API
//!
//! Routes:
//! - POST   /issue/problems          submit a problem (201)
//! - GET    /issue/problems/:id      fetch a problem
//! - DELETE /issue/problems/:id      owner deletes a problem still in REPORTED
//! - GET    /issue/nearby            problems within a radius, nearest first
//! - POST   /issue/vote/:id          toggle the caller's vote
//! - GET    /issue/vote/:id          whether the caller has voted
//! - POST   /issue/rating/:id        rate 1..=5, returns the new average
//! - GET    /issue/rating/:id        average rating
//! - GET    /issue/user-rating/:id   the caller's own rating, 0 if none
//! - POST   /issue/flag/:id          flag, optional `{reason}`
//! - DELETE /issue/unflag/:id        withdraw the caller's flag

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use civic_core::ProblemId;

use crate::auth::CallerIdentity;
use crate::engine::problems::ProblemDraft;
use crate::engine::{moderation, problems, rating, voting};
use crate::error::AppError;
use crate::extractors::{
    extract_id, extract_json, extract_optional_json, extract_query, extract_validated_json,
};
use crate::state::AppState;
use crate::store::{FlagRecord, NearbyProblem, ProblemRecord, VoteOutcome};

// -- Request / response bodies ------------------------------------------------

/// Body of `POST /issue/rating/:id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RatingRequest {
    /// Integer from 1 to 5.
    pub rating: i64,
}

/// Body of `POST /issue/flag/:id`. May be omitted entirely.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FlagRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VotedResponse {
    pub voted: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageRatingResponse {
    pub average_rating: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRatingResponse {
    pub user_rating: i16,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Query of `GET /issue/nearby`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    /// Latitude of the centre, degrees.
    pub latitude: f64,
    /// Longitude of the centre, degrees.
    pub longitude: f64,
    /// Search radius in km. Defaults to the configured radius.
    pub radius: Option<f64>,
}

// -- Router -------------------------------------------------------------------

/// Build the citizen issue router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/issue/problems", post(submit_problem))
        .route(
            "/issue/problems/:id",
            get(get_problem).delete(delete_problem),
        )
        .route("/issue/nearby", get(nearby_problems))
        .route("/issue/vote/:id", post(toggle_vote).get(has_voted))
        .route("/issue/rating/:id", post(submit_rating).get(average_rating))
        .route("/issue/user-rating/:id", get(user_rating))
        .route("/issue/flag/:id", post(flag_problem))
        .route("/issue/unflag/:id", delete(unflag_problem))
}

// -- Problems -----------------------------------------------------------------

/// POST /issue/problems — Submit a problem.
#[utoipa::path(
    post,
    path = "/issue/problems",
    request_body = ProblemDraft,
    responses(
        (status = 201, description = "Problem created", body = ProblemRecord),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorBody),
    ),
    tag = "problems"
)]
pub(crate) async fn submit_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<ProblemDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ProblemRecord>), AppError> {
    let draft = extract_validated_json(body)?;
    let record = problems::submit(&state, &caller, draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /issue/problems/:id — Fetch a problem.
#[utoipa::path(
    get,
    path = "/issue/problems/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem found", body = ProblemRecord),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
    ),
    tag = "problems"
)]
pub(crate) async fn get_problem(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProblemRecord>, AppError> {
    let id: ProblemId = extract_id(id)?;
    Ok(Json(problems::get(&state, id).await?))
}

/// DELETE /issue/problems/:id — Owner deletes a problem.
#[utoipa::path(
    delete,
    path = "/issue/problems/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem deleted", body = MessageResponse),
        (status = 403, description = "Caller is not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
        (status = 409, description = "Problem is no longer REPORTED", body = crate::error::ErrorBody),
    ),
    tag = "problems"
)]
pub(crate) async fn delete_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    problems::delete(&state, &caller, id).await?;
    Ok(Json(MessageResponse {
        message: format!("problem {id} deleted"),
    }))
}

/// GET /issue/nearby — Problems near a point.
#[utoipa::path(
    get,
    path = "/issue/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Problems within the radius, nearest first", body = [NearbyProblem]),
        (status = 400, description = "Invalid coordinates or radius", body = crate::error::ErrorBody),
    ),
    tag = "problems"
)]
pub(crate) async fn nearby_problems(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<Vec<NearbyProblem>>, AppError> {
    let q = extract_query(query)?;
    let found = problems::nearby(&state, q.latitude, q.longitude, q.radius).await?;
    Ok(Json(found))
}

// -- Votes --------------------------------------------------------------------

/// POST /issue/vote/:id — Toggle the caller's vote.
#[utoipa::path(
    post,
    path = "/issue/vote/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Vote toggled", body = VoteOutcome),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
    ),
    tag = "votes"
)]
pub(crate) async fn toggle_vote(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<VoteOutcome>, AppError> {
    let id: ProblemId = extract_id(id)?;
    Ok(Json(voting::toggle_vote(&state, &caller, id).await?))
}

/// GET /issue/vote/:id — Whether the caller has voted.
#[utoipa::path(
    get,
    path = "/issue/vote/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Vote state", body = VotedResponse),
        (status = 400, description = "Malformed problem id", body = crate::error::ErrorBody),
    ),
    tag = "votes"
)]
pub(crate) async fn has_voted(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<VotedResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    let voted = voting::has_voted(&state, &caller, id).await?;
    Ok(Json(VotedResponse { voted }))
}

// -- Ratings ------------------------------------------------------------------

/// POST /issue/rating/:id — Rate a problem.
#[utoipa::path(
    post,
    path = "/issue/rating/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rating stored", body = AverageRatingResponse),
        (status = 400, description = "Rating out of range", body = crate::error::ErrorBody),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
    ),
    tag = "ratings"
)]
pub(crate) async fn submit_rating(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<AverageRatingResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    let req = extract_json(body)?;
    let average_rating = rating::submit_rating(&state, &caller, id, req.rating).await?;
    Ok(Json(AverageRatingResponse { average_rating }))
}

/// GET /issue/rating/:id — Average rating.
#[utoipa::path(
    get,
    path = "/issue/rating/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Average rating, 0 when unrated", body = AverageRatingResponse),
    ),
    tag = "ratings"
)]
pub(crate) async fn average_rating(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AverageRatingResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    let average_rating = rating::average_rating(&state, id).await?;
    Ok(Json(AverageRatingResponse { average_rating }))
}

/// GET /issue/user-rating/:id — The caller's own rating.
#[utoipa::path(
    get,
    path = "/issue/user-rating/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Caller's rating, 0 when none", body = UserRatingResponse),
    ),
    tag = "ratings"
)]
pub(crate) async fn user_rating(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserRatingResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    let user_rating = rating::user_rating(&state, &caller, id).await?;
    Ok(Json(UserRatingResponse { user_rating }))
}

// -- Flags --------------------------------------------------------------------

/// POST /issue/flag/:id — Flag a problem.
#[utoipa::path(
    post,
    path = "/issue/flag/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    request_body(content = FlagRequest, description = "Optional reason"),
    responses(
        (status = 201, description = "Flag recorded", body = FlagRecord),
        (status = 400, description = "Body is not a valid flag request", body = crate::error::ErrorBody),
        (status = 404, description = "Problem not found", body = crate::error::ErrorBody),
        (status = 409, description = "Caller already flagged this problem", body = crate::error::ErrorBody),
    ),
    tag = "flags"
)]
pub(crate) async fn flag_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<FlagRecord>), AppError> {
    let id: ProblemId = extract_id(id)?;
    let req: FlagRequest = extract_optional_json(body)?;
    let record = moderation::flag(&state, &caller, id, req.reason).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /issue/unflag/:id — Withdraw the caller's flag.
#[utoipa::path(
    delete,
    path = "/issue/unflag/{id}",
    params(("id" = i64, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Flag withdrawn", body = MessageResponse),
        (status = 404, description = "No flag by the caller", body = crate::error::ErrorBody),
    ),
    tag = "flags"
)]
pub(crate) async fn unflag_problem(
    State(state): State<AppState>,
    caller: CallerIdentity,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id: ProblemId = extract_id(id)?;
    moderation::unflag(&state, &caller, id).await?;
    Ok(Json(MessageResponse {
        message: format!("flag on problem {id} withdrawn"),
    }))
}
