//! # OpenAPI Specification Assembly
//!
//! Collects every utoipa-documented handler into one spec, served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "`Authorization: Bearer {userId}:{secret}`. The secret is AUTH_TOKEN; \
                             it may be omitted when AUTH_TOKEN is unset.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Civic Issue Reporting API",
        version = "0.1.0",
        description = "Citizens report local problems, vote, rate, and flag them. \
                       Government accounts triage problems, moderate flags, and ban abusive accounts.\n\n\
                       All `/issue/*`, `/gov/*`, and `/users/*` routes require a bearer token. \
                       Health checks and `/metrics` are unauthenticated.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Problems ─────────────────────────────────────────────────────
        crate::routes::issues::submit_problem,
        crate::routes::issues::get_problem,
        crate::routes::issues::delete_problem,
        crate::routes::issues::nearby_problems,
        // ── Votes & ratings ──────────────────────────────────────────────
        crate::routes::issues::toggle_vote,
        crate::routes::issues::has_voted,
        crate::routes::issues::submit_rating,
        crate::routes::issues::average_rating,
        crate::routes::issues::user_rating,
        // ── Flags ────────────────────────────────────────────────────────
        crate::routes::issues::flag_problem,
        crate::routes::issues::unflag_problem,
        // ── Government console ───────────────────────────────────────────
        crate::routes::gov::approve_problem,
        crate::routes::gov::reject_problem,
        crate::routes::gov::complete_problem,
        crate::routes::gov::ban_user,
        crate::routes::gov::unban_user,
        crate::routes::gov::flagged_issues,
        crate::routes::gov::flag_count,
        crate::routes::gov::dashboard,
        // ── Users ────────────────────────────────────────────────────────
        crate::routes::users::current_user,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::store::UserRecord,
            crate::store::UserSummary,
            crate::store::ProblemRecord,
            crate::store::NearbyProblem,
            crate::store::FlagRecord,
            crate::store::FlaggedProblem,
            crate::store::FlaggedIssueView,
            crate::store::VoteOutcome,
            crate::store::UserStats,
            crate::store::ProblemStats,
            crate::store::AnalyticsSnapshot,
            crate::engine::problems::ProblemDraft,
            crate::routes::issues::RatingRequest,
            crate::routes::issues::FlagRequest,
            crate::routes::issues::VotedResponse,
            crate::routes::issues::AverageRatingResponse,
            crate::routes::issues::UserRatingResponse,
            crate::routes::issues::MessageResponse,
            crate::routes::gov::FlagCountResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "problems", description = "Problem submission, lookup, nearby search, and deletion"),
        (name = "votes", description = "One toggleable vote per user and problem"),
        (name = "ratings", description = "1 to 5 star ratings, one per user and problem"),
        (name = "flags", description = "Citizen reports of inappropriate problems"),
        (name = "government", description = "Triage, moderation, bans, and analytics for government accounts"),
        (name = "users", description = "The caller's own account"),
    )
)]
pub struct ApiDoc;

/// Serves the spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
