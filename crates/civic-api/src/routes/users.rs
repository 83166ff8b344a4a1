//! GET /users/me — the caller's own account, including coin balance.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::UserRecord;

pub fn router() -> Router<AppState> {
    Router::new().route("/users/me", get(current_user))
}

/// GET /users/me — The authenticated caller.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Caller's account", body = UserRecord),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn current_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<UserRecord>, AppError> {
    let user = state
        .store
        .get_user(caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", caller.user_id)))?;
    Ok(Json(user))
}
