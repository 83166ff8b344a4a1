//! # Authentication & Authorization Middleware
//!
//! ## Token Format
//!
//! ```text
//! Bearer {user_id}:{secret}
//! ```
//!
//! The secret is compared in constant time against `AUTH_TOKEN`. When no
//! token is configured (development mode) the secret is not checked and
//! may be omitted, but the user id is still required.
//!
//! ## CallerIdentity
//!
//! [`auth_middleware`] resolves the user row from the issue store and
//! injects a [`CallerIdentity`] into the request extensions. Handlers
//! extract it via the `FromRequestParts` impl. Banned users are refused
//! on every authenticated route.
//!
//! [`government_only`] is layered over the whole `/gov` router so the
//! role check lives in exactly one place.

use axum::extract::{Request, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use civic_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated caller, as resolved from the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub is_government: bool,
    pub is_banned: bool,
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets. On a length mismatch a
/// dummy comparison still runs.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse `{user_id}:{secret}` and check the secret against `expected`.
///
/// With `expected = None` the secret part is optional and ignored.
pub fn parse_bearer_token(provided: &str, expected: Option<&str>) -> Result<UserId, String> {
    let (id_part, secret) = match provided.split_once(':') {
        Some((id, secret)) => (id, Some(secret)),
        None => (provided, None),
    };

    if let Some(expected) = expected {
        match secret {
            Some(secret) if constant_time_token_eq(secret, expected) => {}
            Some(_) => return Err("invalid bearer token".into()),
            None => {
                return Err("invalid token format, expected {user_id}:{secret}".into());
            }
        }
    }

    id_part
        .parse::<UserId>()
        .map_err(|e| format!("invalid user id in bearer token: {e}"))
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Authenticate the bearer token and inject the caller's identity.
///
/// Missing header, malformed token, wrong secret, or an unknown user is
/// 401. A banned user is 403.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let provided = match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return AppError::Unauthorized(
                    "authorization header must use Bearer scheme".into(),
                )
                .into_response();
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            return AppError::Unauthorized("missing authorization header".into()).into_response();
        }
    };

    let user_id = match parse_bearer_token(provided, state.config.auth_token.as_deref()) {
        Ok(id) => id,
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
            return AppError::Unauthorized(msg).into_response();
        }
    };

    let user = match state.store.get_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(%user_id, "authentication failed: unknown user");
            return AppError::Unauthorized(format!("unknown user {user_id}")).into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    if user.is_banned {
        tracing::info!(%user_id, "request from banned user refused");
        return AppError::Forbidden(format!("user {user_id} is banned")).into_response();
    }

    request.extensions_mut().insert(CallerIdentity {
        user_id: user.id,
        is_government: user.is_government,
        is_banned: user.is_banned,
    });
    next.run(request).await
}

/// Refuse callers that are not government officials.
///
/// Runs inside [`auth_middleware`], so the identity is always present on
/// an authenticated route.
pub async fn government_only(request: Request, next: Next) -> Response {
    match request.extensions().get::<CallerIdentity>() {
        Some(caller) if caller.is_government => next.run(request).await,
        Some(caller) => {
            tracing::warn!(user_id = %caller.user_id, path = %request.uri().path(), "government route refused");
            AppError::Forbidden("government account required".into()).into_response()
        }
        None => AppError::Unauthorized("no caller identity in request context".into())
            .into_response(),
    }
}
