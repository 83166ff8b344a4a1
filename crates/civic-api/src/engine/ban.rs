//! Account bans. Government accounts cannot be banned; unbanning is
//! always allowed. A ban leaves the user's problems, votes, ratings,
//! and flags in place.

use chrono::Utc;

use civic_core::UserId;

use super::observe;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::UserRecord;

/// Ban `target`, recording the acting official and the time.
pub async fn ban(
    state: &AppState,
    official: &CallerIdentity,
    target: UserId,
) -> Result<UserRecord, AppError> {
    let result = state
        .store
        .ban_user(target, official.user_id, Utc::now())
        .await
        .map_err(AppError::from);
    match &result {
        Ok(_) => tracing::info!(official_id = %official.user_id, target_id = %target, "user banned"),
        Err(e) => tracing::warn!(
            official_id = %official.user_id,
            target_id = %target,
            error = %e,
            "ban refused"
        ),
    }
    observe(state, "ban", result)
}

/// Clear the ban fields of `target`.
pub async fn unban(
    state: &AppState,
    official: &CallerIdentity,
    target: UserId,
) -> Result<UserRecord, AppError> {
    let result = state.store.unban_user(target).await.map_err(AppError::from);
    if result.is_ok() {
        tracing::info!(official_id = %official.user_id, target_id = %target, "user unbanned");
    }
    observe(state, "unban", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{self, caller};

    #[tokio::test]
    async fn ban_records_audit_fields_and_unban_clears_them() {
        let state = AppState::new();
        let gov = caller(&test_support::user(&state, "Gov", true).await);
        let citizen = test_support::user(&state, "Citizen", false).await;

        let banned = ban(&state, &gov, citizen.id).await.unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.banned_by, Some(gov.user_id));
        assert!(banned.banned_at.is_some());

        let cleared = unban(&state, &gov, citizen.id).await.unwrap();
        assert!(!cleared.is_banned);
        assert!(cleared.banned_by.is_none());
        assert!(cleared.banned_at.is_none());
    }

    #[tokio::test]
    async fn government_account_is_protected() {
        let state = AppState::new();
        let gov = caller(&test_support::user(&state, "Gov", true).await);
        let other = test_support::user(&state, "Other", true).await;

        let err = ban(&state, &gov, other.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let stored = state.store.get_user(other.id).await.unwrap().unwrap();
        assert!(!stored.is_banned);
        assert_eq!(state.metrics.engine_operations("ban", "denied"), 1);
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let state = AppState::new();
        let gov = caller(&test_support::user(&state, "Gov", true).await);
        assert!(matches!(
            ban(&state, &gov, UserId::new(404)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            unban(&state, &gov, UserId::new(404)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
