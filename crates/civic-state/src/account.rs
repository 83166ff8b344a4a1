//! # Account Ban Guard
//!
//! Government officials may ban citizens but never each other. Unbanning
//! has no guard.

use thiserror::Error;

use civic_core::UserId;

/// Refusals from [`ensure_bannable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BanError {
    /// Government accounts cannot be banned.
    #[error("user {0} is a government account and cannot be banned")]
    ProtectedAccount(UserId),
}

/// Check that the account `target` may be banned.
pub fn ensure_bannable(target: UserId, is_government: bool) -> Result<(), BanError> {
    if is_government {
        return Err(BanError::ProtectedAccount(target));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citizen_is_bannable() {
        assert_eq!(ensure_bannable(UserId::new(3), false), Ok(()));
    }

    #[test]
    fn government_is_protected() {
        let err = ensure_bannable(UserId::new(3), true).unwrap_err();
        assert_eq!(err, BanError::ProtectedAccount(UserId::new(3)));
        assert!(err.to_string().contains("government account"));
    }
}
