//! Coin amounts credited to or debited from the reporting user.
//!
//! Balances are signed and unclamped: a rejection can take a balance
//! below zero.

/// Credited to the owner when a problem is submitted.
pub const SUBMISSION_REWARD: i64 = 5;

/// Credited to the owner when a government official approves the problem.
pub const APPROVAL_REWARD: i64 = 10;

/// Debited from the owner when a government official rejects the problem.
pub const REJECTION_PENALTY: i64 = 5;
