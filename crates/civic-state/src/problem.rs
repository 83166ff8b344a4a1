//! # Problem Lifecycle State Machine
//!
//! ```text
//! Reported ──approve──▶ InProgress ──complete──▶ Completed (terminal)
//!    │
//!    └──reject──▶ Rejected (terminal)
//! ```
//!
//! Every transition is government-only and carries a coin delta for the
//! user who reported the problem. Under [`TransitionPolicy::Strict`] the
//! current status must be the transition's single legal predecessor.
//! [`TransitionPolicy::Permissive`] applies the target unconditionally,
//! which lets an official, for example, complete a rejected problem.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use civic_core::UserId;

use crate::reward::{APPROVAL_REWARD, REJECTION_PENALTY};

// ─── Problem Status ──────────────────────────────────────────────────

/// Lifecycle status of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemStatus {
    /// Submitted by a citizen, awaiting triage.
    Reported,
    /// Accepted by an official, work underway.
    InProgress,
    /// Fixed (terminal).
    Completed,
    /// Dismissed by an official (terminal).
    Rejected,
}

impl ProblemStatus {
    /// Every status in lifecycle order.
    pub fn all() -> &'static [ProblemStatus] {
        &[
            Self::Reported,
            Self::InProgress,
            Self::Completed,
            Self::Rejected,
        ]
    }

    /// Label used on the wire and in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "REPORTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether no further transition is legal under the strict policy.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl std::fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status or policy label that does not name a known value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownLabel {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl FromStr for ProblemStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "problem status",
                value: s.to_string(),
            })
    }
}

// ─── Transitions ─────────────────────────────────────────────────────

/// A government action on a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTransition {
    /// REPORTED → IN_PROGRESS, owner +10 coins.
    Approve,
    /// REPORTED → REJECTED, owner −5 coins.
    Reject,
    /// IN_PROGRESS → COMPLETED, no coin change.
    Complete,
}

impl StatusTransition {
    /// Status the problem ends in.
    pub fn target(&self) -> ProblemStatus {
        match self {
            Self::Approve => ProblemStatus::InProgress,
            Self::Reject => ProblemStatus::Rejected,
            Self::Complete => ProblemStatus::Completed,
        }
    }

    /// The only status this transition may start from under the strict policy.
    pub fn predecessor(&self) -> ProblemStatus {
        match self {
            Self::Approve | Self::Reject => ProblemStatus::Reported,
            Self::Complete => ProblemStatus::InProgress,
        }
    }

    /// Signed change to the owner's coin balance.
    pub fn coin_delta(&self) -> i64 {
        match self {
            Self::Approve => APPROVAL_REWARD,
            Self::Reject => -REJECTION_PENALTY,
            Self::Complete => 0,
        }
    }

    /// Verb used in routes, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Complete => "complete",
        }
    }

    /// Resolve the next status from `from`, or explain why the transition
    /// is refused.
    pub fn apply(
        &self,
        from: ProblemStatus,
        policy: TransitionPolicy,
    ) -> Result<ProblemStatus, TransitionError> {
        if policy == TransitionPolicy::Strict {
            self.require_predecessor(from)?;
        }
        Ok(self.target())
    }

    fn require_predecessor(&self, from: ProblemStatus) -> Result<(), TransitionError> {
        if from.is_terminal() {
            return Err(TransitionError::TerminalState {
                state: from,
                attempted: self.target(),
            });
        }
        if from != self.predecessor() {
            return Err(TransitionError::InvalidTransition {
                from,
                to: self.target(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for StatusTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether transitions check the current status before applying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Only legal predecessors may transition.
    #[default]
    Strict,
    /// Any status may move to any transition's target.
    Permissive,
}

impl FromStr for TransitionPolicy {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            _ => Err(UnknownLabel {
                kind: "transition policy",
                value: s.to_string(),
            }),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Refusals from [`StatusTransition::apply`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The current status is not the transition's predecessor.
    #[error("invalid problem transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: ProblemStatus,
        /// Attempted target.
        to: ProblemStatus,
    },

    /// The problem is already closed.
    #[error("problem is in terminal state {state}, cannot move to {attempted}")]
    TerminalState {
        /// The terminal status.
        state: ProblemStatus,
        /// Attempted target.
        attempted: ProblemStatus,
    },
}

// ─── Deletion Guard ──────────────────────────────────────────────────

/// Refusals from [`ensure_deletable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeletionError {
    /// Only the reporting user may delete a problem.
    #[error("user {requester} does not own this problem")]
    NotOwner {
        /// Who asked for the deletion.
        requester: UserId,
    },

    /// Problems are deletable only before triage.
    #[error("problem in status {status} can no longer be deleted")]
    NotReported {
        /// Current status.
        status: ProblemStatus,
    },
}

/// Check that `requester` may delete a problem owned by `owner` that is
/// currently in `status`.
pub fn ensure_deletable(
    status: ProblemStatus,
    owner: UserId,
    requester: UserId,
) -> Result<(), DeletionError> {
    if owner != requester {
        return Err(DeletionError::NotOwner { requester });
    }
    if status != ProblemStatus::Reported {
        return Err(DeletionError::NotReported { status });
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────
