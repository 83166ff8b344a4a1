//! # civic-state — Lifecycle State Machines
//!
//! Pure, storage-agnostic rules that both issue stores apply inside their
//! transactions. Nothing here performs I/O; each function inspects the
//! current row state and either returns the next state or a typed error.
//!
//! ## State Machines
//!
//! - **Problem** (`problem.rs`): `REPORTED → IN_PROGRESS → COMPLETED` with a
//!   `REPORTED → REJECTED` branch. Transitions carry a coin delta for the
//!   reporting user (approve +10, reject −5, complete 0). A
//!   [`TransitionPolicy`] selects between predecessor-checked (`Strict`)
//!   and unconditional (`Permissive`) transitions.
//!
//! - **Account** (`account.rs`): ban/unban guard. Government accounts are
//!   protected from bans.
//!
//! ## Rewards
//!
//! Coin amounts live in [`reward`]. Balances are never clamped at zero.

pub mod account;
pub mod problem;
pub mod reward;

pub use account::{ensure_bannable, BanError};
pub use problem::{
    ensure_deletable, DeletionError, ProblemStatus, StatusTransition, TransitionError,
    TransitionPolicy, UnknownLabel,
};
