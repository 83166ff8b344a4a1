//! # API Route Modules
//!
//! - `issues`: citizen surface under `/issue/*` (problems, votes,
//!   ratings, flags).
//! - `gov`: government console under `/gov/*`, gated on the government
//!   role as one route layer.
//! - `users`: the caller's own account.
//!
//! Handlers parse and delegate; the rules live in [`crate::engine`].

pub mod gov;
pub mod issues;
pub mod users;
