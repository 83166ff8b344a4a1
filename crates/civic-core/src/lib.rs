#![deny(missing_docs)]

//! # civic-core — Foundational Types for the Civic Issue Stack
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde` and `thiserror`
//! from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** You cannot pass a [`UserId`]
//!    where a [`ProblemId`] is expected.
//!
//! 2. **Validated at construction.** [`RatingValue`] and [`GeoPoint`] reject
//!    out-of-range input when built, so downstream code never re-checks.
//!
//! 3. **Single [`IssueCategory`] enum.** One definition, exhaustive `match`
//!    everywhere, with a lenient parser that maps unknown labels to
//!    [`IssueCategory::Other`].
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`.

pub mod category;
pub mod error;
pub mod geo;
pub mod identity;
pub mod rating;

pub use category::IssueCategory;
pub use error::ValidationError;
pub use geo::{haversine_km, GeoPoint, Location, EARTH_RADIUS_KM};
pub use identity::{FlagId, ProblemId, UserId};
pub use rating::{average_rating, RatingValue};
