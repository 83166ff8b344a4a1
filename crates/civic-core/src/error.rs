//! # Error Hierarchy
//!
//! Validation errors for domain primitives, built with `thiserror`.
//! Each variant carries the offending input so operators and API clients
//! can see exactly what was rejected.

use thiserror::Error;

/// Validation errors raised when constructing domain primitives or
/// checking request fields.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Rating outside the inclusive 1..=5 range.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),

    /// Latitude outside [-90, 90] or not finite.
    #[error("invalid latitude {0} (expected -90..=90)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite.
    #[error("invalid longitude {0} (expected -180..=180)")]
    InvalidLongitude(f64),

    /// Search radius is not strictly positive or exceeds the maximum.
    #[error("invalid radius {value} km (expected > 0 and <= {max})")]
    InvalidRadius {
        /// The rejected radius.
        value: f64,
        /// The largest accepted radius.
        max: f64,
    },

    /// A required text field was empty after trimming.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field exceeded its length limit.
    #[error("{field} must not exceed {max} characters")]
    FieldTooLong {
        /// Name of the field.
        field: &'static str,
        /// Maximum accepted length.
        max: usize,
    },
}
