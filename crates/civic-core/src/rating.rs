//! # Rating Values
//!
//! A citizen's 1–5 rating of a problem. The range is enforced when the
//! value is built, so the stores only ever see valid ratings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A rating in the inclusive range 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct RatingValue(i16);

impl RatingValue {
    /// Lowest accepted rating.
    pub const MIN: i16 = 1;
    /// Highest accepted rating.
    pub const MAX: i16 = 5;

    /// Build a rating, rejecting anything outside 1..=5.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as i16))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    /// The rating as a small integer.
    pub fn get(self) -> i16 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for i16 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arithmetic mean of a set of ratings, or `0.0` when there are none.
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = RatingValue>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u32), |(sum, count), r| (sum + i64::from(r.get()), count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / f64::from(count)
    }
}
