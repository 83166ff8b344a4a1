//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the integer row identifiers used by the
//! issue store. Each identifier is a distinct type — you cannot pass a
//! [`UserId`] where a [`ProblemId`] is expected.
//!
//! All three serialize transparently as JSON integers, matching the
//! `BIGINT` primary keys of the relational schema.

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw row identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Access the underlying integer.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

row_id!(
    /// Identifier of a reported civic problem.
    ProblemId
);

row_id!(
    /// Identifier of a user account (citizen or government official).
    UserId
);

row_id!(
    /// Identifier of a single flag row.
    FlagId
);
