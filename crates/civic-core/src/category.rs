//! # Issue Category — Single Source of Truth
//!
//! The enumerated label attached to every problem. Labels arrive from two
//! places: the reporting citizen and the external text classifier. Both
//! are free text, so parsing is lenient — case-insensitive, and any label
//! that is not recognised becomes [`IssueCategory::Other`] instead of
//! failing the submission.

use serde::{Deserialize, Serialize};

/// Category of a civic problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    /// Potholes, damaged roads, broken pavements.
    Road,
    /// Street lights out or damaged.
    Lighting,
    /// Water supply, leaks, contamination.
    Water,
    /// Garbage collection and public cleanliness.
    Sanitation,
    /// Power outages, exposed wiring.
    Electricity,
    /// Blocked drains, flooding.
    Drainage,
    /// Anything the other labels do not cover.
    Other,
}

impl IssueCategory {
    /// Every category in canonical order.
    pub fn all() -> &'static [IssueCategory] {
        &[
            Self::Road,
            Self::Lighting,
            Self::Water,
            Self::Sanitation,
            Self::Electricity,
            Self::Drainage,
            Self::Other,
        ]
    }

    /// The SCREAMING_SNAKE_CASE label, identical to the serde form and the
    /// value stored in the `category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Road => "ROAD",
            Self::Lighting => "LIGHTING",
            Self::Water => "WATER",
            Self::Sanitation => "SANITATION",
            Self::Electricity => "ELECTRICITY",
            Self::Drainage => "DRAINAGE",
            Self::Other => "OTHER",
        }
    }

    /// Parse a label leniently. Unknown or empty labels map to
    /// [`IssueCategory::Other`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "ROAD" | "ROADS" | "POTHOLE" | "POTHOLES" => Self::Road,
            "LIGHTING" | "STREETLIGHT" | "STREET_LIGHT" => Self::Lighting,
            "WATER" | "WATER_SUPPLY" => Self::Water,
            "SANITATION" | "GARBAGE" | "WASTE" => Self::Sanitation,
            "ELECTRICITY" | "POWER" => Self::Electricity,
            "DRAINAGE" | "SEWAGE" | "FLOODING" => Self::Drainage,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
