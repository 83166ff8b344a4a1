//! # civic-classifier — Issue Classification Capability
//!
//! Problem submissions are labelled by an external service: a text model
//! suggests an [`IssueCategory`] from the description and a clustering
//! model assigns a district id from the coordinates. The service is an
//! injected capability behind [`IssueClassifier`] so the API can run
//! against the real service ([`HttpClassifier`]), a fixed answer
//! ([`StaticClassifier`]), or a test double.
//!
//! ## Fallback Policy
//!
//! A classifier failure never fails a submission. [`classify_submission`]
//! substitutes [`FALLBACK_CATEGORY`] and [`FALLBACK_CLUSTER_ID`] and logs
//! the error at `warn`.

pub mod config;
pub mod error;
pub mod http;

pub use config::{ClassifierConfig, ConfigError};
pub use error::ClassifierError;
pub use http::HttpClassifier;

use async_trait::async_trait;
use civic_core::{GeoPoint, IssueCategory};

/// Category used when text classification fails.
pub const FALLBACK_CATEGORY: IssueCategory = IssueCategory::Other;

/// Cluster id used when cluster prediction fails.
pub const FALLBACK_CLUSTER_ID: i32 = 1;

/// Labels a submission from its text and location.
#[async_trait]
pub trait IssueClassifier: Send + Sync {
    /// Suggest a category for a problem description.
    async fn classify_text(&self, text: &str) -> Result<IssueCategory, ClassifierError>;

    /// Predict the district cluster containing `point`.
    async fn cluster_for(&self, point: GeoPoint) -> Result<i32, ClassifierError>;
}

/// Always answers with the same labels. Used when no service is configured.
#[derive(Debug, Clone, Copy)]
pub struct StaticClassifier {
    /// Category returned for every text.
    pub category: IssueCategory,
    /// Cluster returned for every point.
    pub cluster_id: i32,
}

impl Default for StaticClassifier {
    fn default() -> Self {
        Self {
            category: FALLBACK_CATEGORY,
            cluster_id: FALLBACK_CLUSTER_ID,
        }
    }
}

#[async_trait]
impl IssueClassifier for StaticClassifier {
    async fn classify_text(&self, _text: &str) -> Result<IssueCategory, ClassifierError> {
        Ok(self.category)
    }

    async fn cluster_for(&self, _point: GeoPoint) -> Result<i32, ClassifierError> {
        Ok(self.cluster_id)
    }
}

/// Labels assigned to a new problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Category stored on the problem.
    pub category: IssueCategory,
    /// District cluster stored on the problem.
    pub cluster_id: i32,
}

/// Category for `text`, or [`FALLBACK_CATEGORY`] if the classifier fails.
pub async fn category_or_fallback(classifier: &dyn IssueClassifier, text: &str) -> IssueCategory {
    match classifier.classify_text(text).await {
        Ok(category) => category,
        Err(e) => {
            tracing::warn!(error = %e, "text classification failed, using fallback category");
            FALLBACK_CATEGORY
        }
    }
}

/// Cluster for `point`, or [`FALLBACK_CLUSTER_ID`] if the classifier fails.
pub async fn cluster_or_fallback(classifier: &dyn IssueClassifier, point: GeoPoint) -> i32 {
    match classifier.cluster_for(point).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "cluster prediction failed, using fallback cluster");
            FALLBACK_CLUSTER_ID
        }
    }
}

/// Classify a submission, applying the fallback policy to each label.
pub async fn classify_submission(
    classifier: &dyn IssueClassifier,
    text: &str,
    point: GeoPoint,
) -> Classification {
    Classification {
        category: category_or_fallback(classifier, text).await,
        cluster_id: cluster_or_fallback(classifier, point).await,
    }
}
