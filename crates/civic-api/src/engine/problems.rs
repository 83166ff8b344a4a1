//! Problem submission, lookup, radius search, and owner deletion.
//!
//! Submission labels the problem through the injected classifier. A
//! classifier failure never fails the submission: the fallback category
//! and cluster are used instead. The owner's submission reward is
//! credited in the same store call that inserts the problem.

use serde::Deserialize;
use utoipa::ToSchema;

use civic_classifier::{classify_submission, cluster_or_fallback};
use civic_core::{GeoPoint, IssueCategory, Location, ProblemId, ValidationError};
use civic_state::reward::SUBMISSION_REWARD;

use super::observe;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::Validate;
use crate::state::{AppState, MAX_RADIUS_KM};
use crate::store::{NearbyProblem, NewProblem, ProblemRecord};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// A citizen's problem report, as submitted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDraft {
    pub title: String,
    pub description: String,
    /// Reference to the uploaded photo.
    pub image_url: String,
    #[schema(value_type = Object)]
    pub location: Location,
    /// Client-chosen category. Unknown labels become `OTHER`; when absent
    /// the classifier decides.
    #[serde(default)]
    pub category: Option<String>,
}

fn require_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(())
}

impl Validate for ProblemDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, "title", MAX_TITLE_LEN)?;
        require_text(&self.description, "description", MAX_DESCRIPTION_LEN)?;
        if self.image_url.trim().is_empty() {
            return Err(ValidationError::EmptyField("imageUrl"));
        }
        self.location.point()?;
        Ok(())
    }
}

/// Submit a new problem owned by the caller.
pub async fn submit(
    state: &AppState,
    caller: &CallerIdentity,
    draft: ProblemDraft,
) -> Result<ProblemRecord, AppError> {
    let result = async {
        draft.validate()?;
        let point = draft.location.point()?;
        let classifier = state.classifier.as_ref();

        let (category, cluster_id) = match draft.category.as_deref() {
            Some(label) if !label.trim().is_empty() => (
                IssueCategory::from_label(label),
                cluster_or_fallback(classifier, point).await,
            ),
            _ => {
                let labels = classify_submission(classifier, &draft.description, point).await;
                (labels.category, labels.cluster_id)
            }
        };

        let record = state
            .store
            .create_problem(
                NewProblem {
                    owner: caller.user_id,
                    title: draft.title.trim().to_string(),
                    description: draft.description.trim().to_string(),
                    category,
                    image_url: draft.image_url.trim().to_string(),
                    location: draft.location,
                    cluster_id,
                },
                SUBMISSION_REWARD,
            )
            .await?;
        tracing::info!(
            user_id = %caller.user_id,
            problem_id = %record.id,
            category = %record.category,
            cluster_id = record.cluster_id,
            "problem submitted"
        );
        Ok::<_, AppError>(record)
    }
    .await;
    observe(state, "submit", result)
}

/// Fetch one problem.
pub async fn get(state: &AppState, id: ProblemId) -> Result<ProblemRecord, AppError> {
    state
        .store
        .get_problem(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("problem {id} not found")))
}

/// Problems within `radius_km` (default from config) of the point,
/// nearest first.
pub async fn nearby(
    state: &AppState,
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
) -> Result<Vec<NearbyProblem>, AppError> {
    let center = GeoPoint::new(lat, lng)?;
    let radius = radius_km.unwrap_or(state.config.default_radius_km);
    if !radius.is_finite() || radius <= 0.0 || radius > MAX_RADIUS_KM {
        return Err(ValidationError::InvalidRadius {
            value: radius,
            max: MAX_RADIUS_KM,
        }
        .into());
    }
    let found = state.store.list_problems_near(center, radius).await?;
    tracing::debug!(lat, lng, radius, found = found.len(), "nearby query");
    Ok(found)
}

/// Delete a problem the caller owns, while it is still `REPORTED`.
pub async fn delete(
    state: &AppState,
    caller: &CallerIdentity,
    id: ProblemId,
) -> Result<(), AppError> {
    let result = state
        .store
        .delete_problem(id, caller.user_id)
        .await
        .map_err(AppError::from);
    if result.is_ok() {
        tracing::info!(user_id = %caller.user_id, problem_id = %id, "problem deleted");
    }
    observe(state, "delete", result)
}
