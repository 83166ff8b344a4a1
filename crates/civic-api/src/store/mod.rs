//! # Issue Store
//!
//! Persistent records for users, problems, votes, ratings, and flags,
//! behind the [`IssueStore`] trait. Two implementations:
//!
//! - [`MemoryStore`]: every table behind one `parking_lot::Mutex`. Each
//!   trait method runs in a single critical section, which is the
//!   in-memory equivalent of a transaction.
//! - [`PgStore`]: Postgres via `sqlx`. Paired mutations (row plus cached
//!   counter, status plus coin balance) run in one transaction with the
//!   problem row locked.
//!
//! Both stores apply the same `civic-state` rules, so swapping one for
//! the other never changes observable behavior.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use civic_core::{FlagId, GeoPoint, IssueCategory, Location, ProblemId, RatingValue, UserId};
use civic_state::{
    BanError, DeletionError, ProblemStatus, StatusTransition, TransitionError, TransitionPolicy,
};

// -- Records ------------------------------------------------------------------

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[schema(value_type = i64)]
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Authorization marker for officials. Never changed through the API.
    pub is_government: bool,
    pub is_banned: bool,
    pub banned_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<i64>)]
    pub banned_by: Option<UserId>,
    /// Reward balance. May go negative.
    pub coins: i64,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// The public subset shown next to problems and flags.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[schema(value_type = i64)]
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A reported problem with its cached engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    #[schema(value_type = i64)]
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    #[schema(value_type = String, example = "ROAD")]
    pub category: IssueCategory,
    pub image_url: String,
    #[schema(value_type = Object)]
    pub location: Location,
    #[schema(value_type = String, example = "REPORTED")]
    pub status: ProblemStatus,
    /// Number of vote rows for this problem.
    pub vote_count: i64,
    /// Mean of the rating rows for this problem, 0 when unrated.
    pub rating: f64,
    pub cluster_id: i32,
    /// The reporting user.
    #[schema(value_type = i64)]
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A problem annotated with its distance from a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyProblem {
    #[serde(flatten)]
    pub problem: ProblemRecord,
    pub distance_km: f64,
    pub user_name: String,
}

/// One user's report of a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlagRecord {
    #[schema(value_type = i64)]
    pub id: FlagId,
    #[schema(value_type = i64)]
    pub user_id: UserId,
    #[schema(value_type = i64)]
    pub problem_id: ProblemId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A flagged problem together with its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlaggedProblem {
    #[serde(flatten)]
    pub problem: ProblemRecord,
    /// The user who reported the problem.
    pub user: UserSummary,
}

/// A flag joined with the flagged problem and the flagging user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlaggedIssueView {
    #[serde(flatten)]
    pub flag: FlagRecord,
    pub problem: FlaggedProblem,
    /// The user who raised the flag.
    pub user: UserSummary,
}

/// Result of a vote toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    /// Whether the caller's vote exists after the toggle.
    pub voted: bool,
    /// The problem's vote count after the toggle.
    pub vote_count: i64,
}

/// User counts for the analytics dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub banned_users: i64,
}

/// Problem counts for the analytics dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStats {
    pub total_problems: i64,
    pub reported_problems: i64,
    pub in_progress_problems: i64,
    pub completed_problems: i64,
    pub rejected_problems: i64,
    /// Number of flag rows, not distinct flagged problems.
    pub flagged_problems: i64,
}

/// Aggregate counts across the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub user_stats: UserStats,
    pub problem_stats: ProblemStats,
}

/// Input for [`IssueStore::insert_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub is_government: bool,
}

/// Input for [`IssueStore::create_problem`], already validated and labelled.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub image_url: String,
    pub location: Location,
    pub cluster_id: i32,
}

// -- Errors -------------------------------------------------------------------

/// Failures from an [`IssueStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("problem {0} not found")]
    ProblemNotFound(ProblemId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("user {user} has not flagged problem {problem}")]
    FlagNotFound { user: UserId, problem: ProblemId },

    #[error("user {user} has already flagged problem {problem}")]
    DuplicateFlag { user: UserId, problem: ProblemId },

    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Ban(#[from] BanError),

    #[error(transparent)]
    Deletion(#[from] DeletionError),

    /// The backing database rejected or failed an operation.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

// -- Trait --------------------------------------------------------------------

/// Persistent storage for the issue tracker.
///
/// Every method is one atomic unit: either all of its writes are visible
/// afterwards or none are.
#[async_trait]
pub trait IssueStore: Send + Sync {
    // -- Users --

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Ban `target`, recording who banned it and when. Government accounts
    /// are refused with [`BanError::ProtectedAccount`].
    async fn ban_user(
        &self,
        target: UserId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError>;

    /// Clear the ban fields of `target`.
    async fn unban_user(&self, target: UserId) -> Result<UserRecord, StoreError>;

    // -- Problems --

    /// Insert a problem in `REPORTED` and credit the owner `reward` coins.
    async fn create_problem(
        &self,
        problem: NewProblem,
        reward: i64,
    ) -> Result<ProblemRecord, StoreError>;

    async fn get_problem(&self, id: ProblemId) -> Result<Option<ProblemRecord>, StoreError>;

    /// Problems within `radius_km` of `center`, nearest first.
    async fn list_problems_near(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<NearbyProblem>, StoreError>;

    /// Remove a problem with its votes, ratings, and flags.
    async fn delete_problem(&self, id: ProblemId, requester: UserId) -> Result<(), StoreError>;

    // -- Votes --

    /// Insert or delete the (user, problem) vote and adjust the cached count.
    async fn toggle_vote(&self, user: UserId, problem: ProblemId)
        -> Result<VoteOutcome, StoreError>;

    async fn has_voted(&self, user: UserId, problem: ProblemId) -> Result<bool, StoreError>;

    // -- Ratings --

    /// Insert or overwrite the (user, problem) rating, recompute the cached
    /// average, and return it.
    async fn upsert_rating(
        &self,
        user: UserId,
        problem: ProblemId,
        value: RatingValue,
    ) -> Result<f64, StoreError>;

    /// Mean of the rating rows for `problem`, 0 when there are none.
    async fn average_rating(&self, problem: ProblemId) -> Result<f64, StoreError>;

    async fn user_rating(
        &self,
        user: UserId,
        problem: ProblemId,
    ) -> Result<Option<RatingValue>, StoreError>;

    // -- Flags --

    async fn insert_flag(
        &self,
        user: UserId,
        problem: ProblemId,
        reason: String,
    ) -> Result<FlagRecord, StoreError>;

    async fn delete_flag(&self, user: UserId, problem: ProblemId) -> Result<(), StoreError>;

    async fn flag_count(&self, problem: ProblemId) -> Result<i64, StoreError>;

    /// Every flag with its problem and users, newest first.
    async fn list_flags(&self) -> Result<Vec<FlaggedIssueView>, StoreError>;

    // -- Lifecycle --

    /// Move a problem to the transition's target and apply its coin delta
    /// to the owner, atomically.
    async fn apply_transition(
        &self,
        problem: ProblemId,
        transition: StatusTransition,
        policy: TransitionPolicy,
    ) -> Result<ProblemRecord, StoreError>;

    async fn analytics(&self) -> Result<AnalyticsSnapshot, StoreError>;
}
