//! Postgres-backed [`IssueStore`]. Each method delegates to a function
//! in [`crate::db`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use civic_core::{GeoPoint, ProblemId, RatingValue, UserId};
use civic_state::{StatusTransition, TransitionPolicy};

use super::{
    AnalyticsSnapshot, FlagRecord, FlaggedIssueView, IssueStore, NearbyProblem, NewProblem,
    NewUser, ProblemRecord, StoreError, UserRecord, VoteOutcome,
};
use crate::db;

/// Issue store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IssueStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        db::users::insert(&self.pool, &user).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        db::users::get_by_id(&self.pool, id).await
    }

    async fn ban_user(
        &self,
        target: UserId,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError> {
        db::users::ban(&self.pool, target, by, at).await
    }

    async fn unban_user(&self, target: UserId) -> Result<UserRecord, StoreError> {
        db::users::unban(&self.pool, target).await
    }

    async fn create_problem(
        &self,
        problem: NewProblem,
        reward: i64,
    ) -> Result<ProblemRecord, StoreError> {
        db::problems::create(&self.pool, &problem, reward).await
    }

    async fn get_problem(&self, id: ProblemId) -> Result<Option<ProblemRecord>, StoreError> {
        db::problems::get_by_id(&self.pool, id).await
    }

    async fn list_problems_near(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<NearbyProblem>, StoreError> {
        db::problems::list_near(&self.pool, center, radius_km).await
    }

    async fn delete_problem(&self, id: ProblemId, requester: UserId) -> Result<(), StoreError> {
        db::problems::delete(&self.pool, id, requester).await
    }

    async fn toggle_vote(
        &self,
        user: UserId,
        problem: ProblemId,
    ) -> Result<VoteOutcome, StoreError> {
        db::engagement::toggle_vote(&self.pool, user, problem).await
    }

    async fn has_voted(&self, user: UserId, problem: ProblemId) -> Result<bool, StoreError> {
        db::engagement::has_voted(&self.pool, user, problem).await
    }

    async fn upsert_rating(
        &self,
        user: UserId,
        problem: ProblemId,
        value: RatingValue,
    ) -> Result<f64, StoreError> {
        db::engagement::upsert_rating(&self.pool, user, problem, value).await
    }

    async fn average_rating(&self, problem: ProblemId) -> Result<f64, StoreError> {
        db::engagement::average_rating(&self.pool, problem).await
    }

    async fn user_rating(
        &self,
        user: UserId,
        problem: ProblemId,
    ) -> Result<Option<RatingValue>, StoreError> {
        db::engagement::user_rating(&self.pool, user, problem).await
    }

    async fn insert_flag(
        &self,
        user: UserId,
        problem: ProblemId,
        reason: String,
    ) -> Result<FlagRecord, StoreError> {
        db::flags::insert(&self.pool, user, problem, &reason).await
    }

    async fn delete_flag(&self, user: UserId, problem: ProblemId) -> Result<(), StoreError> {
        db::flags::delete(&self.pool, user, problem).await
    }

    async fn flag_count(&self, problem: ProblemId) -> Result<i64, StoreError> {
        db::flags::count_for_problem(&self.pool, problem).await
    }

    async fn list_flags(&self) -> Result<Vec<FlaggedIssueView>, StoreError> {
        db::flags::list(&self.pool).await
    }

    async fn apply_transition(
        &self,
        problem: ProblemId,
        transition: StatusTransition,
        policy: TransitionPolicy,
    ) -> Result<ProblemRecord, StoreError> {
        db::problems::apply_transition(&self.pool, problem, transition, policy).await
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, StoreError> {
        db::analytics::snapshot(&self.pool).await
    }
}
