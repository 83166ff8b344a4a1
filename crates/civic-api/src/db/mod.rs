//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx, used when `DATABASE_URL` is set. When
//! absent the API runs on the in-memory store (development and tests).
//!
//! Every function takes a `&PgPool`. Paired mutations open a transaction,
//! lock the problem row with `SELECT ... FOR UPDATE`, and express counter
//! changes as relative deltas (`vote_count = vote_count + $1`) so that
//! concurrent requests never lose an update.

pub mod analytics;
pub mod engagement;
pub mod flags;
pub mod problems;
pub mod users;

use std::time::Duration;

use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};

use civic_core::{ProblemId, UserId};
use civic_state::ProblemStatus;

use crate::store::StoreError;

/// Connect to Postgres and run the embedded migrations.
pub async fn init_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Columns selected for a [`problems::ProblemRow`], qualified with alias `p`.
pub(crate) const PROBLEM_COLUMNS: &str = "p.id, p.title, p.description, p.category, \
     p.image_url, p.latitude, p.longitude, p.address, p.status, p.vote_count, p.rating, \
     p.cluster_id, p.user_id, p.created_at, p.updated_at";

/// Status and owner of a problem row locked for the rest of the transaction.
#[derive(sqlx::FromRow)]
pub(crate) struct LockedProblem {
    pub status: String,
    pub user_id: i64,
}

impl LockedProblem {
    pub fn status(&self) -> Result<ProblemStatus, StoreError> {
        parse_status(&self.status)
    }

    pub fn owner(&self) -> UserId {
        UserId::new(self.user_id)
    }
}

/// Lock a problem row for update, or fail with `ProblemNotFound`.
pub(crate) async fn lock_problem(
    conn: &mut PgConnection,
    id: ProblemId,
) -> Result<LockedProblem, StoreError> {
    sqlx::query_as::<_, LockedProblem>(
        "SELECT status, user_id FROM problems WHERE id = $1 FOR UPDATE",
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::ProblemNotFound(id))
}

pub(crate) fn parse_status(s: &str) -> Result<ProblemStatus, StoreError> {
    s.parse()
        .map_err(|e: civic_state::UnknownLabel| StoreError::Database(e.to_string()))
}

/// Map a foreign-key violation on `user_id` to `UserNotFound`.
pub(crate) fn user_fk(err: sqlx::Error, user: UserId) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::UserNotFound(user)
        }
        _ => StoreError::from(err),
    }
}
