//! Vote and rating persistence. Each write runs in a transaction that
//! locks the problem row, mutates the engagement row, and updates the
//! cached counter on `problems`.

use sqlx::PgPool;

use civic_core::{ProblemId, RatingValue, UserId};

use super::{lock_problem, user_fk};
use crate::store::{StoreError, VoteOutcome};

/// Toggle a user's vote on a problem.
pub async fn toggle_vote(
    pool: &PgPool,
    user: UserId,
    problem: ProblemId,
) -> Result<VoteOutcome, StoreError> {
    let mut tx = pool.begin().await?;
    lock_problem(&mut *tx, problem).await?;

    let removed = sqlx::query("DELETE FROM votes WHERE user_id = $1 AND problem_id = $2")
        .bind(user.get())
        .bind(problem.get())
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    let delta: i64 = if removed {
        -1
    } else {
        sqlx::query("INSERT INTO votes (user_id, problem_id) VALUES ($1, $2)")
            .bind(user.get())
            .bind(problem.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| user_fk(e, user))?;
        1
    };

    let vote_count: i64 = sqlx::query_scalar(
        "UPDATE problems SET vote_count = vote_count + $1 WHERE id = $2 RETURNING vote_count",
    )
    .bind(delta)
    .bind(problem.get())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(VoteOutcome {
        voted: !removed,
        vote_count,
    })
}

/// Whether a vote row exists.
pub async fn has_voted(pool: &PgPool, user: UserId, problem: ProblemId) -> Result<bool, StoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM votes WHERE user_id = $1 AND problem_id = $2)",
    )
    .bind(user.get())
    .bind(problem.get())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Insert or overwrite a rating and refresh the cached average.
pub async fn upsert_rating(
    pool: &PgPool,
    user: UserId,
    problem: ProblemId,
    value: RatingValue,
) -> Result<f64, StoreError> {
    let mut tx = pool.begin().await?;
    lock_problem(&mut *tx, problem).await?;

    sqlx::query(
        "INSERT INTO ratings (user_id, problem_id, value) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, problem_id)
         DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
    )
    .bind(user.get())
    .bind(problem.get())
    .bind(value.get())
    .execute(&mut *tx)
    .await
    .map_err(|e| user_fk(e, user))?;

    let average: f64 = sqlx::query_scalar(
        "UPDATE problems
         SET rating = (SELECT COALESCE(AVG(value)::float8, 0::float8)
                       FROM ratings WHERE problem_id = $1)
         WHERE id = $1
         RETURNING rating",
    )
    .bind(problem.get())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(average)
}

/// Mean of the rating rows, 0 when there are none.
pub async fn average_rating(pool: &PgPool, problem: ProblemId) -> Result<f64, StoreError> {
    let average: f64 = sqlx::query_scalar(
        "SELECT COALESCE(AVG(value)::float8, 0::float8) FROM ratings WHERE problem_id = $1",
    )
    .bind(problem.get())
    .fetch_one(pool)
    .await?;
    Ok(average)
}

/// The user's own rating, if any.
pub async fn user_rating(
    pool: &PgPool,
    user: UserId,
    problem: ProblemId,
) -> Result<Option<RatingValue>, StoreError> {
    let value: Option<i16> =
        sqlx::query_scalar("SELECT value FROM ratings WHERE user_id = $1 AND problem_id = $2")
            .bind(user.get())
            .bind(problem.get())
            .fetch_optional(pool)
            .await?;
    value
        .map(|v| RatingValue::new(i64::from(v)).map_err(|e| StoreError::Database(e.to_string())))
        .transpose()
}
