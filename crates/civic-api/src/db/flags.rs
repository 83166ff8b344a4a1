//! Flag persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use civic_core::{FlagId, ProblemId, UserId};

use super::problems::ProblemRow;
use super::{lock_problem, user_fk, PROBLEM_COLUMNS};
use crate::store::{FlagRecord, FlaggedIssueView, FlaggedProblem, StoreError, UserSummary};

/// Insert a flag. A second flag from the same user is a `DuplicateFlag`.
pub async fn insert(
    pool: &PgPool,
    user: UserId,
    problem: ProblemId,
    reason: &str,
) -> Result<FlagRecord, StoreError> {
    let mut tx = pool.begin().await?;
    lock_problem(&mut *tx, problem).await?;

    let row = sqlx::query_as::<_, FlagRow>(
        "INSERT INTO flagged_issues (user_id, problem_id, reason) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, problem_id) DO NOTHING
         RETURNING id, user_id, problem_id, reason, created_at",
    )
    .bind(user.get())
    .bind(problem.get())
    .bind(reason)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| user_fk(e, user))?
    .ok_or(StoreError::DuplicateFlag { user, problem })?;

    tx.commit().await?;
    Ok(row.into_record())
}

/// Remove a user's flag on a problem.
pub async fn delete(pool: &PgPool, user: UserId, problem: ProblemId) -> Result<(), StoreError> {
    let removed = sqlx::query("DELETE FROM flagged_issues WHERE user_id = $1 AND problem_id = $2")
        .bind(user.get())
        .bind(problem.get())
        .execute(pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(StoreError::FlagNotFound { user, problem });
    }
    Ok(())
}

/// Number of flags on a problem.
pub async fn count_for_problem(pool: &PgPool, problem: ProblemId) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flagged_issues WHERE problem_id = $1")
        .bind(problem.get())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Every flag joined with its problem, the problem owner, and the
/// flagging user, newest first.
pub async fn list(pool: &PgPool) -> Result<Vec<FlaggedIssueView>, StoreError> {
    let sql = format!(
        "SELECT f.id AS flag_id, f.user_id AS flag_user_id, f.reason,
                f.created_at AS flag_created_at,
                {PROBLEM_COLUMNS},
                o.name AS owner_name, o.email AS owner_email,
                fu.name AS flagger_name, fu.email AS flagger_email
         FROM flagged_issues f
         JOIN problems p ON p.id = f.problem_id
         JOIN users o ON o.id = p.user_id
         JOIN users fu ON fu.id = f.user_id
         ORDER BY f.created_at DESC, f.id DESC"
    );
    let rows = sqlx::query_as::<_, FlagViewRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(FlagViewRow::into_view).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct FlagRow {
    id: i64,
    user_id: i64,
    problem_id: i64,
    reason: String,
    created_at: DateTime<Utc>,
}

impl FlagRow {
    fn into_record(self) -> FlagRecord {
        FlagRecord {
            id: FlagId::new(self.id),
            user_id: UserId::new(self.user_id),
            problem_id: ProblemId::new(self.problem_id),
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlagViewRow {
    flag_id: i64,
    flag_user_id: i64,
    reason: String,
    flag_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    problem: ProblemRow,
    owner_name: String,
    owner_email: String,
    flagger_name: String,
    flagger_email: String,
}

impl FlagViewRow {
    fn into_view(self) -> Result<FlaggedIssueView, StoreError> {
        let problem = self.problem.into_record()?;
        let flagger = UserId::new(self.flag_user_id);
        Ok(FlaggedIssueView {
            flag: FlagRecord {
                id: FlagId::new(self.flag_id),
                user_id: flagger,
                problem_id: problem.id,
                reason: self.reason,
                created_at: self.flag_created_at,
            },
            problem: FlaggedProblem {
                user: UserSummary {
                    id: problem.user_id,
                    name: self.owner_name,
                    email: self.owner_email,
                },
                problem,
            },
            user: UserSummary {
                id: flagger,
                name: self.flagger_name,
                email: self.flagger_email,
            },
        })
    }
}
