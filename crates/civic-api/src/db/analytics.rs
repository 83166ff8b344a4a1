//! Aggregate counts for the government dashboard.

use sqlx::PgPool;

use crate::store::{AnalyticsSnapshot, ProblemStats, StoreError, UserStats};

/// Count users, problems by status, and flag rows in one round trip.
pub async fn snapshot(pool: &PgPool) -> Result<AnalyticsSnapshot, StoreError> {
    let row = sqlx::query_as::<_, CountsRow>(
        "SELECT
            (SELECT COUNT(*) FROM users)                                  AS total_users,
            (SELECT COUNT(*) FROM users WHERE is_banned)                  AS banned_users,
            (SELECT COUNT(*) FROM problems)                               AS total_problems,
            (SELECT COUNT(*) FROM problems WHERE status = 'REPORTED')     AS reported_problems,
            (SELECT COUNT(*) FROM problems WHERE status = 'IN_PROGRESS')  AS in_progress_problems,
            (SELECT COUNT(*) FROM problems WHERE status = 'COMPLETED')    AS completed_problems,
            (SELECT COUNT(*) FROM problems WHERE status = 'REJECTED')     AS rejected_problems,
            (SELECT COUNT(*) FROM flagged_issues)                         AS flagged_problems",
    )
    .fetch_one(pool)
    .await?;

    Ok(AnalyticsSnapshot {
        user_stats: UserStats {
            total_users: row.total_users,
            banned_users: row.banned_users,
        },
        problem_stats: ProblemStats {
            total_problems: row.total_problems,
            reported_problems: row.reported_problems,
            in_progress_problems: row.in_progress_problems,
            completed_problems: row.completed_problems,
            rejected_problems: row.rejected_problems,
            flagged_problems: row.flagged_problems,
        },
    })
}

#[derive(sqlx::FromRow)]
struct CountsRow {
    total_users: i64,
    banned_users: i64,
    total_problems: i64,
    reported_problems: i64,
    in_progress_problems: i64,
    completed_problems: i64,
    rejected_problems: i64,
    flagged_problems: i64,
}
