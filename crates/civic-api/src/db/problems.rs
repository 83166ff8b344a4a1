//! Problem persistence operations: submission, lookup, radius search,
//! deletion, and status transitions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use civic_core::{GeoPoint, IssueCategory, Location, ProblemId, UserId, EARTH_RADIUS_KM};
use civic_state::{ensure_deletable, StatusTransition, TransitionPolicy};

use super::{lock_problem, parse_status, user_fk, PROBLEM_COLUMNS};
use crate::store::{NearbyProblem, NewProblem, ProblemRecord, StoreError};

/// Insert a problem and credit its owner `reward` coins in one transaction.
pub async fn create(
    pool: &PgPool,
    problem: &NewProblem,
    reward: i64,
) -> Result<ProblemRecord, StoreError> {
    let mut tx = pool.begin().await?;

    let credited = sqlx::query("UPDATE users SET coins = coins + $1 WHERE id = $2")
        .bind(reward)
        .bind(problem.owner.get())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if credited == 0 {
        return Err(StoreError::UserNotFound(problem.owner));
    }

    let sql = format!(
        "INSERT INTO problems AS p (title, description, category, image_url, latitude,
         longitude, address, cluster_id, user_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {PROBLEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ProblemRow>(&sql)
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(problem.category.as_str())
        .bind(&problem.image_url)
        .bind(problem.location.lat)
        .bind(problem.location.lng)
        .bind(&problem.location.address)
        .bind(problem.cluster_id)
        .bind(problem.owner.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| user_fk(e, problem.owner))?;

    tx.commit().await?;
    row.into_record()
}

/// Fetch a problem by ID.
pub async fn get_by_id(pool: &PgPool, id: ProblemId) -> Result<Option<ProblemRecord>, StoreError> {
    let sql = format!("SELECT {PROBLEM_COLUMNS} FROM problems p WHERE p.id = $1");
    sqlx::query_as::<_, ProblemRow>(&sql)
        .bind(id.get())
        .fetch_optional(pool)
        .await?
        .map(ProblemRow::into_record)
        .transpose()
}

/// Problems within `radius_km` of `center`, nearest first.
///
/// Haversine evaluated in SQL. `LEAST(1, ..)` keeps `asin` in its domain
/// when rounding pushes the term a hair above 1.
pub async fn list_near(
    pool: &PgPool,
    center: GeoPoint,
    radius_km: f64,
) -> Result<Vec<NearbyProblem>, StoreError> {
    let sql = format!(
        "SELECT * FROM (
            SELECT {PROBLEM_COLUMNS}, u.name AS user_name,
                   2 * $4 * asin(sqrt(LEAST(1.0,
                       power(sin(radians(p.latitude - $1) / 2), 2)
                       + cos(radians($1)) * cos(radians(p.latitude))
                         * power(sin(radians(p.longitude - $2) / 2), 2)
                   ))) AS distance_km
            FROM problems p
            JOIN users u ON u.id = p.user_id
         ) nearby
         WHERE distance_km <= $3
         ORDER BY distance_km, id"
    );
    let rows = sqlx::query_as::<_, NearbyRow>(&sql)
        .bind(center.lat)
        .bind(center.lng)
        .bind(radius_km)
        .bind(EARTH_RADIUS_KM)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            Ok(NearbyProblem {
                problem: row.problem.into_record()?,
                distance_km: row.distance_km,
                user_name: row.user_name,
            })
        })
        .collect()
}

/// Delete a problem owned by `requester` that is still `REPORTED`.
/// Votes, ratings, and flags go with it via `ON DELETE CASCADE`.
pub async fn delete(pool: &PgPool, id: ProblemId, requester: UserId) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let locked = lock_problem(&mut *tx, id).await?;
    ensure_deletable(locked.status()?, locked.owner(), requester)?;

    sqlx::query("DELETE FROM problems WHERE id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Apply a status transition and its coin delta in one transaction.
pub async fn apply_transition(
    pool: &PgPool,
    id: ProblemId,
    transition: StatusTransition,
    policy: TransitionPolicy,
) -> Result<ProblemRecord, StoreError> {
    let mut tx = pool.begin().await?;

    let locked = lock_problem(&mut *tx, id).await?;
    let next = transition.apply(locked.status()?, policy)?;

    let adjusted = sqlx::query("UPDATE users SET coins = coins + $1 WHERE id = $2")
        .bind(transition.coin_delta())
        .bind(locked.user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if adjusted == 0 {
        return Err(StoreError::UserNotFound(locked.owner()));
    }

    let sql = format!(
        "UPDATE problems AS p SET status = $1, updated_at = now() WHERE p.id = $2
         RETURNING {PROBLEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ProblemRow>(&sql)
        .bind(next.as_str())
        .bind(id.get())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    row.into_record()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
pub(crate) struct ProblemRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    image_url: String,
    latitude: f64,
    longitude: f64,
    address: Option<String>,
    status: String,
    vote_count: i64,
    rating: f64,
    cluster_id: i32,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProblemRow {
    pub(crate) fn into_record(self) -> Result<ProblemRecord, StoreError> {
        Ok(ProblemRecord {
            id: ProblemId::new(self.id),
            title: self.title,
            description: self.description,
            category: IssueCategory::from_label(&self.category),
            image_url: self.image_url,
            location: Location {
                lat: self.latitude,
                lng: self.longitude,
                address: self.address,
            },
            status: parse_status(&self.status)?,
            vote_count: self.vote_count,
            rating: self.rating,
            cluster_id: self.cluster_id,
            user_id: UserId::new(self.user_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NearbyRow {
    #[sqlx(flatten)]
    problem: ProblemRow,
    user_name: String,
    distance_km: f64,
}
