//! User persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use civic_core::UserId;
use civic_state::ensure_bannable;

use crate::store::{NewUser, StoreError, UserRecord};

const USER_COLUMNS: &str =
    "id, name, email, is_government, is_banned, banned_at, banned_by, coins, created_at";

/// Insert a new user with zero coins.
pub async fn insert(pool: &PgPool, user: &NewUser) -> Result<UserRecord, StoreError> {
    let sql = format!(
        "INSERT INTO users (name, email, is_government) VALUES ($1, $2, $3)
         RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_government)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail(user.email.clone())
            }
            _ => StoreError::from(e),
        })?;
    Ok(row.into_record())
}

/// Fetch a user by ID.
pub async fn get_by_id(pool: &PgPool, id: UserId) -> Result<Option<UserRecord>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id.get())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(UserRow::into_record))
}

/// Ban a non-government user.
pub async fn ban(
    pool: &PgPool,
    target: UserId,
    by: UserId,
    at: DateTime<Utc>,
) -> Result<UserRecord, StoreError> {
    let mut tx = pool.begin().await?;

    let is_government: bool =
        sqlx::query_scalar("SELECT is_government FROM users WHERE id = $1 FOR UPDATE")
            .bind(target.get())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::UserNotFound(target))?;
    ensure_bannable(target, is_government)?;

    let sql = format!(
        "UPDATE users SET is_banned = TRUE, banned_at = $2, banned_by = $3 WHERE id = $1
         RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(target.get())
        .bind(at)
        .bind(by.get())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row.into_record())
}

/// Clear a user's ban fields.
pub async fn unban(pool: &PgPool, target: UserId) -> Result<UserRecord, StoreError> {
    let sql = format!(
        "UPDATE users SET is_banned = FALSE, banned_at = NULL, banned_by = NULL WHERE id = $1
         RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(target.get())
        .fetch_optional(pool)
        .await?
        .map(UserRow::into_record)
        .ok_or(StoreError::UserNotFound(target))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    is_government: bool,
    is_banned: bool,
    banned_at: Option<DateTime<Utc>>,
    banned_by: Option<i64>,
    coins: i64,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            id: UserId::new(self.id),
            name: self.name,
            email: self.email,
            is_government: self.is_government,
            is_banned: self.is_banned,
            banned_at: self.banned_at,
            banned_by: self.banned_by.map(UserId::new),
            coins: self.coins,
            created_at: self.created_at,
        }
    }
}
