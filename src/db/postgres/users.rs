use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{like_pattern, PgStore};
use crate::{
    db::repository::UserRepository,
    error::{conflict_on_unique, AppResult},
    models::{normalize_email, NewUser, ProfileUpdate, PublicProfile, User, UserId},
};

const USER_COLUMNS: &str = "id, email, password_hash, username, avatar_url, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    username: String,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            username: row.username,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let user = user.into_user();
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.username)
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already in use"))?;

        Ok(row.into())
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                avatar_url = COALESCE($3, avatar_url)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.username)
        .bind(update.avatar_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn search_users(&self, query: &str, limit: usize) -> AppResult<Vec<PublicProfile>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE username ILIKE $1 OR email ILIKE $1
            ORDER BY username
            LIMIT $2
            "#
        ))
        .bind(like_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PublicProfile::from(&User::from(row)))
            .collect())
    }

    async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<PublicProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| PublicProfile::from(&User::from(row)))
            .collect())
    }
}
