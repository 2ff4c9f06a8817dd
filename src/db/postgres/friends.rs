use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::{
    db::repository::FriendRepository,
    error::{conflict_on_unique, AppError, AppResult},
    models::{FriendEdge, FriendRequest, FriendRequestStatus, UserId},
};

const REQUEST_COLUMNS: &str = "id, from_user, to_user, status, created_at, resolved_at";

#[derive(sqlx::FromRow)]
struct FriendRequestRow {
    id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<FriendRequestRow> for FriendRequest {
    type Error = AppError;

    fn try_from(row: FriendRequestRow) -> Result<Self, Self::Error> {
        Ok(FriendRequest {
            id: row.id,
            from: row.from_user,
            to: row.to_user,
            status: row.status.parse().map_err(AppError::Internal)?,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

fn into_requests(rows: Vec<FriendRequestRow>) -> AppResult<Vec<FriendRequest>> {
    rows.into_iter().map(FriendRequest::try_from).collect()
}

async fn insert_edge<'e, E>(executor: E, edge: FriendEdge) -> sqlx::Result<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO friendships (user_low, user_high) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(edge.low)
    .bind(edge.high)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl FriendRepository for PgStore {
    async fn insert_pending_request(&self, from: UserId, to: UserId) -> AppResult<FriendRequest> {
        let request = FriendRequest::pending(from, to);
        let row: FriendRequestRow = sqlx::query_as(&format!(
            "INSERT INTO friend_requests ({REQUEST_COLUMNS}) VALUES ($1, $2, $3, $4, $5, NULL) RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request.id)
        .bind(request.from)
        .bind(request.to)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Request already sent"))?;

        row.try_into()
    }

    async fn find_request(&self, id: Uuid) -> AppResult<Option<FriendRequest>> {
        let row: Option<FriendRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FriendRequest::try_from).transpose()
    }

    async fn resolve_request(
        &self,
        id: Uuid,
        to: UserId,
        status: FriendRequestStatus,
    ) -> AppResult<Option<FriendRequest>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<FriendRequestRow> = sqlx::query_as(&format!(
            r#"
            UPDATE friend_requests
            SET status = $3, resolved_at = now()
            WHERE id = $1 AND to_user = $2 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to)
        .bind(status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let request = FriendRequest::try_from(row)?;

        if status == FriendRequestStatus::Accepted {
            if let Some(edge) = FriendEdge::new(request.from, request.to) {
                insert_edge(&mut *tx, edge).await?;
            }
        }

        tx.commit().await?;
        Ok(Some(request))
    }

    async fn delete_pending_request(&self, from: UserId, to: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM friend_requests WHERE from_user = $1 AND to_user = $2 AND status = 'pending'",
        )
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pending_requests_to(&self, to: UserId) -> AppResult<Vec<FriendRequest>> {
        let rows: Vec<FriendRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE to_user = $1 AND status = 'pending' ORDER BY created_at"
        ))
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        into_requests(rows)
    }

    async fn pending_requests_from(&self, from: UserId) -> AppResult<Vec<FriendRequest>> {
        let rows: Vec<FriendRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE from_user = $1 AND status = 'pending' ORDER BY created_at"
        ))
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        into_requests(rows)
    }

    async fn add_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()> {
        if let Some(edge) = FriendEdge::new(a, b) {
            insert_edge(&self.pool, edge).await?;
        }
        Ok(())
    }

    async fn remove_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()> {
        if let Some(edge) = FriendEdge::new(a, b) {
            sqlx::query("DELETE FROM friendships WHERE user_low = $1 AND user_high = $2")
                .bind(edge.low)
                .bind(edge.high)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn friend_ids(&self, user: UserId) -> AppResult<Vec<UserId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT CASE WHEN user_low = $1 THEN user_high ELSE user_low END
            FROM friendships
            WHERE user_low = $1 OR user_high = $1
            ORDER BY created_at
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn are_friends(&self, a: UserId, b: UserId) -> AppResult<bool> {
        let Some(edge) = FriendEdge::new(a, b) else {
            return Ok(false);
        };
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM friendships WHERE user_low = $1 AND user_high = $2)",
        )
        .bind(edge.low)
        .bind(edge.high)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
