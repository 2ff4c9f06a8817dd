use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::{
    db::repository::RecommendationRepository,
    error::AppResult,
    models::{Recommendation, RecommendedItem, UserId},
};

const RECOMMENDATION_COLUMNS: &str = "id, from_user, to_user, show_id, show_name, movie_id, \
     movie_name, image, note, read, created_at, read_at";

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    show_id: Option<String>,
    show_name: Option<String>,
    movie_id: Option<String>,
    movie_name: Option<String>,
    image: Option<serde_json::Value>,
    note: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<RecommendationRow> for Recommendation {
    fn from(row: RecommendationRow) -> Self {
        Recommendation {
            id: row.id,
            from: row.from_user,
            to: row.to_user,
            item: RecommendedItem {
                show_id: row.show_id,
                show_name: row.show_name,
                movie_id: row.movie_id,
                movie_name: row.movie_name,
                image: row.image,
            },
            note: row.note,
            read: row.read,
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for PgStore {
    async fn insert_recommendation(&self, rec: Recommendation) -> AppResult<Recommendation> {
        let row: RecommendationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO recommendations ({RECOMMENDATION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {RECOMMENDATION_COLUMNS}
            "#
        ))
        .bind(rec.id)
        .bind(rec.from)
        .bind(rec.to)
        .bind(rec.item.show_id)
        .bind(rec.item.show_name)
        .bind(rec.item.movie_id)
        .bind(rec.item.movie_name)
        .bind(rec.item.image)
        .bind(rec.note)
        .bind(rec.read)
        .bind(rec.created_at)
        .bind(rec.read_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_recommendation(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        let row: Option<RecommendationRow> = sqlx::query_as(&format!(
            "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Recommendation::from))
    }

    async fn recommendations_to(&self, to: UserId) -> AppResult<Vec<Recommendation>> {
        let rows: Vec<RecommendationRow> = sqlx::query_as(&format!(
            "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations WHERE to_user = $1 ORDER BY created_at DESC"
        ))
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Recommendation::from).collect())
    }

    async fn mark_recommendation_read(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        let row: Option<RecommendationRow> = sqlx::query_as(&format!(
            r#"
            UPDATE recommendations
            SET read = true, read_at = COALESCE(read_at, now())
            WHERE id = $1
            RETURNING {RECOMMENDATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Recommendation::from))
    }

    async fn delete_recommendation(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_read_recommendations_to(&self, to: UserId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM recommendations WHERE to_user = $1 AND read")
            .bind(to)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_read_recommendations_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM recommendations WHERE read AND read_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
