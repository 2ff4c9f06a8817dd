use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::{
    db::repository::MessageRepository,
    error::AppResult,
    models::{Message, UserId},
};

const MESSAGE_COLUMNS: &str = "id, from_user, to_user, text, created_at";

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            from: row.from_user,
            to: row.to_user,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl MessageRepository for PgStore {
    async fn insert_message(&self, message: Message) -> AppResult<Message> {
        let row: MessageRow = sqlx::query_as(&format!(
            "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.id)
        .bind(message.from)
        .bind(message.to)
        .bind(&message.text)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE (from_user = $1 AND to_user = $2) OR (from_user = $2 AND to_user = $1)
            ORDER BY created_at
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}
