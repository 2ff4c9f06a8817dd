use std::sync::Arc;

use crate::{
    db::MessageRepository,
    error::{AppError, AppResult},
    models::{Message, UserId},
    services::users::UserService,
};

/// Plain-text messages between friends
#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    directory: UserService,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageRepository>, directory: UserService) -> Self {
        Self {
            messages,
            directory,
        }
    }

    pub async fn send(&self, from: UserId, to: UserId, text: &str) -> AppResult<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput("Message text is required".to_string()));
        }
        self.ensure_friends(from, to).await?;

        let message = self
            .messages
            .insert_message(Message::new(from, to, text.to_string()))
            .await?;
        tracing::debug!(message_id = %message.id, %from, %to, "Message sent");
        Ok(message)
    }

    /// Messages between `caller` and `friend`, oldest first
    pub async fn conversation(&self, caller: UserId, friend: UserId) -> AppResult<Vec<Message>> {
        self.ensure_friends(caller, friend).await?;
        self.messages.conversation(caller, friend).await
    }

    async fn ensure_friends(&self, a: UserId, b: UserId) -> AppResult<()> {
        if self.directory.are_friends(a, b).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You can only message your friends".to_string(),
            ))
        }
    }
}
