use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// A plain-text message between two friends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub from: UserId,
    pub to: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(from: UserId, to: UserId, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            text,
            created_at: Utc::now(),
        }
    }

    /// True if the message was exchanged between `a` and `b` in either direction
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}
