use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a registered user
pub type UserId = Uuid;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl NewUser {
    /// Builds the stored record, normalizing the email to lowercase
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: normalize_email(&self.email),
            password_hash: self.password_hash,
            username: self.username,
            avatar_url: self.avatar_url,
            created_at: Utc::now(),
        }
    }
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Public projection of a user shown to other users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = NewUser {
            email: "a@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            username: "alice".to_string(),
            avatar_url: None,
        }
        .into_user();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "alice");
        assert!(json.get("avatarUrl").is_some());
    }

    #[test]
    fn test_email_normalized_on_creation() {
        let user = NewUser {
            email: "  Alice@Example.COM ".to_string(),
            password_hash: String::new(),
            username: "alice".to_string(),
            avatar_url: None,
        }
        .into_user();

        assert_eq!(user.email, "alice@example.com");
    }
}
