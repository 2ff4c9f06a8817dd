use serde::Serialize;
use std::{collections::HashSet, sync::Arc};

use crate::{
    auth::{CredentialHasher, TokenService},
    db::{FriendRepository, UserRepository},
    error::{AppError, AppResult},
    models::{NewUser, ProfileUpdate, PublicProfile, User, UserId},
};

const SEARCH_LIMIT: usize = 20;

/// Token plus the authenticated user, returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Fields accepted at registration
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// User directory: accounts, profiles and the friend-edge view
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    edges: Arc<dyn FriendRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        edges: Arc<dyn FriendRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            edges,
            hasher,
            tokens,
        }
    }

    /// Creates an account and logs it in
    pub async fn register(&self, registration: Registration) -> AppResult<AuthSession> {
        let Registration {
            email,
            password,
            confirm_password,
            username,
            avatar_url,
        } = registration;

        if [&email, &password, &confirm_password, &username]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AppError::InvalidInput("All fields are required.".to_string()));
        }
        if password != confirm_password {
            return Err(AppError::InvalidInput("Passwords do not match.".to_string()));
        }

        let user = self
            .users
            .insert_user(NewUser {
                email,
                password_hash: self.hasher.hash(&password)?,
                username: username.trim().to_string(),
                avatar_url: avatar_url.filter(|url| !url.trim().is_empty()),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password required.".to_string(),
            ));
        }

        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());
        let user = self.users.find_user_by_email(email).await?.ok_or_else(invalid)?;
        if !self.hasher.verify(password, &user.password_hash) {
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(invalid());
        }

        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }

    pub async fn profile(&self, id: UserId) -> AppResult<User> {
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> AppResult<User> {
        if update
            .username
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(AppError::InvalidInput("Username cannot be empty.".to_string()));
        }

        self.users
            .update_profile(id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    /// Users whose name or email contains `query`, one per (email, username)
    pub async fn search(&self, query: &str) -> AppResult<Vec<PublicProfile>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        Ok(self
            .users
            .search_users(query, SEARCH_LIMIT)
            .await?
            .into_iter()
            .filter(|p| seen.insert((p.email.clone(), p.username.clone())))
            .collect())
    }

    pub async fn public_profile(&self, id: UserId) -> AppResult<PublicProfile> {
        Ok(PublicProfile::from(&self.profile(id).await?))
    }

    pub async fn exists(&self, id: UserId) -> AppResult<bool> {
        Ok(self.users.find_user(id).await?.is_some())
    }

    /// Public profiles keyed by id, for enriching request and mailbox listings
    pub async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<PublicProfile>> {
        self.users.profiles(ids).await
    }

    pub async fn list_friends(&self, user: UserId) -> AppResult<Vec<PublicProfile>> {
        let ids = self.edges.friend_ids(user).await?;
        self.users.profiles(&ids).await
    }

    pub async fn are_friends(&self, a: UserId, b: UserId) -> AppResult<bool> {
        self.edges.are_friends(a, b).await
    }

    pub async fn add_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()> {
        self.edges.add_friend_edge(a, b).await
    }

    pub async fn remove_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()> {
        self.edges.remove_friend_edge(a, b).await
    }
}
