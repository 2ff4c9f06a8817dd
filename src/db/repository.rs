//! Storage seams for the domain services.
//!
//! Each trait is implemented by the Postgres store used in production and by
//! the in-memory store used in tests and local development. Both honor the
//! same invariants: one pending request per ordered pair, a single canonical
//! friendship edge, and atomic request resolution.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        FriendRequest, FriendRequestStatus, Message, NewUser, ProfileUpdate, PublicProfile,
        Recommendation, SavedMovie, SavedShow, User, UserId,
    },
};

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user. Fails with `Conflict` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Applies a partial update, returning the updated user if it exists
    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> AppResult<Option<User>>;

    /// Case-insensitive substring search over username and email
    async fn search_users(&self, query: &str, limit: usize) -> AppResult<Vec<PublicProfile>>;

    /// Public profiles for the given ids; unknown ids are skipped
    async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<PublicProfile>>;
}

#[async_trait::async_trait]
pub trait FriendRepository: Send + Sync {
    /// Inserts a pending request. Fails with `Conflict` if one is already
    /// pending for the same ordered pair.
    async fn insert_pending_request(&self, from: UserId, to: UserId) -> AppResult<FriendRequest>;

    async fn find_request(&self, id: Uuid) -> AppResult<Option<FriendRequest>>;

    /// Moves a pending request addressed to `to` into `status`. When the new
    /// status is accepted the friendship edge is created in the same unit of
    /// work. Returns `None` if the request was not pending.
    async fn resolve_request(
        &self,
        id: Uuid,
        to: UserId,
        status: FriendRequestStatus,
    ) -> AppResult<Option<FriendRequest>>;

    /// Deletes the pending request for the pair, returning whether one existed
    async fn delete_pending_request(&self, from: UserId, to: UserId) -> AppResult<bool>;

    async fn pending_requests_to(&self, to: UserId) -> AppResult<Vec<FriendRequest>>;

    async fn pending_requests_from(&self, from: UserId) -> AppResult<Vec<FriendRequest>>;

    /// Creates the edge between `a` and `b`; no-op if it exists
    async fn add_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()>;

    /// Removes the edge between `a` and `b`; no-op if absent
    async fn remove_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()>;

    async fn friend_ids(&self, user: UserId) -> AppResult<Vec<UserId>>;

    async fn are_friends(&self, a: UserId, b: UserId) -> AppResult<bool>;
}

#[async_trait::async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn insert_recommendation(&self, rec: Recommendation) -> AppResult<Recommendation>;

    async fn find_recommendation(&self, id: Uuid) -> AppResult<Option<Recommendation>>;

    /// Recommendations addressed to `to`, newest first
    async fn recommendations_to(&self, to: UserId) -> AppResult<Vec<Recommendation>>;

    async fn mark_recommendation_read(&self, id: Uuid) -> AppResult<Option<Recommendation>>;

    async fn delete_recommendation(&self, id: Uuid) -> AppResult<bool>;

    /// Deletes read recommendations addressed to `to`
    async fn delete_read_recommendations_to(&self, to: UserId) -> AppResult<u64>;

    /// Deletes read recommendations whose read time is before `cutoff`
    async fn delete_read_recommendations_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

#[async_trait::async_trait]
pub trait WatchlistRepository: Send + Sync {
    /// Inserts or replaces the show keyed by (user, show id)
    async fn upsert_show(&self, show: SavedShow) -> AppResult<SavedShow>;

    async fn shows_for(&self, user: UserId) -> AppResult<Vec<SavedShow>>;

    async fn delete_show(&self, user: UserId, show_id: &str) -> AppResult<bool>;

    /// Inserts or replaces the movie keyed by (user, movie id)
    async fn upsert_movie(&self, movie: SavedMovie) -> AppResult<SavedMovie>;

    async fn movies_for(&self, user: UserId) -> AppResult<Vec<SavedMovie>>;

    async fn delete_movie(&self, user: UserId, movie_id: &str) -> AppResult<bool>;
}

#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert_message(&self, message: Message) -> AppResult<Message>;

    /// Messages exchanged between `a` and `b`, oldest first
    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>>;
}
