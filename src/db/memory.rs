//! In-memory store.
//!
//! Every mutation that must be atomic (pending-request insert, request
//! resolution plus edge creation) runs under a single write lock, so the
//! invariants match the Postgres constraints.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::repository::{
        FriendRepository, MessageRepository, RecommendationRepository, UserRepository,
        WatchlistRepository,
    },
    error::{AppError, AppResult},
    models::{
        normalize_email, FriendEdge, FriendRequest, FriendRequestStatus, Message, NewUser,
        ProfileUpdate, PublicProfile, Recommendation, SavedMovie, SavedShow, User, UserId,
    },
};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    requests: HashMap<Uuid, FriendRequest>,
    edges: HashSet<FriendEdge>,
    recommendations: HashMap<Uuid, Recommendation>,
    shows: HashMap<(UserId, String), SavedShow>,
    movies: HashMap<(UserId, String), SavedMovie>,
    messages: Vec<Message>,
}

/// Store backed by process memory; contents are lost on restart
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let user = user.into_user();
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = normalize_email(email);
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> AppResult<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        Ok(Some(user.clone()))
    }

    async fn search_users(&self, query: &str, limit: usize) -> AppResult<Vec<PublicProfile>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        let mut matches: Vec<&User> = inner
            .users
            .values()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(matches
            .into_iter()
            .take(limit)
            .map(PublicProfile::from)
            .collect())
    }

    async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<PublicProfile>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id))
            .map(PublicProfile::from)
            .collect())
    }
}

#[async_trait::async_trait]
impl FriendRepository for MemoryStore {
    async fn insert_pending_request(&self, from: UserId, to: UserId) -> AppResult<FriendRequest> {
        let mut inner = self.inner.write().await;
        let duplicate = inner
            .requests
            .values()
            .any(|r| r.from == from && r.to == to && r.is_pending());
        if duplicate {
            return Err(AppError::Conflict("Request already sent".to_string()));
        }
        let request = FriendRequest::pending(from, to);
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: Uuid) -> AppResult<Option<FriendRequest>> {
        Ok(self.inner.read().await.requests.get(&id).cloned())
    }

    async fn resolve_request(
        &self,
        id: Uuid,
        to: UserId,
        status: FriendRequestStatus,
    ) -> AppResult<Option<FriendRequest>> {
        let mut inner = self.inner.write().await;
        let resolved = match inner.requests.get_mut(&id) {
            Some(request) if request.is_pending() && request.to == to => {
                request.status = status;
                request.resolved_at = Some(Utc::now());
                request.clone()
            }
            _ => return Ok(None),
        };
        if status == FriendRequestStatus::Accepted {
            if let Some(edge) = FriendEdge::new(resolved.from, resolved.to) {
                inner.edges.insert(edge);
            }
        }
        Ok(Some(resolved))
    }

    async fn delete_pending_request(&self, from: UserId, to: UserId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let id = inner
            .requests
            .values()
            .find(|r| r.from == from && r.to == to && r.is_pending())
            .map(|r| r.id);
        Ok(id.and_then(|id| inner.requests.remove(&id)).is_some())
    }

    async fn pending_requests_to(&self, to: UserId) -> AppResult<Vec<FriendRequest>> {
        let inner = self.inner.read().await;
        let mut requests: Vec<FriendRequest> = inner
            .requests
            .values()
            .filter(|r| r.to == to && r.is_pending())
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn pending_requests_from(&self, from: UserId) -> AppResult<Vec<FriendRequest>> {
        let inner = self.inner.read().await;
        let mut requests: Vec<FriendRequest> = inner
            .requests
            .values()
            .filter(|r| r.from == from && r.is_pending())
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn add_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()> {
        if let Some(edge) = FriendEdge::new(a, b) {
            self.inner.write().await.edges.insert(edge);
        }
        Ok(())
    }

    async fn remove_friend_edge(&self, a: UserId, b: UserId) -> AppResult<()> {
        if let Some(edge) = FriendEdge::new(a, b) {
            self.inner.write().await.edges.remove(&edge);
        }
        Ok(())
    }

    async fn friend_ids(&self, user: UserId) -> AppResult<Vec<UserId>> {
        let inner = self.inner.read().await;
        Ok(inner.edges.iter().filter_map(|e| e.other(user)).collect())
    }

    async fn are_friends(&self, a: UserId, b: UserId) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(FriendEdge::new(a, b).is_some_and(|edge| inner.edges.contains(&edge)))
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for MemoryStore {
    async fn insert_recommendation(&self, rec: Recommendation) -> AppResult<Recommendation> {
        self.inner
            .write()
            .await
            .recommendations
            .insert(rec.id, rec.clone());
        Ok(rec)
    }

    async fn find_recommendation(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        Ok(self.inner.read().await.recommendations.get(&id).cloned())
    }

    async fn recommendations_to(&self, to: UserId) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        let mut recs: Vec<Recommendation> = inner
            .recommendations
            .values()
            .filter(|r| r.to == to)
            .cloned()
            .collect();
        recs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recs)
    }

    async fn mark_recommendation_read(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        let mut inner = self.inner.write().await;
        Ok(inner.recommendations.get_mut(&id).map(|rec| {
            if !rec.read {
                rec.read = true;
                rec.read_at = Some(Utc::now());
            }
            rec.clone()
        }))
    }

    async fn delete_recommendation(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.inner.write().await.recommendations.remove(&id).is_some())
    }

    async fn delete_read_recommendations_to(&self, to: UserId) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.recommendations.len();
        inner.recommendations.retain(|_, r| !(r.to == to && r.read));
        Ok((before - inner.recommendations.len()) as u64)
    }

    async fn delete_read_recommendations_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.recommendations.len();
        inner
            .recommendations
            .retain(|_, r| !(r.read && r.read_at.is_some_and(|at| at < cutoff)));
        Ok((before - inner.recommendations.len()) as u64)
    }
}

#[async_trait::async_trait]
impl WatchlistRepository for MemoryStore {
    async fn upsert_show(&self, show: SavedShow) -> AppResult<SavedShow> {
        let key = (show.user_id, show.show_id.clone());
        self.inner.write().await.shows.insert(key, show.clone());
        Ok(show)
    }

    async fn shows_for(&self, user: UserId) -> AppResult<Vec<SavedShow>> {
        let inner = self.inner.read().await;
        let mut shows: Vec<SavedShow> = inner
            .shows
            .values()
            .filter(|s| s.user_id == user)
            .cloned()
            .collect();
        shows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(shows)
    }

    async fn delete_show(&self, user: UserId, show_id: &str) -> AppResult<bool> {
        let key = (user, show_id.to_string());
        Ok(self.inner.write().await.shows.remove(&key).is_some())
    }

    async fn upsert_movie(&self, mut movie: SavedMovie) -> AppResult<SavedMovie> {
        let key = (movie.user_id, movie.movie_id.clone());
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.movies.get(&key) {
            movie.created_at = existing.created_at;
        }
        inner.movies.insert(key, movie.clone());
        Ok(movie)
    }

    async fn movies_for(&self, user: UserId) -> AppResult<Vec<SavedMovie>> {
        let inner = self.inner.read().await;
        let mut movies: Vec<SavedMovie> = inner
            .movies
            .values()
            .filter(|m| m.user_id == user)
            .cloned()
            .collect();
        movies.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(movies)
    }

    async fn delete_movie(&self, user: UserId, movie_id: &str) -> AppResult<bool> {
        let key = (user, movie_id.to_string());
        Ok(self.inner.write().await.movies.remove(&key).is_some())
    }
}

#[async_trait::async_trait]
impl MessageRepository for MemoryStore {
    async fn insert_message(&self, message: Message) -> AppResult<Message> {
        self.inner.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn conversation(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            username: email.split('@').next().unwrap_or_default().to_string(),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice@example.com")).await.unwrap();

        let err = store
            .insert_user(new_user("ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_pending_inserts_yield_one_conflict() {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.insert_pending_request(a, b).await }
        });
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.insert_pending_request(a, b).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert_eq!(store.pending_requests_to(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_only_applies_to_pending_for_recipient() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let request = store.insert_pending_request(a, b).await.unwrap();

        let wrong_recipient = store
            .resolve_request(request.id, a, FriendRequestStatus::Accepted)
            .await
            .unwrap();
        assert!(wrong_recipient.is_none());

        let accepted = store
            .resolve_request(request.id, b, FriendRequestStatus::Accepted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accepted.status, FriendRequestStatus::Accepted);
        assert!(store.are_friends(a, b).await.unwrap());

        let again = store
            .resolve_request(request.id, b, FriendRequestStatus::Rejected)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_sweep_keeps_unread_and_recent() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let unread = Recommendation::new(a, b, Default::default(), None);
        let mut old_read = Recommendation::new(a, b, Default::default(), None);
        old_read.read = true;
        old_read.read_at = Some(Utc::now() - chrono::Duration::days(30));
        let mut fresh_read = Recommendation::new(a, b, Default::default(), None);
        fresh_read.read = true;
        fresh_read.read_at = Some(Utc::now());

        for rec in [unread.clone(), old_read.clone(), fresh_read.clone()] {
            store.insert_recommendation(rec).await.unwrap();
        }

        let removed = store
            .delete_read_recommendations_before(Utc::now() - chrono::Duration::days(7))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.find_recommendation(old_read.id).await.unwrap().is_none());
        assert!(store.find_recommendation(unread.id).await.unwrap().is_some());
        assert!(store.find_recommendation(fresh_read.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_movie_upsert_preserves_created_at() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let created = Utc::now() - chrono::Duration::days(1);
        let movie = SavedMovie {
            user_id: user,
            movie_id: "603".to_string(),
            name: Some("The Matrix".to_string()),
            image: None,
            release_date: None,
            genres: vec![],
            rating: None,
            status: None,
            created_at: created,
            updated_at: created,
        };
        store.upsert_movie(movie.clone()).await.unwrap();

        let updated = store
            .upsert_movie(SavedMovie {
                created_at: Utc::now(),
                updated_at: Utc::now(),
                ..movie
            })
            .await
            .unwrap();

        assert_eq!(updated.created_at, created);
        assert_eq!(store.movies_for(user).await.unwrap().len(), 1);
    }
}
