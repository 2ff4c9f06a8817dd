//! Friend request ledger.
//!
//! Requests move `pending -> accepted | rejected` and never leave a terminal
//! state; cancelling deletes the pending record. Accepting creates the
//! friendship edge in the same storage transaction as the status change, so
//! a friendship is never visible from one side only.

use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    db::FriendRepository,
    error::{AppError, AppResult},
    models::{FriendRequest, FriendRequestStatus, FriendRequestWithUser, UserId},
    services::users::UserService,
};

#[derive(Clone)]
pub struct FriendService {
    ledger: Arc<dyn FriendRepository>,
    directory: UserService,
}

impl FriendService {
    pub fn new(ledger: Arc<dyn FriendRepository>, directory: UserService) -> Self {
        Self { ledger, directory }
    }

    pub async fn send_request(&self, from: UserId, to: UserId) -> AppResult<FriendRequest> {
        if from == to {
            return Err(AppError::InvalidInput(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }
        if !self.directory.exists(to).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if self.directory.are_friends(from, to).await? {
            return Err(AppError::Conflict("Already friends".to_string()));
        }

        let request = self.ledger.insert_pending_request(from, to).await?;
        tracing::info!(request_id = %request.id, %from, %to, "Friend request sent");
        Ok(request)
    }

    pub async fn accept_request(&self, id: Uuid, caller: UserId) -> AppResult<FriendRequest> {
        self.resolve(id, caller, FriendRequestStatus::Accepted).await
    }

    pub async fn reject_request(&self, id: Uuid, caller: UserId) -> AppResult<FriendRequest> {
        self.resolve(id, caller, FriendRequestStatus::Rejected).await
    }

    async fn resolve(
        &self,
        id: Uuid,
        caller: UserId,
        status: FriendRequestStatus,
    ) -> AppResult<FriendRequest> {
        let not_found = || AppError::NotFound("Request not found or already handled".to_string());

        let request = self
            .ledger
            .find_request(id)
            .await?
            .filter(FriendRequest::is_pending)
            .ok_or_else(not_found)?;
        if request.to != caller {
            return Err(AppError::Forbidden(
                "Only the recipient can answer this request".to_string(),
            ));
        }

        // A concurrent resolver may have won since the lookup
        let resolved = self
            .ledger
            .resolve_request(id, caller, status)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(
            request_id = %id,
            from = %resolved.from,
            to = %resolved.to,
            status = %status,
            "Friend request resolved"
        );
        Ok(resolved)
    }

    pub async fn cancel_request(&self, from: UserId, to: UserId) -> AppResult<()> {
        if !self.ledger.delete_pending_request(from, to).await? {
            return Err(AppError::NotFound("No pending request to cancel".to_string()));
        }
        tracing::info!(%from, %to, "Friend request cancelled");
        Ok(())
    }

    /// Removes the friendship in both directions; removing a non-friend succeeds
    pub async fn remove_friend(&self, user: UserId, friend: UserId) -> AppResult<()> {
        self.directory.remove_friend_edge(user, friend).await?;
        tracing::info!(%user, %friend, "Friend removed");
        Ok(())
    }

    /// Pending requests addressed to `user`, with the sender's profile
    pub async fn incoming_requests(&self, user: UserId) -> AppResult<Vec<FriendRequestWithUser>> {
        let requests = self.ledger.pending_requests_to(user).await?;
        self.with_profiles(requests, |r| r.from).await
    }

    /// Pending requests sent by `user`, with the recipient's profile
    pub async fn outgoing_requests(&self, user: UserId) -> AppResult<Vec<FriendRequestWithUser>> {
        let requests = self.ledger.pending_requests_from(user).await?;
        self.with_profiles(requests, |r| r.to).await
    }

    async fn with_profiles(
        &self,
        requests: Vec<FriendRequest>,
        counterpart: impl Fn(&FriendRequest) -> UserId,
    ) -> AppResult<Vec<FriendRequestWithUser>> {
        let ids: Vec<UserId> = requests.iter().map(&counterpart).collect();
        let profiles: HashMap<UserId, _> = self
            .directory
            .profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // Requests from deleted accounts are dropped
        Ok(requests
            .into_iter()
            .filter_map(|request| {
                let user = profiles.get(&counterpart(&request))?.clone();
                Some(FriendRequestWithUser { request, user })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::User,
        services::users::tests::{registration, service as user_service},
    };

    struct Fixture {
        friends: FriendService,
        users: UserService,
        alice: User,
        bob: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let users = user_service(store.clone());
        let friends = FriendService::new(store, users.clone());
        let alice = users.register(registration("alice")).await.unwrap().user;
        let bob = users.register(registration("bob")).await.unwrap().user;
        Fixture {
            friends,
            users,
            alice,
            bob,
        }
    }

    fn ids(profiles: &[crate::models::PublicProfile]) -> Vec<UserId> {
        profiles.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_accept_makes_friendship_symmetric() {
        let f = fixture().await;
        let request = f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();

        let incoming = f.friends.incoming_requests(f.bob.id).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].user.id, f.alice.id);
        assert_eq!(incoming[0].user.username, "alice");

        f.friends.accept_request(request.id, f.bob.id).await.unwrap();

        assert_eq!(ids(&f.users.list_friends(f.alice.id).await.unwrap()), vec![f.bob.id]);
        assert_eq!(ids(&f.users.list_friends(f.bob.id).await.unwrap()), vec![f.alice.id]);
        assert!(f.friends.incoming_requests(f.bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_pending_request_conflicts() {
        let f = fixture().await;
        f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();

        let err = f.friends.send_request(f.alice.id, f.bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_sends_yield_exactly_one_conflict() {
        let f = fixture().await;
        let (first, second) = tokio::join!(
            f.friends.send_request(f.alice.id, f.bob.id),
            f.friends.send_request(f.alice.id, f.bob.id)
        );

        let conflicts = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert!(first.is_ok() || second.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_allows_resend() {
        let f = fixture().await;
        f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();
        f.friends.cancel_request(f.alice.id, f.bob.id).await.unwrap();

        assert!(f.friends.incoming_requests(f.bob.id).await.unwrap().is_empty());
        assert!(f.friends.send_request(f.alice.id, f.bob.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_without_pending_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.friends.cancel_request(f.alice.id, f.bob.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_self_request_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.friends.send_request(f.alice.id, f.alice.id).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_request_to_unknown_user_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.friends.send_request(f.alice.id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_request_between_friends_conflicts() {
        let f = fixture().await;
        let request = f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();
        f.friends.accept_request(request.id, f.bob.id).await.unwrap();

        assert!(matches!(
            f.friends.send_request(f.bob.id, f.alice.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_only_recipient_may_answer() {
        let f = fixture().await;
        let request = f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();

        assert!(matches!(
            f.friends.accept_request(request.id, f.alice.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.friends.reject_request(request.id, f.alice.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(!f.users.are_friends(f.alice.id, f.bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reject_is_terminal_and_adds_no_edge() {
        let f = fixture().await;
        let request = f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();

        let rejected = f.friends.reject_request(request.id, f.bob.id).await.unwrap();
        assert_eq!(rejected.status, FriendRequestStatus::Rejected);
        assert!(!f.users.are_friends(f.alice.id, f.bob.id).await.unwrap());

        assert!(matches!(
            f.friends.accept_request(request.id, f.bob.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_request_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.friends.accept_request(Uuid::new_v4(), f.bob.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_friend_is_idempotent() {
        let f = fixture().await;
        let request = f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();
        f.friends.accept_request(request.id, f.bob.id).await.unwrap();

        f.friends.remove_friend(f.alice.id, f.bob.id).await.unwrap();
        f.friends.remove_friend(f.alice.id, f.bob.id).await.unwrap();

        assert!(f.users.list_friends(f.alice.id).await.unwrap().is_empty());
        assert!(f.users.list_friends(f.bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outgoing_requests_show_recipient() {
        let f = fixture().await;
        f.friends.send_request(f.alice.id, f.bob.id).await.unwrap();

        let outgoing = f.friends.outgoing_requests(f.alice.id).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].user.id, f.bob.id);
    }
}
