use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    auth::{CredentialHasher, TokenService},
    clock::Clock,
    db::{
        FriendRepository, MessageRepository, RecommendationRepository, UserRepository,
        WatchlistRepository,
    },
    services::{
        CatalogGateway, CatalogProvider, FriendService, MessageService, RecommendationService,
        RecommendationSweeper, UserService, WatchlistService,
    },
};

/// Shared application state: one handle per domain service
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub friends: FriendService,
    pub recommendations: RecommendationService,
    pub watchlist: WatchlistService,
    pub messages: MessageService,
    pub catalog: CatalogGateway,
    pub tokens: TokenService,
}

/// Storage handles the services are built from; Postgres and the in-memory
/// store both provide every one of them
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub friends: Arc<dyn FriendRepository>,
    pub recommendations: Arc<dyn RecommendationRepository>,
    pub watchlist: Arc<dyn WatchlistRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    /// Uses one store for every repository
    pub fn from_store<T>(store: Arc<T>) -> Self
    where
        T: UserRepository
            + FriendRepository
            + RecommendationRepository
            + WatchlistRepository
            + MessageRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            friends: store.clone(),
            recommendations: store.clone(),
            watchlist: store.clone(),
            messages: store,
        }
    }
}

impl AppState {
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenService,
        shows: Arc<dyn CatalogProvider>,
        movies: Arc<dyn CatalogProvider>,
    ) -> Self {
        let users = UserService::new(repos.users, repos.friends.clone(), hasher, tokens.clone());

        Self {
            friends: FriendService::new(repos.friends, users.clone()),
            recommendations: RecommendationService::new(repos.recommendations, users.clone()),
            watchlist: WatchlistService::new(repos.watchlist, users.clone()),
            messages: MessageService::new(repos.messages, users.clone()),
            catalog: CatalogGateway::new(shows, movies),
            users,
            tokens,
        }
    }

    /// Sweeper over this state's recommendation mailbox
    pub fn sweeper(&self, clock: Arc<dyn Clock>, retention: chrono::Duration) -> RecommendationSweeper {
        RecommendationSweeper::new(self.recommendations.clone(), clock, retention)
    }
}

impl FromRef<Arc<AppState>> for TokenService {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.tokens.clone()
    }
}
