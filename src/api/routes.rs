use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, AppState};
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router: `/health` at the root, everything else under `/api`
pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

fn api_routes() -> Router<Arc<AppState>> {
    use handlers::{auth, catalog, friends, messages, recommendations, users, watchlist};

    Router::new()
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/profile", get(auth::get_profile).put(auth::update_profile))
        .route("/users/search", get(users::search))
        .route("/users/:id", get(users::get_user))
        // Friend ledger
        .route("/friends", get(friends::list_friends))
        .route("/friends/request", post(friends::send_request))
        .route("/friends/accept", post(friends::accept_request))
        .route("/friends/reject", post(friends::reject_request))
        .route("/friends/cancel-request", post(friends::cancel_request))
        .route("/friends/requests", get(friends::incoming_requests))
        .route("/friends/requests/sent", get(friends::outgoing_requests))
        .route("/friends/:friend_id", delete(friends::remove_friend))
        .route("/friends/:friend_id/media", get(friends::friend_media))
        .route("/friends/:friend_id/recommend", post(friends::recommend))
        // Recommendation mailbox
        .route("/recommendations/incoming", get(recommendations::incoming))
        .route("/recommendations/read", delete(recommendations::purge_read))
        .route("/recommendations/:id", delete(recommendations::delete))
        .route("/recommendations/:id/read", post(recommendations::mark_read))
        // Watch list
        .route("/save-show", post(watchlist::save_show))
        .route("/saved-shows", get(watchlist::saved_shows))
        .route("/delete-show", delete(watchlist::delete_show))
        .route("/save-movie", post(watchlist::save_movie))
        .route("/saved-movies", get(watchlist::saved_movies))
        .route("/delete-movie", delete(watchlist::delete_movie))
        // Messages
        .route("/messages", post(messages::send))
        .route("/messages/:friend_id", get(messages::conversation))
        // Catalog
        .route("/catalog/shows", get(catalog::shows))
        .route("/catalog/movies", get(catalog::movies))
        .route("/catalog/cache/invalidate", post(catalog::invalidate_cache))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
