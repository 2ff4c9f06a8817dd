use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    db::WatchlistRepository,
    error::{AppError, AppResult},
    models::{SaveMovieInput, SaveShowInput, SavedMovie, SavedShow, UserId, WatchStatus},
    services::users::UserService,
};

/// A friend's saved titles
#[derive(Debug, Clone, Serialize)]
pub struct FriendMedia {
    pub shows: Vec<SavedShow>,
    pub movies: Vec<SavedMovie>,
}

/// Per-user saved shows and movies with progress
#[derive(Clone)]
pub struct WatchlistService {
    watchlist: Arc<dyn WatchlistRepository>,
    directory: UserService,
}

fn required_id(id: Option<String>, what: &str) -> AppResult<String> {
    id.map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", what)))
}

impl WatchlistService {
    pub fn new(watchlist: Arc<dyn WatchlistRepository>, directory: UserService) -> Self {
        Self {
            watchlist,
            directory,
        }
    }

    /// Saves or replaces the show for `user`
    pub async fn save_show(&self, user: UserId, input: SaveShowInput) -> AppResult<SavedShow> {
        let show_id = required_id(input.show_id, "showId")?;
        let status = WatchStatus::resolve(input.status, input.finished, input.watch_later);

        let show = self
            .watchlist
            .upsert_show(SavedShow {
                user_id: user,
                show_id,
                name: input.name,
                image: input.image,
                start_date: input.start_date,
                season: input.season,
                episode: input.episode,
                genres: input.genres,
                rating: input.rating,
                status,
                updated_at: Utc::now(),
            })
            .await?;

        tracing::debug!(%user, show_id = %show.show_id, "Show saved");
        Ok(show)
    }

    pub async fn shows(&self, user: UserId) -> AppResult<Vec<SavedShow>> {
        self.watchlist.shows_for(user).await
    }

    /// Removes a saved show; returns whether it was present
    pub async fn delete_show(&self, user: UserId, show_id: Option<String>) -> AppResult<bool> {
        let show_id = required_id(show_id, "showId")?;
        self.watchlist.delete_show(user, &show_id).await
    }

    /// Saves or replaces the movie for `user`, keeping its original save time
    pub async fn save_movie(&self, user: UserId, input: SaveMovieInput) -> AppResult<SavedMovie> {
        let movie_id = required_id(input.movie_id, "movieId")?;
        let now = Utc::now();

        let movie = self
            .watchlist
            .upsert_movie(SavedMovie {
                user_id: user,
                movie_id,
                name: input.name,
                image: input.image,
                release_date: input.release_date,
                genres: input.genres,
                rating: input.rating,
                status: input.status,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::debug!(%user, movie_id = %movie.movie_id, "Movie saved");
        Ok(movie)
    }

    pub async fn movies(&self, user: UserId) -> AppResult<Vec<SavedMovie>> {
        self.watchlist.movies_for(user).await
    }

    pub async fn delete_movie(&self, user: UserId, movie_id: Option<String>) -> AppResult<bool> {
        let movie_id = required_id(movie_id, "movieId")?;
        self.watchlist.delete_movie(user, &movie_id).await
    }

    /// Saved titles of `friend`, visible only to their friends
    pub async fn friend_media(&self, caller: UserId, friend: UserId) -> AppResult<FriendMedia> {
        if !self.directory.are_friends(caller, friend).await? {
            return Err(AppError::Forbidden(
                "You can only view your friends' lists".to_string(),
            ));
        }

        Ok(FriendMedia {
            shows: self.watchlist.shows_for(friend).await?,
            movies: self.watchlist.movies_for(friend).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        services::users::tests::{registration, service as user_service},
    };

    async fn setup() -> (WatchlistService, UserService) {
        let store = Arc::new(MemoryStore::new());
        let users = user_service(store.clone());
        (WatchlistService::new(store, users.clone()), users)
    }

    fn breaking_bad() -> SaveShowInput {
        SaveShowInput {
            show_id: Some("169".to_string()),
            name: Some("Breaking Bad".to_string()),
            season: Some("1".to_string()),
            episode: Some("1".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_show_upserts_progress() {
        let (watchlist, users) = setup().await;
        let alice = users.register(registration("alice")).await.unwrap().user;

        watchlist.save_show(alice.id, breaking_bad()).await.unwrap();
        let updated = watchlist
            .save_show(
                alice.id,
                SaveShowInput {
                    season: Some("2".to_string()),
                    episode: Some("5".to_string()),
                    watch_later: Some(true),
                    ..breaking_bad()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, Some(WatchStatus::WatchLater));

        let shows = watchlist.shows(alice.id).await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].season.as_deref(), Some("2"));
        assert_eq!(shows[0].episode.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_missing_ids_are_invalid() {
        let (watchlist, users) = setup().await;
        let alice = users.register(registration("alice")).await.unwrap().user;

        assert!(matches!(
            watchlist.save_show(alice.id, SaveShowInput::default()).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            watchlist.save_movie(alice.id, SaveMovieInput::default()).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            watchlist.delete_show(alice.id, Some(" ".to_string())).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            watchlist.delete_movie(alice.id, None).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_movie() {
        let (watchlist, users) = setup().await;
        let alice = users.register(registration("alice")).await.unwrap().user;

        watchlist
            .save_movie(
                alice.id,
                SaveMovieInput {
                    movie_id: Some("603".to_string()),
                    name: Some("The Matrix".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(watchlist
            .delete_movie(alice.id, Some("603".to_string()))
            .await
            .unwrap());
        assert!(watchlist.movies(alice.id).await.unwrap().is_empty());
        assert!(!watchlist
            .delete_movie(alice.id, Some("603".to_string()))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_friend_media_requires_friendship() {
        let (watchlist, users) = setup().await;
        let alice = users.register(registration("alice")).await.unwrap().user;
        let bob = users.register(registration("bob")).await.unwrap().user;
        watchlist.save_show(bob.id, breaking_bad()).await.unwrap();

        assert!(matches!(
            watchlist.friend_media(alice.id, bob.id).await,
            Err(AppError::Forbidden(_))
        ));

        users.add_friend_edge(alice.id, bob.id).await.unwrap();
        let media = watchlist.friend_media(alice.id, bob.id).await.unwrap();
        assert_eq!(media.shows.len(), 1);
        assert!(media.movies.is_empty());
    }
}
