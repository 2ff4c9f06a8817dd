use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::{
    db::repository::WatchlistRepository,
    error::{AppError, AppResult},
    models::{SavedMovie, SavedShow, UserId, WatchStatus},
};

const SHOW_COLUMNS: &str =
    "user_id, show_id, name, image, start_date, season, episode, genres, rating, status, updated_at";

const MOVIE_COLUMNS: &str =
    "user_id, movie_id, name, image, release_date, genres, rating, status, created_at, updated_at";

fn parse_status(status: Option<String>) -> AppResult<Option<WatchStatus>> {
    status
        .map(|s| s.parse::<WatchStatus>().map_err(AppError::Internal))
        .transpose()
}

#[derive(sqlx::FromRow)]
struct ShowRow {
    user_id: Uuid,
    show_id: String,
    name: Option<String>,
    image: Option<serde_json::Value>,
    start_date: Option<String>,
    season: Option<String>,
    episode: Option<String>,
    genres: Vec<String>,
    rating: Option<serde_json::Value>,
    status: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShowRow> for SavedShow {
    type Error = AppError;

    fn try_from(row: ShowRow) -> Result<Self, Self::Error> {
        Ok(SavedShow {
            user_id: row.user_id,
            show_id: row.show_id,
            name: row.name,
            image: row.image,
            start_date: row.start_date,
            season: row.season,
            episode: row.episode,
            genres: row.genres,
            rating: row.rating,
            status: parse_status(row.status)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    user_id: Uuid,
    movie_id: String,
    name: Option<String>,
    image: Option<serde_json::Value>,
    release_date: Option<String>,
    genres: Vec<String>,
    rating: Option<serde_json::Value>,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MovieRow> for SavedMovie {
    type Error = AppError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        Ok(SavedMovie {
            user_id: row.user_id,
            movie_id: row.movie_id,
            name: row.name,
            image: row.image,
            release_date: row.release_date,
            genres: row.genres,
            rating: row.rating,
            status: parse_status(row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait::async_trait]
impl WatchlistRepository for PgStore {
    async fn upsert_show(&self, show: SavedShow) -> AppResult<SavedShow> {
        let row: ShowRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO saved_shows ({SHOW_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, show_id) DO UPDATE SET
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                start_date = EXCLUDED.start_date,
                season = EXCLUDED.season,
                episode = EXCLUDED.episode,
                genres = EXCLUDED.genres,
                rating = EXCLUDED.rating,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            RETURNING {SHOW_COLUMNS}
            "#
        ))
        .bind(show.user_id)
        .bind(&show.show_id)
        .bind(&show.name)
        .bind(&show.image)
        .bind(&show.start_date)
        .bind(&show.season)
        .bind(&show.episode)
        .bind(&show.genres)
        .bind(&show.rating)
        .bind(show.status.map(|s| s.as_str()))
        .bind(show.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn shows_for(&self, user: UserId) -> AppResult<Vec<SavedShow>> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM saved_shows WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SavedShow::try_from).collect()
    }

    async fn delete_show(&self, user: UserId, show_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM saved_shows WHERE user_id = $1 AND show_id = $2")
            .bind(user)
            .bind(show_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_movie(&self, movie: SavedMovie) -> AppResult<SavedMovie> {
        let row: MovieRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO saved_movies ({MOVIE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                release_date = EXCLUDED.release_date,
                genres = EXCLUDED.genres,
                rating = EXCLUDED.rating,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(movie.user_id)
        .bind(&movie.movie_id)
        .bind(&movie.name)
        .bind(&movie.image)
        .bind(&movie.release_date)
        .bind(&movie.genres)
        .bind(&movie.rating)
        .bind(movie.status.map(|s| s.as_str()))
        .bind(movie.created_at)
        .bind(movie.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn movies_for(&self, user: UserId) -> AppResult<Vec<SavedMovie>> {
        let rows: Vec<MovieRow> = sqlx::query_as(&format!(
            "SELECT {MOVIE_COLUMNS} FROM saved_movies WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SavedMovie::try_from).collect()
    }

    async fn delete_movie(&self, user: UserId, movie_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM saved_movies WHERE user_id = $1 AND movie_id = $2")
            .bind(user)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
