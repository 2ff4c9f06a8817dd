use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::{extract::JsonBody, AppState},
    error::AppResult,
    middleware::AuthUser,
    models::{SaveMovieInput, SaveShowInput},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShowRequest {
    pub show_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMovieRequest {
    pub movie_id: Option<String>,
}

pub async fn save_show(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(input): JsonBody<SaveShowInput>,
) -> AppResult<Json<Value>> {
    let show = state.watchlist.save_show(caller.id, input).await?;
    Ok(Json(json!({ "message": "Show saved.", "show": show })))
}

pub async fn saved_shows(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let shows = state.watchlist.shows(caller.id).await?;
    Ok(Json(json!({ "shows": shows })))
}

pub async fn delete_show(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<DeleteShowRequest>,
) -> AppResult<Json<Value>> {
    state.watchlist.delete_show(caller.id, body.show_id).await?;
    Ok(Json(json!({ "message": "Show removed." })))
}

pub async fn save_movie(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(input): JsonBody<SaveMovieInput>,
) -> AppResult<Json<Value>> {
    let movie = state.watchlist.save_movie(caller.id, input).await?;
    Ok(Json(json!({ "message": "Movie saved.", "movie": movie })))
}

pub async fn saved_movies(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let movies = state.watchlist.movies(caller.id).await?;
    Ok(Json(json!({ "movies": movies })))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<DeleteMovieRequest>,
) -> AppResult<Json<Value>> {
    state.watchlist.delete_movie(caller.id, body.movie_id).await?;
    Ok(Json(json!({ "message": "Movie removed." })))
}
