use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::{
        extract::{Path, Query},
        AppState,
    },
    error::AppResult,
    models::UserId,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Value>> {
    let users = state.users.search(&params.query).await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Value>> {
    let user = state.users.public_profile(id).await?;
    Ok(Json(json!({ "user": user })))
}
