use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::{extract::Query, AppState},
    error::AppResult,
    middleware::AuthUser,
    models::{CatalogKind, CatalogPage, CatalogQuery},
};

pub async fn shows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogPage>> {
    Ok(Json(state.catalog.list(CatalogKind::Show, query).await?))
}

pub async fn movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogPage>> {
    Ok(Json(state.catalog.list(CatalogKind::Movie, query).await?))
}

pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    tracing::info!(user_id = %caller.id, "Catalog cache invalidation requested");
    state.catalog.invalidate().await?;
    Ok(Json(json!({ "success": true })))
}
