use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::{extract::Path, AppState},
    error::AppResult,
    middleware::AuthUser,
};

pub async fn incoming(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let recommendations = state.recommendations.incoming(caller.id).await?;
    Ok(Json(json!({ "recommendations": recommendations })))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.recommendations.mark_read(id, caller.id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.recommendations.delete(id, caller.id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn purge_read(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let deleted = state.recommendations.purge_read(caller.id).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
