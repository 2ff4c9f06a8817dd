use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::required_id;
use crate::{
    api::{
        extract::{JsonBody, Path},
        AppState,
    },
    error::AppResult,
    middleware::AuthUser,
    models::UserId,
};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to: Option<String>,
    #[serde(default)]
    pub text: String,
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<SendMessageRequest>,
) -> AppResult<Json<Value>> {
    let to = required_id(body.to.as_deref(), "to")?;
    let message = state.messages.send(caller.id, to, &body.text).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn conversation(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(friend_id): Path<UserId>,
) -> AppResult<Json<Value>> {
    let messages = state.messages.conversation(caller.id, friend_id).await?;
    Ok(Json(json!({ "messages": messages })))
}
