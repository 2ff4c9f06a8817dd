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
    models::{RecommendedItem, UserId},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUserRequest {
    pub to_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdBody {
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(flatten)]
    pub item: RecommendedItem,
    pub note: Option<String>,
}

pub async fn send_request(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<TargetUserRequest>,
) -> AppResult<Json<Value>> {
    let to = required_id(body.to_user_id.as_deref(), "toUserId")?;
    let request = state.friends.send_request(caller.id, to).await?;
    Ok(Json(json!({ "message": "Friend request sent.", "request": request })))
}

pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<RequestIdBody>,
) -> AppResult<Json<Value>> {
    let id = required_id(body.request_id.as_deref(), "requestId")?;
    state.friends.accept_request(id, caller.id).await?;
    Ok(Json(json!({ "message": "Friend request accepted." })))
}

pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<RequestIdBody>,
) -> AppResult<Json<Value>> {
    let id = required_id(body.request_id.as_deref(), "requestId")?;
    state.friends.reject_request(id, caller.id).await?;
    Ok(Json(json!({ "message": "Friend request rejected." })))
}

pub async fn cancel_request(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(body): JsonBody<TargetUserRequest>,
) -> AppResult<Json<Value>> {
    let to = required_id(body.to_user_id.as_deref(), "toUserId")?;
    state.friends.cancel_request(caller.id, to).await?;
    Ok(Json(json!({ "message": "Friend request cancelled." })))
}

pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(friend_id): Path<UserId>,
) -> AppResult<Json<Value>> {
    state.friends.remove_friend(caller.id, friend_id).await?;
    Ok(Json(json!({ "success": true, "message": "Friend removed." })))
}

pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let friends = state.users.list_friends(caller.id).await?;
    Ok(Json(json!({ "friends": friends })))
}

pub async fn incoming_requests(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let requests = state.friends.incoming_requests(caller.id).await?;
    Ok(Json(json!({ "requests": requests })))
}

pub async fn outgoing_requests(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let requests = state.friends.outgoing_requests(caller.id).await?;
    Ok(Json(json!({ "requests": requests })))
}

pub async fn friend_media(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(friend_id): Path<UserId>,
) -> AppResult<Json<Value>> {
    let media = state.watchlist.friend_media(caller.id, friend_id).await?;
    Ok(Json(json!({ "shows": media.shows, "movies": media.movies })))
}

pub async fn recommend(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(friend_id): Path<UserId>,
    JsonBody(body): JsonBody<RecommendRequest>,
) -> AppResult<Json<Value>> {
    let recommendation = state
        .recommendations
        .recommend(caller.id, friend_id, body.item, body.note)
        .await?;
    Ok(Json(json!({ "success": true, "recommendation": recommendation })))
}
