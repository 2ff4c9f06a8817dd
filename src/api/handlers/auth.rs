use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api::{extract::JsonBody, AppState},
    error::AppResult,
    middleware::AuthUser,
    models::ProfileUpdate,
    services::{AuthSession, Registration},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    let session = state
        .users
        .register(Registration {
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
            username: body.username,
            avatar_url: body.avatar_url,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthSession>> {
    let session = state.users.login(&body.email, &body.password).await?;
    Ok(Json(session))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> AppResult<Json<Value>> {
    let user = state.users.profile(caller.id).await?;
    Ok(Json(json!({ "user": user })))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> AppResult<Json<Value>> {
    let user = state.users.update_profile(caller.id, update).await?;
    Ok(Json(json!({ "message": "Profile updated.", "user": user })))
}
