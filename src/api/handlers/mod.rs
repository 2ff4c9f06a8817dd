//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: they decode the request, call one service method and
//! shape the JSON body. Authorization lives in the services.

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod auth;
pub mod catalog;
pub mod friends;
pub mod messages;
pub mod recommendations;
pub mod users;
pub mod watchlist;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Parses a required id from a JSON body field
pub(crate) fn required_id(value: Option<&str>, field: &str) -> AppResult<Uuid> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", field)))?;
    Uuid::parse_str(value).map_err(|_| AppError::InvalidInput(format!("{} is not a valid id", field)))
}
