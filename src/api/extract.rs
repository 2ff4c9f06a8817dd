//! Extractors that reject with [`AppError`], so malformed paths, queries and
//! bodies get the same `{"error": ...}` response as every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
