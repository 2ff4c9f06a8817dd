use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied id that is propagated as-is
const MAX_CLIENT_ID_LEN: usize = 64;

/// Correlation id of the current request, stored in request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuses the caller's `x-request-id` when it is short and printable,
    /// so ids from an upstream proxy stay stable across hops
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_CLIENT_ID_LEN
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            })
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tags the request with a [`RequestId`] and echoes it in the response headers
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Span for `TraceLayer`, carrying the request id set by [`request_id_middleware`]
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::as_str)
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_client_id_is_reused() {
        let id = RequestId::from_headers(&headers("edge-7f3a.42"));
        assert_eq!(id.as_str(), "edge-7f3a.42");
    }

    #[test]
    fn test_unsafe_or_long_id_is_replaced() {
        let spaced = RequestId::from_headers(&headers("a b"));
        assert_ne!(spaced.as_str(), "a b");
        assert!(Uuid::parse_str(spaced.as_str()).is_ok());

        let long = "x".repeat(MAX_CLIENT_ID_LEN + 1);
        assert_ne!(RequestId::from_headers(&headers(&long)).as_str(), long);
    }

    #[test]
    fn test_missing_header_generates_uuid() {
        let id = RequestId::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
