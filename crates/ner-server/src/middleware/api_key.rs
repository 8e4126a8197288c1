//! API-key verification middleware.
//!
//! The credential may arrive in the `X-API-Key` header, a query parameter
//! of the same name, or a cookie; the first non-empty source wins, in that
//! order. Verification is a single string comparison against the
//! configured secret. No rate limiting, no lockout.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Name used for the header, query parameter and cookie.
pub const API_KEY_NAME: &str = "X-API-Key";

/// Reject requests on the protected subtree without a valid API key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let security = &state.settings.security;
    if !security.api_key_enabled {
        return Ok(next.run(request).await);
    }

    let candidate = header_key(request.headers())
        .or_else(|| query_key(request.uri()))
        .or_else(|| cookie_key(request.headers()));

    match candidate {
        None => Err(ApiError::MissingApiKey),
        Some(key) if key == security.api_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Invalid API key attempt");
            Err(ApiError::InvalidApiKey)
        }
    }
}

fn header_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn query_key(uri: &Uri) -> Option<String> {
    uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == API_KEY_NAME && !value.is_empty()).then(|| value.to_string())
    })
}

fn cookie_key(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key == API_KEY_NAME && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_key_trims_and_rejects_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_NAME, HeaderValue::from_static("  secret  "));
        assert_eq!(header_key(&headers), Some("secret".to_string()));

        headers.insert(API_KEY_NAME, HeaderValue::from_static(""));
        assert_eq!(header_key(&headers), None);
    }

    #[test]
    fn test_query_key_finds_named_parameter() {
        let uri: Uri = "/api/v1/health?foo=bar&X-API-Key=secret".parse().unwrap();
        assert_eq!(query_key(&uri), Some("secret".to_string()));

        let uri: Uri = "/api/v1/health?foo=bar".parse().unwrap();
        assert_eq!(query_key(&uri), None);
    }

    #[test]
    fn test_cookie_key_parses_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=abc; X-API-Key=secret"),
        );
        assert_eq!(cookie_key(&headers), Some("secret".to_string()));
    }
}
