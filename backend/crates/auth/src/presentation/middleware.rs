//! Auth Middleware
//!
//! Bearer access-token check for protected routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::domain::repository::UserStore;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Token from `Authorization: Bearer <token>`, if any
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that requires a valid access token.
///
/// On success the verified [`AccessClaims`](crate::application::AccessClaims)
/// are stored in the request extensions for the handler.
pub async fn require_access_token<S>(
    State(state): State<AuthAppState<S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    S: UserStore + Sync + 'static,
{
    let Some(token) = extract_bearer(req.headers()) else {
        return AuthError::TokenMissing.into_response();
    };

    match state.service.authenticate(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);
    }
}
