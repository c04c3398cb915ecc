//! Request identity attachment
//!
//! Every request goes through [`attach_identity`], which decodes the access
//! token when one is present and stores the claims in the request
//! extensions. Protected routes additionally layer [`require_identity`],
//! which turns a missing identity into a 403. Public and protected
//! endpoints therefore share a single decoding path.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::CoreError;
use crate::state::AppState;

use super::models::AccessClaims;

/// Cookie fallback for clients that cannot set headers.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Header carrying the refresh token on refresh and logout requests.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh";

/// Pull the raw access token from a request: `Authorization` header first
/// (with an optional `Bearer ` prefix), then the access-token cookie.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    cookie_value(headers, ACCESS_TOKEN_COOKIE)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(|v| v.to_string());
        }
    }
    None
}

/// Decode the access token, if any, and attach the claims to the request.
/// Never rejects: an absent or undecodable token just means no identity.
pub async fn attach_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_access_token(request.headers()) {
        if let Some(claims) = state.auth.authenticate(&token) {
            request.extensions_mut().insert(claims);
        }
    }

    next.run(request).await
}

/// Gate for protected routes: forbid the request unless
/// [`attach_identity`] put identity claims on it.
pub async fn require_identity(request: Request, next: Next) -> Result<Response, CoreError> {
    if request.extensions().get::<AccessClaims>().is_none() {
        return Err(CoreError::Forbidden);
    }

    Ok(next.run(request).await)
}
