//! HTTP Basic authentication layer.
//!
//! Installed by [`build_app_router`](crate::router::build_app_router) only
//! when both a username and a password are configured.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::config::BasicAuthCredentials;
use crate::error::{AppError, AppResult};

/// Reject the request with 401 unless it carries exactly `expected`.
///
/// ```ignore
/// router.layer(axum::middleware::from_fn_with_state(Arc::new(creds), require_basic_auth))
/// ```
pub async fn require_basic_auth(
    State(expected): State<Arc<BasicAuthCredentials>>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let provided = decode_basic_auth(header).ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization format. Expected: Basic <credentials>".into())
    })?;

    if !credentials_match(&provided, &expected) {
        tracing::warn!(
            username = %provided.username,
            path = %request.uri().path(),
            "Rejected request with invalid credentials",
        );
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    Ok(next.run(request).await)
}

/// Parse an `Authorization: Basic <base64(user:password)>` header value.
pub fn decode_basic_auth(header: &str) -> Option<BasicAuthCredentials> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    // Passwords may contain ':'; usernames may not.
    let (username, password) = decoded.split_once(':')?;

    Some(BasicAuthCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn credentials_match(provided: &BasicAuthCredentials, expected: &BasicAuthCredentials) -> bool {
    let username = provided
        .username
        .as_bytes()
        .ct_eq(expected.username.as_bytes());
    let password = provided
        .password
        .as_bytes()
        .ct_eq(expected.password.as_bytes());
    (username & password).into()
}
