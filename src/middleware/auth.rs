// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Sessions are issued by the external identity provider as HS256 tokens
//! whose subject is the diner's email address.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie carrying the JWT.
pub const SESSION_COOKIE: &str = "menu_rewards_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (diner email)
    pub sub: String,
    /// Display name supplied by the identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated diner extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Lowercased email
    pub email: String,
    pub display_name: Option<String>,
}

/// Identity for routes where signing in is optional.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Cookie first, then `Authorization: Bearer`.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn verify_token(token: &str, signing_key: &[u8]) -> Result<AuthUser, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    let email = token_data.claims.sub.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidToken);
    }

    Ok(AuthUser {
        email,
        display_name: token_data.claims.name,
    })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers()).ok_or(AppError::Unauthorized)?;
    let auth_user = verify_token(&token, &state.config.jwt_signing_key)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Middleware that attaches the diner when a valid token is present.
///
/// Missing or invalid tokens are treated as anonymous, never rejected.
pub async fn attach_optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = extract_token(&jar, request.headers())
        .and_then(|token| verify_token(&token, &state.config.jwt_signing_key).ok());
    request.extensions_mut().insert(MaybeAuthUser(user));

    next.run(request).await
}

/// Create a JWT for a diner session.
pub fn create_jwt(
    email: &str,
    display_name: Option<&str>,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: email.to_string(),
        name: display_name.map(str::to_string),
        iat: now,
        exp: now + 30 * 24 * 60 * 60, // 30 days
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

    #[test]
    fn test_token_roundtrip_normalizes_email() {
        let token = create_jwt("Ana@Example.com", Some("Ana"), KEY).unwrap();
        let user = verify_token(&token, KEY).unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.display_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt("ana@example.com", None, KEY).unwrap();
        assert!(matches!(
            verify_token(&token, b"another_key_of_sufficient_len!!"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_subject_must_be_email() {
        let token = create_jwt("12345", None, KEY).unwrap();
        assert!(matches!(verify_token(&token, KEY), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_cookie_preferred_over_header() {
        use axum_extra::extract::cookie::Cookie;

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());

        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-cookie"));
        assert_eq!(
            extract_token(&CookieJar::new(), &headers).as_deref(),
            Some("from-header")
        );
        assert_eq!(extract_token(&CookieJar::new(), &HeaderMap::new()), None);
    }
}
