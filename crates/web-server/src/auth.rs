//! Session guard shared by every reseller endpoint.
//!
//! Sessions are issued elsewhere as HS256-signed tokens. They arrive in the
//! session cookie or, for API clients, as a bearer token.

use crate::error::AppError;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use configuration::AuthSettings;
use core_types::Role;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl SessionVerifier {
    pub fn new(secret: &[u8], cookie_name: impl Into<String>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(settings.session_secret.as_bytes(), settings.cookie_name.clone())
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Checks signature and expiry and resolves the caller.
    pub fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::warn!(error = %e, "Session token rejected.");
            AppError::Unauthorized
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| {
            tracing::warn!(sub = %data.claims.sub, "Session subject is not a user id.");
            AppError::Unauthorized
        })?;

        Ok(Principal {
            user_id,
            role: data.claims.role,
        })
    }

    fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(&self.cookie_name) {
            return Some(cookie.value().to_string());
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    }
}

/// Resolves the caller and requires the reseller role.
///
/// Runs before any handler touches the repository.
pub fn require_reseller(headers: &HeaderMap, verifier: &SessionVerifier) -> Result<Principal, AppError> {
    let token = verifier.token_from(headers).ok_or(AppError::Unauthorized)?;
    let principal = verifier.verify(&token)?;

    if !principal.role.is_reseller() {
        tracing::warn!(user_id = %principal.user_id, role = ?principal.role, "Non-reseller session rejected.");
        return Err(AppError::Unauthorized);
    }
    Ok(principal)
}
