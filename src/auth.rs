// ABOUTME: JWT authentication for coach API requests using HS256 signed tokens
// ABOUTME: Validates bearer tokens and yields the authenticated principal for handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Authentication
//!
//! Every coach route authenticates per-request from the `Authorization`
//! header. The principal is an explicit value passed into handlers, never
//! ambient request state.

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Default token lifetime
const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    /// Authenticated user ID
    pub user_id: String,
}

/// JWT token manager
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create an authentication manager from the shared signing secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry_hours: DEFAULT_TOKEN_EXPIRY_HOURS,
        }
    }

    /// Generate a JWT token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_expiry_hours)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")).with_source(e))
    }

    /// Validate a JWT token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an auth error if the token is malformed, expired, or carries
    /// an invalid signature.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::auth_invalid(format!("Invalid token: {e}")))
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns 401-mapped errors when the `Authorization` header is missing,
    /// not a bearer token, or fails validation.
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthenticatedPrincipal> {
        let auth_header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must be a bearer token"))?;

        let claims = self.validate_token(token)?;
        Ok(AuthenticatedPrincipal {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn manager() -> AuthManager {
        AuthManager::new("test-secret-that-is-long-enough")
    }

    #[test]
    fn test_token_round_trip() {
        let auth = manager();
        let token = auth.generate_token("user-123").unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = manager().generate_token("user-123").unwrap();
        let other = AuthManager::new("a-completely-different-secret");
        let err = other.validate_token(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
    }

    #[test]
    fn test_authenticate_from_headers() {
        let auth = manager();
        let token = auth.generate_token("user-123").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {token}").parse().unwrap());
        let principal = auth.authenticate(&headers).unwrap();
        assert_eq!(principal.user_id, "user-123");
    }

    #[test]
    fn test_missing_header_is_auth_required() {
        let err = manager().authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[test]
    fn test_non_bearer_header_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        let err = manager().authenticate(&headers).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
    }
}
