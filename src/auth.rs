use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    models::{ApiMessage, Role},
    repository::RepositoryState,
};

/// Issued tokens stay valid for 30 days.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Claims
///
/// Represents the payload structure embedded in every bearer token issued by this
/// service. These claims are signed with the process-wide secret and validated on
/// every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the user. This is the key used to resolve
    /// the user's record and role from the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the token was issued.
    pub iat: usize,
}

/// issue_token
///
/// Produces a signed HS256 token embedding the user identifier, expiring
/// `TOKEN_TTL_DAYS` from issuance. Used by both registration (token for the new
/// user) and login (token for the authenticated user).
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// AuthError
///
/// Every way an authenticated request can be rejected, each carrying its exact
/// status/message pair. Note the asymmetry: an absent token is 403 while a
/// present-but-invalid token is 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Missing Authorization header or missing "Bearer " prefix.
    NoToken,
    /// Token present but failed signature, expiry, or shape checks.
    TokenInvalid,
    /// Token decoded but its subject no longer resolves to a stored user.
    UserNotFound,
    /// Authenticated, but the resolved role is not admin.
    NotAdmin,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NoToken => StatusCode::FORBIDDEN,
            AuthError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::FORBIDDEN,
            AuthError::NotAdmin => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::NoToken => "Not authorized, no token",
            AuthError::TokenInvalid => "Not authorized, token failed",
            AuthError::UserNotFound => "Not authorized, user not found",
            AuthError::NotAdmin => "Not authorized as an admin",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiMessage::new(self.message()))).into_response()
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the stored user record
/// minus the password hash. Handlers use this struct to read the caller's id
/// and to perform the admin gate check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// require_admin
    ///
    /// The second, composable authorization step. Only meaningful after the
    /// extractor has already resolved a user; a non-admin role is rejected with
    /// the dedicated 403 message.
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::NotAdmin)
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. This cleanly separates authentication
/// (extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Token Extraction: Authorization header with the "Bearer " prefix.
/// 3. Token Validation: HS256 decode with expiry checking.
/// 4. DB Lookup: the subject must still resolve to a stored user.
///
/// Rejection: `AuthError`, rendered as its status/message pair.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Token Extraction: an absent header (or one without the Bearer scheme)
        // is the "no token" case, not the "bad token" case.
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::NoToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::NoToken)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        // Bad signature, expired, and malformed tokens all collapse into the
        // same 401 rejection.
        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|_| {
                tracing::debug!("bearer token failed validation");
                AuthError::TokenInvalid
            })?;

        // Final Verification: the token may be valid while the user is gone.
        let user = repo
            .find_user_by_id(token_data.claims.sub)
            .await
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-12345";

    #[test]
    fn token_round_trips_to_the_same_subject() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, SECRET).unwrap();
        assert!(!token.is_empty());

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user_id);
        assert!(decoded.claims.exp > decoded.claims.iat);
    }

    #[test]
    fn token_expiry_is_thirty_days_out() {
        let token = issue_token(Uuid::new_v4(), SECRET).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        let ttl = decoded.claims.exp - decoded.claims.iat;
        assert_eq!(ttl as i64, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn token_signed_with_a_different_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), SECRET).unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"some-other-secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - Duration::days(2)).timestamp() as usize,
            exp: (now - Duration::days(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn auth_error_mapping_preserves_the_status_asymmetry() {
        assert_eq!(AuthError::NoToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::TokenInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UserNotFound.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::NotAdmin.status(), StatusCode::FORBIDDEN);
    }
}
