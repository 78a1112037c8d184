//! Bearer-token authentication.
//!
//! Supabase issues HS256 access tokens whose `sub` claim is the profile id
//! and whose audience is `authenticated`.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use verdant_core::error::DomainError;

use crate::error::ApiError;
use crate::state::AppState;

/// Audience carried by tokens of signed-in users.
pub const AUDIENCE: &str = "authenticated";

/// Claims read from an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Profile id.
    pub sub: Uuid,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
    /// Audience.
    pub aud: String,
}

/// Verifies access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Returns the user id of a valid token.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for a malformed, forged or expired
    /// token.
    pub fn verify(&self, token: &str) -> Result<Uuid, DomainError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                debug!(error = %e, "rejected access token");
                DomainError::Unauthorized("Token inválido o expirado".to_owned())
            })
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// Profile id of the caller.
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DomainError::Unauthorized("Se requiere autenticación".to_owned()))?;
        let user_id = state.tokens.verify(token)?;
        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, sub: Uuid, exp: usize, aud: &str) -> String {
        let claims = Claims {
            sub,
            exp,
            aud: aud.to_owned(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> usize {
        usize::try_from(chrono::Utc::now().timestamp() + 3600).unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        // Arrange
        let user_id = Uuid::new_v4();
        let verifier = TokenVerifier::new("secret");

        // Act
        let result = verifier.verify(&token("secret", user_id, in_one_hour(), AUDIENCE));

        // Assert
        assert_eq!(result.unwrap(), user_id);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let verifier = TokenVerifier::new("secret");

        let result = verifier.verify(&token("other", Uuid::new_v4(), in_one_hour(), AUDIENCE));

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = TokenVerifier::new("secret");

        let result = verifier.verify(&token("secret", Uuid::new_v4(), 1_000, AUDIENCE));

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let verifier = TokenVerifier::new("secret");

        let result = verifier.verify(&token("secret", Uuid::new_v4(), in_one_hour(), "anon"));

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }
}
