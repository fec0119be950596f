// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::AuthConfig;
use crate::error::AppError;

/// Bearer-token claims: the account plus its currently active persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub profile_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material for issuing and verifying bearer tokens.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl AuthKeys {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    /// Issue a token bound to `(account, active profile)`.
    pub fn issue(&self, user_id: Uuid, profile_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            profile_id,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Authenticated caller identity, extracted from the Authorization header.
/// The core trusts the verified claims as-is.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub profile_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;
        let claims = state.auth.verify(token)?;
        Ok(AuthUser {
            user_id: claims.sub,
            profile_id: claims.profile_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AuthKeys {
        AuthKeys::from_config(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
        })
    }

    #[test]
    fn issued_tokens_round_trip() {
        let keys = keys();
        let user = Uuid::new_v4();
        let profile = Uuid::new_v4();

        let token = keys.issue(user, profile).expect("token");
        let claims = keys.verify(&token).expect("claims");

        assert_eq!(claims.sub, user);
        assert_eq!(claims.profile_id, profile);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4(), Uuid::new_v4()).expect("token");
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(keys.verify(&tampered).is_err());
    }
}
