use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};

use crate::entities::token::Claims;
use crate::errors::AuthError;
use crate::settings::{AppConfig, JwtKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Verifies access tokens issued by the account service
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
        }
    }

    pub fn from_secret(secret: &str) -> Self {
        JwtService {
            keys: JwtKeys::from_secret(secret),
        }
    }

    pub fn create_jwt(
        &self,
        user_id: &str,
        username: &str,
        permissions: &[&str],
        lifetime: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: (now + lifetime).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|e| {
                tracing::warn!("Failed to create JWT: {}", e);
                AuthError::TokenCreation
            })
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}
