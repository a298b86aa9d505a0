// src/services/auth.rs
//
// O login acontece no provedor de identidade; aqui só validamos o JWT que ele emite.

use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{common::error::AppError, models::auth::Claims};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
use {
    chrono::Utc,
    jsonwebtoken::{EncodingKey, Header, encode},
    uuid::Uuid,
};

#[cfg(test)]
impl AuthService {
    /// Emite um token como o provedor de identidade faria.
    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
