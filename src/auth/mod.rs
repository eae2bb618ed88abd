use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Role allowed to mutate villas and villa numbers
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Issues and validates bearer tokens and hashes passwords
#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    expiry: Duration,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry: Duration::hours(i64::try_from(expiry_hours).unwrap_or(i64::MAX / 3600)),
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    /// Lower the bcrypt work factor. Tests use the minimum to stay fast.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(password, self.hash_cost)?)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Sign a token carrying the user name and role
    pub fn issue(&self, name: &str, role: &str) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let now = Utc::now();
        let claims = Claims {
            name: name.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-secret", 168).with_hash_cost(4)
    }

    #[test]
    fn test_password_hashing() {
        let auth = service();
        let hash = auth.hash_password("Pa$$w0rd").unwrap();
        assert_ne!(hash, "Pa$$w0rd");
        assert!(auth.verify_password("Pa$$w0rd", &hash).unwrap());
        assert!(!auth.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_token_carries_name_role_and_week_expiry() {
        let auth = service();
        let token = auth.issue("alice", "admin").unwrap();
        let claims = auth.verify(&token).unwrap();

        assert_eq!(claims.name, "alice");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_rejects_foreign_and_garbage_tokens() {
        let token = AuthService::new("other-secret", 1).issue("bob", "customer").unwrap();
        assert!(matches!(service().verify(&token), Err(AuthError::InvalidToken(_))));
        assert!(service().verify("not.a.token").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            name: "carol".to_string(),
            role: "admin".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn test_empty_secret_is_an_error() {
        let auth = AuthService::new("", 1);
        assert!(matches!(auth.issue("dave", "admin"), Err(AuthError::MissingSecret)));
    }
}
