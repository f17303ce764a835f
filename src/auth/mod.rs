pub mod credentials;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use credentials::{CredentialStore, Identity, StaticCredentialStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub identity: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// Issues and verifies HS256 bearer tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    /// Issues a token as if it were created at `iat` (unix seconds)
    pub fn issue_at(&self, identity: &Identity, iat: i64) -> Result<String, AuthError> {
        let claims = Claims {
            identity: identity.username.clone(),
            role: identity.role.clone(),
            iat,
            exp: iat + self.expiry.num_seconds(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity { username: "admin".to_string(), role: "admin".to_string() }
    }

    #[test]
    fn issued_tokens_verify() {
        let tokens = TokenService::new("test-secret", 1);
        let token = tokens.issue(&admin()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.identity, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = TokenService::new("test-secret", 1);
        let two_hours_ago = Utc::now().timestamp() - 7200;
        let token = tokens.issue_at(&admin(), two_hours_ago).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = TokenService::new("secret-alpha", 1).issue(&admin()).unwrap();
        let result = TokenService::new("secret-bravo", 1).verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = TokenService::new("test-secret", 1);
        assert!(matches!(tokens.verify("not.a.token"), Err(AuthError::InvalidToken)));
    }
}
