use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::UserId;

/// Lifetime of issued tokens
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: UserId,
    pub is_admin: bool,
    /// Authorization handlers granted to the user (e.g. "id_documents")
    #[serde(default)]
    pub authorizations: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

/// HS256 tokens bound to one issuer. The host platform mints them; the
/// server only verifies, except in tests.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    pub fn create_token(
        &self,
        user_id: UserId,
        is_admin: bool,
        authorizations: Vec<String>,
    ) -> Result<String> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            is_admin,
            authorizations,
            exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            iat: issued_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .with_context(|| format!("signing token for user {}", user_id))
    }

    /// Rejects expired tokens and tokens from another issuer.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_claims() {
        let service = JwtService::new("test_secret_key", "fictions".to_string());
        let token = service
            .create_token(UserId::new(42), true, vec!["id_documents".to_string()])
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, UserId::new(42));
        assert!(claims.is_admin);
        assert_eq!(claims.authorizations, vec!["id_documents".to_string()]);
        assert_eq!(claims.iss, "fictions");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_wrong_secret_or_issuer_fails() {
        let issuer = JwtService::new("secret1", "fictions".to_string());
        let token = issuer.create_token(UserId::new(1), false, vec![]).unwrap();

        assert!(JwtService::new("secret2", "fictions".to_string())
            .verify_token(&token)
            .is_err());
        assert!(JwtService::new("secret1", "elsewhere".to_string())
            .verify_token(&token)
            .is_err());
    }

    #[test]
    fn test_garbage_token() {
        let service = JwtService::new("secret", "fictions".to_string());
        assert!(service.verify_token("not-a-token").is_err());
    }
}
