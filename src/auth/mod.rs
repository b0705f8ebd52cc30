use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::Role;

/// Token payload. Field names are part of the wire contract with existing clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub tipo: Role,
    pub nome: String,
    #[serde(rename = "fotoPerfil")]
    pub foto_perfil: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: i64, tipo: Role, nome: String, foto_perfil: Option<String>, expiry_secs: i64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::seconds(expiry_secs)).timestamp();

        Self {
            id,
            tipo,
            nome,
            foto_perfil,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::new(Algorithm::HS256);

    encode(&header, claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry (no leeway) and return the claims
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
}

pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    })
    .await?
}

/// False for a wrong password or an unparseable stored hash
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    let verified = tokio::task::spawn_blocking(move || {
        PasswordHash::new(&hash)
            .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    })
    .await?;
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips_claims() {
        let claims = Claims::new(7, Role::Nutritionist, "Ana".into(), None, 3600);
        let token = generate_jwt(&claims, SECRET).unwrap();
        let decoded = decode_jwt(&token, SECRET).unwrap();
        assert_eq!(decoded.id, 7);
        assert_eq!(decoded.tipo, Role::Nutritionist);
        assert_eq!(decoded.nome, "Ana");
    }

    #[test]
    fn claims_use_wire_names() {
        let claims = Claims::new(1, Role::Member, "Bia".into(), Some("http://img".into()), 60);
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["tipo"], "membro");
        assert_eq!(value["fotoPerfil"], "http://img");
    }

    #[test]
    fn expired_token_reports_expired_signature() {
        let claims = Claims::new(1, Role::Member, "Bia".into(), None, -120);
        let token = generate_jwt(&claims, SECRET).unwrap();
        let err = decode_jwt(&token, SECRET).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(1, Role::Member, "Bia".into(), None, 60);
        let token = generate_jwt(&claims, SECRET).unwrap();
        let err = decode_jwt(&token, "other").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let claims = Claims::new(1, Role::Member, "Bia".into(), None, 60);
        assert!(matches!(generate_jwt(&claims, ""), Err(JwtError::InvalidSecret)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("s3nha".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3nha".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("errada".to_string(), hash).await.unwrap());
        assert!(!verify_password("x".to_string(), "not-a-hash".to_string()).await.unwrap());
    }
}
