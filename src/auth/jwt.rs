//! JWT issuing and verification using HS256.

use crate::AuthConfig;
use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner id used for every request in no-auth mode
pub const ANONYMOUS_USER_ID: Uuid = Uuid::nil();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User UUID
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn anonymous() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: ANONYMOUS_USER_ID.to_string(),
            email: "anonymous@local".to_string(),
            iat: now,
            exp: i64::MAX,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

/// Signing keys and policy derived from the `auth` config section
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_secs: u64,
    allowed_email_domain: Option<String>,
}

impl JwtAuth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_secs: config.jwt_expiry_secs,
            allowed_email_domain: config.allowed_email_domain.clone(),
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.expiry_secs as i64,
        };
        encode(&Header::default(), &claims, &self.encoding).context("Failed to encode JWT")
    }

    /// Signature and expiry check
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .context("Failed to decode JWT")?;
        Ok(data.claims)
    }

    pub fn email_allowed(&self, email: &str) -> bool {
        match &self.allowed_email_domain {
            Some(domain) => email.ends_with(&format!("@{}", domain)),
            None => true,
        }
    }
}
