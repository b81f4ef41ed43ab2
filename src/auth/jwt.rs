use std::fmt;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Token type used to distinguish access and refresh JWTs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Not authenticated")]
    Missing,
    #[error("Token has expired")]
    Expired,
    /// Bad encoding, bad signature, wrong issuer/audience or missing claims.
    #[error("Invalid token")]
    Malformed(String),
    #[error("Expected {expected} token, got {found} token")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// JWT payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,     // user id
    pub iat: i64,        // issued at
    pub exp: i64,        // expiration time
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub jti: String,     // random token id
    #[serde(rename = "type")]
    pub kind: TokenKind, // access or refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Malformed(format!("subject {:?} is not a user id", self.sub)))
    }
}

/// Signing and verification keys plus the lifetimes they issue with.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::seconds(cfg.access_ttl_seconds),
            refresh_ttl: Duration::seconds(cfg.refresh_ttl_seconds),
        }
    }

    fn sign_at(
        &self,
        user_id: i64,
        kind: TokenKind,
        username: Option<&str>,
        issued_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            kind,
            username: username.map(str::to_string),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id, kind = %kind, "jwt signed");
        Ok(token)
    }

    /// Access token; `username` is embedded as an extra claim when given.
    pub fn issue_access(&self, user_id: i64, username: Option<&str>) -> anyhow::Result<String> {
        self.sign_at(user_id, TokenKind::Access, username, OffsetDateTime::now_utc())
    }

    pub fn issue_refresh(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign_at(user_id, TokenKind::Refresh, None, OffsetDateTime::now_utc())
    }

    /// Checks signature, issuer, audience, expiry (no leeway) and kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                found: claims.kind,
            });
        }
        debug!(sub = %claims.sub, kind = %claims.kind, "jwt verified");
        Ok(claims)
    }
}
