use std::str::FromStr;

use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;

/// Where the boundary layer expects to find bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLocation {
    Headers,
}

impl FromStr for TokenLocation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headers" => Ok(Self::Headers),
            other => bail!("unsupported token location {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub token_location: TokenLocation,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

/// Only HMAC algorithms: the signing key is a shared secret.
pub fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    let alg = Algorithm::from_str(name.trim())
        .with_context(|| format!("unknown JWT algorithm {name:?}"))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => bail!("JWT algorithm {other:?} needs a key pair; use HS256, HS384 or HS512"),
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let algorithm =
            parse_algorithm(&std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".into()))?;
        let token_location = std::env::var("JWT_TOKEN_LOCATION")
            .unwrap_or_else(|_| "headers".into())
            .parse::<TokenLocation>()?;

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            algorithm,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ledgerly".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "ledgerly-users".into()),
            access_ttl_seconds: env_or("JWT_ACCESS_TOKEN_LIFETIME", 3600),
            refresh_ttl_seconds: env_or("JWT_REFRESH_TOKEN_LIFETIME", 60 * 60 * 24 * 30),
            token_location,
        };
        if jwt.access_ttl_seconds <= 0 || jwt.refresh_ttl_seconds <= 0 {
            bail!("token lifetimes must be positive");
        }

        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
        })
    }
}
