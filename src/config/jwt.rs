use anyhow::Result;
use std::env;

use super::env_or;

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds, default one hour
    pub access_token_ttl: u64,
    /// Seconds, default seven days
    pub refresh_token_ttl: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        Self::new(
            secret,
            env_or("JWT_ACCESS_TTL", 3600),
            env_or("JWT_REFRESH_TTL", 604_800),
        )
    }

    pub fn new(secret: String, access_token_ttl: u64, refresh_token_ttl: u64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            ));
        }

        Ok(Self {
            secret,
            access_token_ttl,
            refresh_token_ttl,
        })
    }
}
