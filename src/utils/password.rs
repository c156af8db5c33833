use anyhow::{Context, Result};

/// bcrypt cost; `BCRYPT_COST` lowers it for test runs.
fn bcrypt_cost() -> u32 {
    std::env::var("BCRYPT_COST")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|cost| (4..=31).contains(cost))
        .unwrap_or(bcrypt::DEFAULT_COST)
}

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt_cost()).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
