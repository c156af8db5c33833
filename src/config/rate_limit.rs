use std::env;

use super::env_flag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

/// Limits for the two route groups: anonymous-capable reads and
/// authenticated writes.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub public: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            public: RateLimitRule {
                per_second: 30,
                burst_size: 60,
            },
            protected: RateLimitRule {
                per_second: 10,
                burst_size: 20,
            },
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_PUBLIC` / `RATE_LIMIT_PROTECTED` take `per_second:burst`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = env_flag("RATE_LIMIT_ENABLED", cfg.enabled);
        cfg.public = rule_from_env("RATE_LIMIT_PUBLIC", cfg.public);
        cfg.protected = rule_from_env("RATE_LIMIT_PROTECTED", cfg.protected);
        cfg
    }
}

fn rule_from_env(var_name: &str, default: RateLimitRule) -> RateLimitRule {
    match env::var(var_name) {
        Ok(raw) => parse_rule(&raw).unwrap_or_else(|err| {
            tracing::warn!("Invalid {} '{}': {}", var_name, raw, err);
            default
        }),
        Err(_) => default,
    }
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per_second:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule {
        per_second,
        burst_size,
    })
}
