// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables via secret bindings,
//! so everything is read once at startup.

use crate::time_utils::DayBoundary;
use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Local day used for the daily review cap and visit streaks
    pub day_boundary: DayBoundary,
    /// Leaderboard read-through cache lifetime (0 disables caching)
    pub leaderboard_cache_ttl_secs: u64,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Shared secret presented by the scheduler on `/tasks/*`
    pub tasks_secret: String,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            day_boundary: DayBoundary::utc(),
            leaderboard_cache_ttl_secs: 60,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            tasks_secret: "test_tasks_secret".to_string(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let offset_minutes: i32 = parse_or_default("DAY_BOUNDARY_UTC_OFFSET_MINUTES", 0)?;
        let day_boundary = DayBoundary::from_offset_minutes(offset_minutes).ok_or(
            ConfigError::Invalid(
                "DAY_BOUNDARY_UTC_OFFSET_MINUTES",
                format!("{} is outside ±840 minutes", offset_minutes),
            ),
        )?;

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or_default("PORT", 8080)?,
            day_boundary,
            leaderboard_cache_ttl_secs: parse_or_default("LEADERBOARD_CACHE_TTL_SECS", 60)?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            tasks_secret: env::var("TASKS_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TASKS_SECRET"))?,
        })
    }
}

fn parse_or_default<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(name, e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so env mutations never race with each other.
    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("TASKS_SECRET", " scheduler-secret ");
        env::set_var("DAY_BOUNDARY_UTC_OFFSET_MINUTES", "-480");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.tasks_secret, "scheduler-secret");
        assert_eq!(config.port, 8080);
        assert_eq!(config.day_boundary.offset_minutes(), -480);

        env::set_var("DAY_BOUNDARY_UTC_OFFSET_MINUTES", "900");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("DAY_BOUNDARY_UTC_OFFSET_MINUTES", _))
        ));

        env::set_var("DAY_BOUNDARY_UTC_OFFSET_MINUTES", "abc");
        assert!(Config::from_env().is_err());
        env::remove_var("DAY_BOUNDARY_UTC_OFFSET_MINUTES");
    }
}
