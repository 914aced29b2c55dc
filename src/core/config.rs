//! Environment-backed configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};
use std::env;

/// Runtime configuration loaded from environment variables
///
/// Values come from the process environment (a `.env` file is loaded by the
/// binary before this runs). Only `DISCORD_TOKEN` is required.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token (required)
    pub discord_token: String,
    /// Path to the sqlite database file
    pub database_path: String,
    /// Default log filter for env_logger
    pub log_level: String,
    /// How long a dialog waits for a reply before giving up, in seconds
    pub reply_timeout_secs: u64,
    /// How often the reminder scheduler checks for due events, in seconds
    pub scheduler_tick_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let discord_token = env::var("DISCORD_TOKEN")
            .context("DISCORD_TOKEN environment variable is required")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "goals.db".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let reply_timeout_secs = parse_secs("REPLY_TIMEOUT_SECS", 120)?;
        let scheduler_tick_secs = parse_secs("SCHEDULER_TICK_SECS", 15)?;

        Ok(Config {
            discord_token,
            database_path,
            log_level,
            reply_timeout_secs,
            scheduler_tick_secs,
        })
    }
}

fn parse_secs(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a number of seconds, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs_default_when_unset() {
        env::remove_var("GOALKEEPER_TEST_SECS");
        assert_eq!(parse_secs("GOALKEEPER_TEST_SECS", 42).unwrap(), 42);
    }

    #[test]
    fn test_parse_secs_reads_value() {
        env::set_var("GOALKEEPER_TEST_SECS_SET", "7");
        assert_eq!(parse_secs("GOALKEEPER_TEST_SECS_SET", 42).unwrap(), 7);
        env::remove_var("GOALKEEPER_TEST_SECS_SET");
    }

    #[test]
    fn test_parse_secs_rejects_garbage() {
        env::set_var("GOALKEEPER_TEST_SECS_BAD", "soon");
        assert!(parse_secs("GOALKEEPER_TEST_SECS_BAD", 42).is_err());
        env::remove_var("GOALKEEPER_TEST_SECS_BAD");
    }
}
