//! Environment configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

use crate::features::calendar::DEFAULT_SWEEP_INTERVAL;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Register commands to this guild only (instant updates while developing)
    pub discord_guild_id: Option<String>,
    pub database_path: String,
    pub log_level: String,
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let discord_guild_id = lookup("DISCORD_GUILD_ID").filter(|v| !v.trim().is_empty());

        let database_path = lookup("DATABASE_PATH").unwrap_or_else(|| "events.db".to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let sweep_interval = match lookup("SWEEP_INTERVAL_SECONDS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SWEEP_INTERVAL_SECONDS is not a number: {raw}"))?;
                if secs == 0 {
                    return Err(anyhow!("SWEEP_INTERVAL_SECONDS must be greater than zero"));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_SWEEP_INTERVAL,
        };

        Ok(Config {
            discord_token,
            discord_guild_id,
            database_path,
            log_level,
            sweep_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DISCORD_TOKEN", "token")]).unwrap();
        assert_eq!(config.discord_token, "token");
        assert_eq!(config.discord_guild_id, None);
        assert_eq!(config.database_path, "events.db");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "token"),
            ("DISCORD_GUILD_ID", "1234"),
            ("DATABASE_PATH", "/data/calendar.db"),
            ("LOG_LEVEL", "debug"),
            ("SWEEP_INTERVAL_SECONDS", "15"),
        ])
        .unwrap();
        assert_eq!(config.discord_guild_id.as_deref(), Some("1234"));
        assert_eq!(config.database_path, "/data/calendar.db");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.sweep_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_invalid_sweep_interval() {
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("SWEEP_INTERVAL_SECONDS", "0")]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "t"), ("SWEEP_INTERVAL_SECONDS", "soon")]).is_err());
    }
}
