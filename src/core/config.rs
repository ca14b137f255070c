use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;

use crate::api::Species;
use crate::governance::SpeciesWeights;

pub const DEFAULT_API_URL: &str = "https://supernova2177test-production.up.railway.app";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub governance: GovernanceConfig,
    pub session: SessionConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub interval_secs: u64,
    pub network_limit: u32,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    pub weights: SpeciesWeights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub database_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub dashboard_port: u16,
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            network_limit: 50,
            history_capacity: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let weights = SpeciesWeights::new(
            parse_var("WEIGHT_HUMAN", 1.0),
            parse_var("WEIGHT_AI", 1.0),
            parse_var("WEIGHT_COMPANY", 1.0),
        );
        for species in Species::ALL {
            let weight = weights.get(species);
            if !(weight.is_finite() && weight > 0.0) {
                bail!("Weight for species '{}' must be positive, got {}", species, weight);
            }
        }

        let history_capacity = parse_var("ENTROPY_HISTORY_CAPACITY", 20usize);
        if history_capacity == 0 {
            bail!("ENTROPY_HISTORY_CAPACITY must be at least 1");
        }

        Ok(Config {
            api: ApiConfig {
                base_url: normalize_base_url(
                    &env::var("SUPERNOVA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
                ),
                request_timeout_secs: parse_var("SUPERNOVA_REQUEST_TIMEOUT_SECS", 10),
            },
            sync: SyncConfig {
                interval_secs: parse_var("SYNC_INTERVAL_SECS", 30).max(1),
                network_limit: parse_var("SYNC_NETWORK_LIMIT", 50),
                history_capacity,
            },
            governance: GovernanceConfig { weights },
            session: SessionConfig {
                database_path: env::var("SESSION_DB_PATH")
                    .unwrap_or_else(|_| "data/session.db".to_string()),
                username: env::var("SUPERNOVA_USERNAME").ok().filter(|u| !u.is_empty()),
                password: env::var("SUPERNOVA_PASSWORD").ok(),
            },
            monitoring: MonitoringConfig {
                dashboard_port: parse_var("DASHBOARD_PORT", 3000),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        assert_eq!(
            normalize_base_url("https://api.example.org/"),
            "https://api.example.org"
        );
        assert_eq!(normalize_base_url(" http://localhost:8000 "), "http://localhost:8000");
    }

    #[test]
    fn test_sync_defaults() {
        let sync = SyncConfig::default();
        assert_eq!(sync.interval_secs, 30);
        assert_eq!(sync.history_capacity, 20);
        assert_eq!(sync.network_limit, 50);
    }
}
