// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Which document store backs the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or the emulator when FIRESTORE_EMULATOR_HOST is set)
    Firestore { project_id: String },
    /// In-process store, contents are lost on restart
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Document store selection
    pub store: StoreBackend,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore {
                project_id: env::var("GCP_PROJECT_ID")
                    .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            port,
            store,
            cors_origin: env::var("CORS_ORIGIN")
                .ok()
                .filter(|origin| !origin.trim().is_empty()),
        })
    }

    /// Config for tests: in-memory store, no CORS restriction.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            store: StoreBackend::Memory,
            cors_origin: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-wide, so the variations run in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("PORT", "9090");
        env::remove_var("CORS_ORIGIN");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.port, 9090);
        assert!(config.cors_origin.is_none());

        env::set_var("STORE_BACKEND", "firestore");
        env::set_var("GCP_PROJECT_ID", "fitness-dev");
        let config = Config::from_env().expect("Config should load");
        assert_eq!(
            config.store,
            StoreBackend::Firestore {
                project_id: "fitness-dev".to_string()
            }
        );

        env::set_var("STORE_BACKEND", "mongo");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "STORE_BACKEND",
                ..
            })
        ));

        env::set_var("STORE_BACKEND", "memory");
        env::set_var("PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));

        env::remove_var("STORE_BACKEND");
        env::remove_var("PORT");
        env::remove_var("GCP_PROJECT_ID");
    }
}
