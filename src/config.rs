// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup via
//! [`Config::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `GATEWAY_BASE_URL` | IPFS gateway prefix, concatenated with each hash | `https://gateway.pinata.cloud/ipfs/` |
//! | `GATEWAY_FETCH_TIMEOUT_SECS` | HTTP timeout for a single gateway fetch | `15` |
//! | `GATEWAY_MAX_CONCURRENT_FETCHES` | Fan-out cap per request | `8` |
//! | `PIPELINE_DEADLINE_SECS` | Deadline for one whole retrieval page | `30` |
//! | `SEED_USERS_FILE` | JSON file of directory users loaded at startup | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `relational_image_vault=info,tower_http=info` |

use std::{path::PathBuf, str::FromStr, time::Duration};

use url::Url;

/// Public gateway of the pinning service the original deployment used.
pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://gateway.pinata.cloud/ipfs/";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;
const DEFAULT_PIPELINE_DEADLINE_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be at least 1")]
    MustBePositive { name: &'static str },
}

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Gateway prefix; a fetch URL is this value joined with the content hash.
    pub gateway_base_url: Url,
    /// Timeout applied to each individual gateway fetch.
    pub gateway_fetch_timeout: Duration,
    /// Maximum gateway fetches in flight for one request.
    pub gateway_max_concurrent_fetches: usize,
    /// Deadline covering the full fetch+decrypt fan-out of one request.
    pub pipeline_deadline: Duration,
    /// Optional JSON seed file for the in-process user directory.
    pub seed_users_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let gateway_base_url = env_or_default("GATEWAY_BASE_URL", DEFAULT_GATEWAY_BASE_URL);
        let gateway_base_url =
            Url::parse(&gateway_base_url).map_err(|source| ConfigError::InvalidUrl {
                name: "GATEWAY_BASE_URL",
                source,
            })?;

        let port = parse_env("PORT", DEFAULT_PORT)?;
        let fetch_timeout_secs = parse_env("GATEWAY_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;
        if fetch_timeout_secs < 1 {
            return Err(ConfigError::MustBePositive {
                name: "GATEWAY_FETCH_TIMEOUT_SECS",
            });
        }
        let max_concurrent = parse_env(
            "GATEWAY_MAX_CONCURRENT_FETCHES",
            DEFAULT_MAX_CONCURRENT_FETCHES,
        )?;
        if max_concurrent < 1 {
            return Err(ConfigError::MustBePositive {
                name: "GATEWAY_MAX_CONCURRENT_FETCHES",
            });
        }
        let deadline_secs = parse_env("PIPELINE_DEADLINE_SECS", DEFAULT_PIPELINE_DEADLINE_SECS)?;
        if deadline_secs < 1 {
            return Err(ConfigError::MustBePositive {
                name: "PIPELINE_DEADLINE_SECS",
            });
        }

        Ok(Self {
            host: env_or_default("HOST", DEFAULT_HOST),
            port,
            gateway_base_url,
            gateway_fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            gateway_max_concurrent_fetches: max_concurrent,
            pipeline_deadline: Duration::from_secs(deadline_secs),
            seed_users_file: env_optional("SEED_USERS_FILE").map(PathBuf::from),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            // The default is a compile-time constant and always parses.
            gateway_base_url: Url::parse(DEFAULT_GATEWAY_BASE_URL)
                .expect("default gateway URL is valid"),
            gateway_fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            gateway_max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            pipeline_deadline: Duration::from_secs(DEFAULT_PIPELINE_DEADLINE_SECS),
            seed_users_file: None,
        }
    }
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env_optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        None => Ok(default),
    }
}
