// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the `Config` loaded once at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `converse.redb` | `./data` |
//! | `STELLAR_NETWORK` | `testnet` or `public` | `testnet` |
//! | `HORIZON_URL` | Horizon base URL | per network |
//! | `FRIENDBOT_URL` | Friendbot URL (testnet only) | `https://friendbot.stellar.org` |
//! | `STELLAR_BASE_FEE` | Flat fee per operation, in stroops | `10000` |
//! | `ANCHOR_DOMAIN` | SEP-24 anchor home domain | `testanchor.stellar.org` |
//! | `DEPOSIT_POLL_INTERVAL_SECS` | Deposit reconciliation interval, `0` disables | `30` |
//! | `JWT_SECRET` | HS256 secret for session tokens | Required |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::providers::anchor::DEFAULT_ANCHOR_DOMAIN;
use crate::stellar::{NetworkConfig, StellarNetwork};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The redb database file `converse.redb` is created inside it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const STELLAR_NETWORK_ENV: &str = "STELLAR_NETWORK";
pub const HORIZON_URL_ENV: &str = "HORIZON_URL";
pub const FRIENDBOT_URL_ENV: &str = "FRIENDBOT_URL";
pub const STELLAR_BASE_FEE_ENV: &str = "STELLAR_BASE_FEE";
pub const ANCHOR_DOMAIN_ENV: &str = "ANCHOR_DOMAIN";
pub const DEPOSIT_POLL_INTERVAL_ENV: &str = "DEPOSIT_POLL_INTERVAL_SECS";

/// HS256 secret for session tokens. Never logged.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DATABASE_FILE: &str = "converse.redb";
pub const DEFAULT_DEPOSIT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub network: NetworkConfig,
    pub anchor_domain: String,
    /// `None` disables the background deposit poller
    pub deposit_poll_interval: Option<Duration>,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };
        let data_dir = PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let network_kind = match get(STELLAR_NETWORK_ENV) {
            Some(raw) => StellarNetwork::parse(&raw).ok_or(ConfigError::Invalid {
                name: STELLAR_NETWORK_ENV,
                value: raw,
            })?,
            None => StellarNetwork::Testnet,
        };
        let mut network = NetworkConfig::for_network(network_kind);
        if let Some(url) = get(HORIZON_URL_ENV) {
            network.horizon_url = parse_url(HORIZON_URL_ENV, url)?;
        }
        if network_kind == StellarNetwork::Testnet {
            if let Some(url) = get(FRIENDBOT_URL_ENV) {
                network.friendbot_url = Some(parse_url(FRIENDBOT_URL_ENV, url)?);
            }
        }
        if let Some(raw) = get(STELLAR_BASE_FEE_ENV) {
            network.base_fee = raw
                .trim()
                .parse()
                .ok()
                .filter(|fee: &u32| *fee > 0)
                .ok_or(ConfigError::Invalid {
                    name: STELLAR_BASE_FEE_ENV,
                    value: raw,
                })?;
        }

        let anchor_domain =
            get(ANCHOR_DOMAIN_ENV).unwrap_or_else(|| DEFAULT_ANCHOR_DOMAIN.to_string());

        let deposit_poll_interval = match get(DEPOSIT_POLL_INTERVAL_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        name: DEPOSIT_POLL_INTERVAL_ENV,
                        value: raw,
                    })
                }
            },
            None => Some(DEFAULT_DEPOSIT_POLL_INTERVAL),
        };

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        Ok(Self {
            host,
            port,
            data_dir,
            network,
            anchor_domain,
            deposit_poll_interval,
            jwt_secret,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accept only absolute http(s) URLs; the trailing slash is dropped.
fn parse_url(name: &'static str, raw: String) -> Result<String, ConfigError> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(url.as_str().trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::Invalid { name, value: raw }),
    }
}
