use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::services::match_service::MatchSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    DynamoDb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub rooms: String,
    pub game_stats: String,
    pub users: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageBackend,
    /// Present only for the DynamoDB backend.
    pub tables: Option<TableNames>,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub bingo_call_interval: Duration,
    pub memory_reveal_delay: Duration,
    pub rng_seed: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} environment variable must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let storage = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("memory") => StorageBackend::Memory,
            Some("dynamodb") => StorageBackend::DynamoDb,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };
        let tables = match storage {
            StorageBackend::Memory => None,
            StorageBackend::DynamoDb => Some(TableNames {
                rooms: required("ROOMS_TABLE")?,
                game_stats: required("GAME_STATS_TABLE")?,
                users: required("USERS_TABLE")?,
            }),
        };

        Ok(Config {
            storage,
            tables,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            bingo_call_interval: Duration::from_secs(parse_or(&lookup, "BINGO_CALL_INTERVAL_SECS", 5)?),
            memory_reveal_delay: Duration::from_millis(parse_or(&lookup, "MEMORY_REVEAL_DELAY_MS", 1_000)?),
            rng_seed: lookup("RNG_SEED")
                .map(|v| parse("RNG_SEED", &v))
                .transpose()?,
        })
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            bingo_call_interval: self.bingo_call_interval,
            memory_reveal_delay: self.memory_reveal_delay,
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => parse(key, &value),
        None => Ok(default),
    }
}
