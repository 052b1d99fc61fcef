//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `SCYLLA_NODES` - comma-separated contact points (default: 127.0.0.1:9042)
//! - `SCYLLA_KEYSPACE` - keyspace name (default: bookstore)
//! - `SCYLLA_REPLICATION_FACTOR` - used when creating the keyspace (default: 1)
//! - `METRICS_PORT` - port for `/metrics` and `/health` (default: 9090)
//! - `ORDER_PAGE_SIZE_MAX` - upper bound for admin listing page size (default: 200)
//! - `ORDER_NOTIFIER` - `outbox` or `log` (default: outbox)

use std::str::FromStr;

use thiserror::Error;

use crate::services::DEFAULT_MAX_PAGE_SIZE;
use crate::store::scylladb::schema::is_valid_keyspace;

const DEFAULT_NODES: &str = "127.0.0.1:9042";
const DEFAULT_KEYSPACE: &str = "bookstore";
const DEFAULT_METRICS_PORT: u16 = 9090;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where order confirmations go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// Queue in `outbox_messages` for the mail relay.
    Outbox,
    /// Log only; for local runs without a relay.
    Log,
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outbox" => Ok(NotifierKind::Outbox),
            "log" => Ok(NotifierKind::Log),
            other => Err(format!("unknown notifier '{}', expected outbox or log", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub scylla_nodes: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u32,
    pub metrics_port: u16,
    pub max_page_size: u32,
    pub notifier: NotifierKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scylla_nodes: vec![DEFAULT_NODES.to_string()],
            keyspace: DEFAULT_KEYSPACE.to_string(),
            replication_factor: 1,
            metrics_port: DEFAULT_METRICS_PORT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            notifier: NotifierKind::Outbox,
        }
    }
}

impl AppConfig {
    /// Load from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let scylla_nodes = match lookup("SCYLLA_NODES") {
            Some(raw) => {
                let nodes: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect();
                if nodes.is_empty() {
                    return Err(ConfigError::InvalidEnvVar(
                        "SCYLLA_NODES".into(),
                        "no contact points given".into(),
                    ));
                }
                nodes
            }
            None => defaults.scylla_nodes,
        };

        let keyspace = lookup("SCYLLA_KEYSPACE").unwrap_or(defaults.keyspace);
        if !is_valid_keyspace(&keyspace) {
            return Err(ConfigError::InvalidEnvVar(
                "SCYLLA_KEYSPACE".into(),
                format!("'{}' is not a valid CQL identifier", keyspace),
            ));
        }

        let replication_factor =
            parse_var(&lookup, "SCYLLA_REPLICATION_FACTOR", defaults.replication_factor)?;
        let metrics_port = parse_var(&lookup, "METRICS_PORT", defaults.metrics_port)?;
        let max_page_size = parse_var(&lookup, "ORDER_PAGE_SIZE_MAX", defaults.max_page_size)?;
        let notifier = parse_var(&lookup, "ORDER_NOTIFIER", defaults.notifier)?;

        if replication_factor == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SCYLLA_REPLICATION_FACTOR".into(),
                "must be at least 1".into(),
            ));
        }
        if max_page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_PAGE_SIZE_MAX".into(),
                "must be at least 1".into(),
            ));
        }

        Ok(Self {
            scylla_nodes,
            keyspace,
            replication_factor,
            metrics_port,
            max_page_size,
            notifier,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
