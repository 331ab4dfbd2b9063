//! Daemon configuration from environment variables.
//!
//! `from_lookup` takes the lookup function as a parameter so tests can feed a
//! fixed map instead of mutating the process environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const ENV_STORAGE: &str = "SNK_STORAGE";
pub const ENV_DAEMON_ADDR: &str = "SNK_DAEMON_ADDR";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SNK_REQUEST_TIMEOUT_MS";
pub const ENV_MIGRATE_ON_BOOT: &str = "SNK_MIGRATE_ON_BOOT";

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 10000);
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Which [`snk_db::InventoryStore`] backend the daemon serves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageKind::Postgres),
            "memory" | "mem" => Ok(StorageKind::Memory),
            other => bail!("unknown storage backend '{other}' (expected postgres|memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub storage: StorageKind,
    /// Required when `storage` is Postgres.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub addr: SocketAddr,
    /// Budget for every storage call made on behalf of one request.
    pub request_timeout: Duration,
    pub migrate_on_boot: bool,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup(ENV_STORAGE) {
            Some(v) => v.parse()?,
            None => StorageKind::Postgres,
        };

        let database_url = lookup(snk_db::ENV_DB_URL).filter(|v| !v.trim().is_empty());
        if storage == StorageKind::Postgres && database_url.is_none() {
            bail!(
                "{} is required when {ENV_STORAGE}=postgres",
                snk_db::ENV_DB_URL
            );
        }

        let max_connections = match lookup(snk_db::ENV_DB_MAX_CONNECTIONS) {
            Some(v) => parse_positive(snk_db::ENV_DB_MAX_CONNECTIONS, &v)?,
            None => snk_db::DEFAULT_MAX_CONNECTIONS,
        };

        let addr = match lookup(ENV_DAEMON_ADDR) {
            Some(v) => v
                .parse()
                .with_context(|| format!("{ENV_DAEMON_ADDR} is not a socket address: {v}"))?,
            None => SocketAddr::from(DEFAULT_ADDR),
        };

        let request_timeout = match lookup(ENV_REQUEST_TIMEOUT_MS) {
            Some(v) => Duration::from_millis(parse_positive(ENV_REQUEST_TIMEOUT_MS, &v)?),
            None => Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        };

        let migrate_on_boot = match lookup(ENV_MIGRATE_ON_BOOT) {
            Some(v) => parse_bool(ENV_MIGRATE_ON_BOOT, &v)?,
            None => true,
        };

        Ok(Self {
            storage,
            database_url,
            max_connections,
            addr,
            request_timeout,
            migrate_on_boot,
        })
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => bail!("{key} must be a positive integer, got '{raw}'"),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be a boolean, got '{raw}'"),
    }
}
