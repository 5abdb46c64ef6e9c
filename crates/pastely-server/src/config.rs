use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use pastely_api::SessionConfig;

/// Runtime settings, read from `PASTELY_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub static_dir: PathBuf,
    pub session_lifetime: TimeDelta,
    pub secure_cookies: bool,
    pub session_cleanup_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let host = var("PASTELY_HOST", "0.0.0.0");
        let port: u16 = var("PASTELY_PORT", "4000")
            .parse()
            .context("PASTELY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let db_readers: usize = var("PASTELY_DB_READERS", "4")
            .parse()
            .context("PASTELY_DB_READERS must be a positive integer")?;
        if db_readers == 0 {
            anyhow::bail!("PASTELY_DB_READERS must be at least 1");
        }

        let lifetime_hours: i64 = var("PASTELY_SESSION_LIFETIME_HOURS", "12")
            .parse()
            .context("PASTELY_SESSION_LIFETIME_HOURS must be a number of hours")?;
        let session_lifetime = TimeDelta::try_hours(lifetime_hours)
            .filter(|d| *d > TimeDelta::zero())
            .context("PASTELY_SESSION_LIFETIME_HOURS is out of range")?;

        let secure_cookies: bool = var("PASTELY_SECURE_COOKIES", "false")
            .parse()
            .context("PASTELY_SECURE_COOKIES must be true or false")?;

        let cleanup_secs: u64 = var("PASTELY_SESSION_CLEANUP_SECS", "3600")
            .parse()
            .context("PASTELY_SESSION_CLEANUP_SECS must be a number of seconds")?;
        if cleanup_secs == 0 {
            anyhow::bail!("PASTELY_SESSION_CLEANUP_SECS must be at least 1");
        }

        Ok(Self {
            addr,
            db_path: var("PASTELY_DB_PATH", "pastely.db").into(),
            db_readers,
            static_dir: var("PASTELY_STATIC_DIR", "./ui/static").into(),
            session_lifetime,
            secure_cookies,
            session_cleanup_interval: Duration::from_secs(cleanup_secs),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            lifetime: self.session_lifetime,
            secure: self.secure_cookies,
            ..SessionConfig::default()
        }
    }
}
