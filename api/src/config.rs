//! Configuration Module
//!
//! Environment variables only, validated once at startup (fail-fast).
//! Every value has a development default so a bare `cargo run` works.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_PROOF_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SETUP_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Concurrent proving/verification units (default: available CPUs)
    pub worker_threads: usize,

    /// Per-request budget for proving or verification, queueing included
    pub proof_timeout: Duration,

    /// Budget for one key setup (or key load) per circuit kind
    pub setup_timeout: Duration,

    /// Directory for persisted keys; `None` keeps keys in memory only
    pub key_dir: Option<PathBuf>,

    /// development, staging, production
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Optional Environment Variables
    ///
    /// - `WORKER_THREADS`: worker pool size, at least 1
    /// - `PROOF_TIMEOUT_MS`: per-request timeout (default: 30000)
    /// - `SETUP_TIMEOUT_MS`: key setup timeout (default: 120000)
    /// - `KEY_DIR`: persisted key directory
    /// - `ENVIRONMENT`: development | staging | production
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let environment = match lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let worker_threads = match lookup("WORKER_THREADS") {
            Some(raw) => raw
                .parse::<usize>()
                .context("WORKER_THREADS must be a positive integer")?,
            None => defaults.worker_threads,
        };
        if worker_threads == 0 {
            bail!("WORKER_THREADS must be at least 1");
        }

        Ok(Config {
            worker_threads,
            proof_timeout: timeout_from(&lookup, "PROOF_TIMEOUT_MS", defaults.proof_timeout)?,
            setup_timeout: timeout_from(&lookup, "SETUP_TIMEOUT_MS", defaults.setup_timeout)?,
            key_dir: lookup("KEY_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            proof_timeout: Duration::from_millis(DEFAULT_PROOF_TIMEOUT_MS),
            setup_timeout: Duration::from_millis(DEFAULT_SETUP_TIMEOUT_MS),
            key_dir: None,
            environment: Environment::Development,
        }
    }
}

fn timeout_from(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let millis = raw
        .parse::<u64>()
        .with_context(|| format!("{} must be a number of milliseconds", key))?;
    if millis == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_millis(millis))
}
