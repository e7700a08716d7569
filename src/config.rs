//! Environment-driven configuration, read once at startup.
//!
//! | Variable | Default |
//! |---|---|
//! | `DOCKER_ENDPOINT` | `unix:///var/run/docker.sock` |
//! | `DOCKER_TIMEOUT_SECS` | `5` |
//! | `CONTAINER_LABEL_ENABLE` | `METRICS_ENABLED=yes` |
//! | `CONTAINER_LABEL_EXPOSED_PORT` | `METRICS_EXPOSED_PORT` |
//! | `CONTAINER_LABEL_EXPOSED_PATH` | `METRICS_EXPOSED_PATH` |
//! | `CONTAINER_LABEL_EXPOSED_ADDRESS` | `METRICS_EXPOSED_ADDRESS` |
//! | `CONTAINER_LABEL_TAGS` | empty |
//! | `CONTAINER_ENV_TAGS` | empty |
//! | `FETCH_TIMEOUT_SECS` | `10` |
//! | `COLLECT_INTERVAL_SECS` | `10` |
//!
//! The two `*_TAGS` variables take comma-separated lists of label and
//! environment-variable names to project into metric tags.

use std::time::Duration;

use crate::discovery::{FilterPolicy, InvalidEnableGate};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    EnableGate(#[from] InvalidEnableGate),
    #[error("invalid value `{value}` for `{name}`: expected whole seconds")]
    InvalidDuration { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct Config {
    docker_endpoint: String,
    docker_timeout: Duration,
    fetch_timeout: Duration,
    collect_interval: Duration,
    policy: FilterPolicy,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if the enable label is not of `NAME=VALUE` form or a timeout
    /// variable does not parse as whole seconds. Both are startup errors; the
    /// process should not come up half-configured.
    pub fn from_env() -> Result<Self> {
        let enable = env_or("CONTAINER_LABEL_ENABLE", "METRICS_ENABLED=yes").parse()?;
        let policy = FilterPolicy::new(
            enable,
            env_or("CONTAINER_LABEL_EXPOSED_PORT", "METRICS_EXPOSED_PORT"),
            env_or("CONTAINER_LABEL_EXPOSED_PATH", "METRICS_EXPOSED_PATH"),
            env_or("CONTAINER_LABEL_EXPOSED_ADDRESS", "METRICS_EXPOSED_ADDRESS"),
            name_list(&env_or("CONTAINER_LABEL_TAGS", "")),
            name_list(&env_or("CONTAINER_ENV_TAGS", "")),
        );

        Ok(Self {
            docker_endpoint: env_or("DOCKER_ENDPOINT", "unix:///var/run/docker.sock"),
            docker_timeout: duration_secs("DOCKER_TIMEOUT_SECS", 5)?,
            fetch_timeout: duration_secs("FETCH_TIMEOUT_SECS", 10)?,
            collect_interval: duration_secs("COLLECT_INTERVAL_SECS", 10)?,
            policy,
        })
    }

    pub fn docker_endpoint(&self) -> &str {
        &self.docker_endpoint
    }

    pub fn docker_timeout(&self) -> Duration {
        self.docker_timeout
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn collect_interval(&self) -> Duration {
        self.collect_interval
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn duration_secs(name: &'static str, default: u64) -> Result<Duration> {
    match std::env::var(name) {
        Err(_) => Ok(Duration::from_secs(default)),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| Error::InvalidDuration { name, value: raw }),
    }
}

/// Splits a comma-separated list of names, dropping padding and empty items.
fn name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
