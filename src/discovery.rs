//! Label-driven discovery of containers that expose a status endpoint.
//!
//! A discovery pass lists every container from the inventory, keeps the ones
//! whose labels satisfy the [`FilterPolicy`], and resolves each keeper into a
//! [`ContainerTarget`]: the status endpoint URL plus the tag set its metrics
//! will carry. Targets live for one collection cycle.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::container::{ContainerID, ContainerInfo, ContainerSummary};

/// The tag holding the container identifier. Always present on a target and
/// always applied last.
const CONTAINER_ID_TAG: &str = "container_id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list containers: {0}")]
    List(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("container discovery timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The container inventory capability discovery runs against.
///
/// The listing returns identity and labels for every running container; the
/// per-container inspect call returns the network and environment details
/// needed to resolve an endpoint and its tags.
pub trait Inventory {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list_containers(
        &self,
    ) -> impl Future<Output = std::result::Result<Vec<ContainerSummary>, Self::Error>> + Send;

    fn inspect_container(
        &self,
        id: &ContainerID,
    ) -> impl Future<Output = std::result::Result<ContainerInfo, Self::Error>> + Send;
}

/// The label/value pair a container must carry to be eligible for collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableGate {
    label: String,
    value: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid enable label `{0}`, expected `NAME=VALUE`")]
pub struct InvalidEnableGate(String);

impl FromStr for EnableGate {
    type Err = InvalidEnableGate;

    /// Splits a `NAME=VALUE` configuration string into the gate. The string
    /// must contain exactly one `=`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('=').collect();
        let [label, value] = parts.as_slice() else {
            return Err(InvalidEnableGate(s.to_owned()));
        };

        Ok(Self {
            label: (*label).to_owned(),
            value: (*value).to_owned(),
        })
    }
}

/// How containers are filtered and how their labels and environment are
/// projected into tags. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    enable: EnableGate,
    port_label: String,
    path_label: String,
    addr_label: String,
    label_tags: Vec<String>,
    env_tags: Vec<String>,
}

impl FilterPolicy {
    pub fn new(
        enable: EnableGate,
        port_label: String,
        path_label: String,
        addr_label: String,
        label_tags: Vec<String>,
        env_tags: Vec<String>,
    ) -> Self {
        Self {
            enable,
            port_label,
            path_label,
            addr_label,
            label_tags,
            env_tags,
        }
    }
}

/// A discovered collection target: one status endpoint and the tags every
/// metric record from it will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTarget {
    endpoint: String,
    tags: HashMap<String, String>,
}

impl ContainerTarget {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }
}

pub struct Discoverer<I> {
    inventory: I,
    policy: FilterPolicy,
    timeout: Duration,
}

impl<I: Inventory> Discoverer<I> {
    pub fn new(inventory: I, policy: FilterPolicy, timeout: Duration) -> Self {
        Self {
            inventory,
            policy,
            timeout,
        }
    }

    /// Runs one discovery pass, bounded by the configured inventory timeout.
    ///
    /// Targets come back in listing order. A container that fails the filter
    /// is skipped silently; a container whose inspect call fails is skipped
    /// with a warning. Only a listing failure (or the deadline expiring) fails
    /// the pass as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`Error::List`] if the inventory listing fails and
    /// [`Error::Timeout`] if the pass exceeds its deadline.
    pub async fn discover(&self) -> Result<Vec<ContainerTarget>> {
        tokio::time::timeout(self.timeout, self.discover_inner())
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }

    async fn discover_inner(&self) -> Result<Vec<ContainerTarget>> {
        let containers = self
            .inventory
            .list_containers()
            .await
            .map_err(|source| Error::List(Box::new(source)))?;
        log::debug!("Listed {} containers", containers.len());

        let mut targets = Vec::new();
        for container in containers {
            if let Some(target) = self.resolve_target(&container).await {
                targets.push(target);
            }
        }
        log::debug!("Resolved {} collection targets", targets.len());

        Ok(targets)
    }

    /// Applies the filter policy to one listed container. Returns `None` for
    /// every skip case: gate not satisfied, endpoint labels missing, or the
    /// inspect call failing.
    async fn resolve_target(&self, container: &ContainerSummary) -> Option<ContainerTarget> {
        let policy = &self.policy;

        if container.label(&policy.enable.label)? != policy.enable.value {
            return None;
        }
        let port = container.label(&policy.port_label)?;
        let path = container.label(&policy.path_label)?;

        let info = match self.inventory.inspect_container(container.id()).await {
            Ok(info) => info,
            Err(err) => {
                log::warn!("failed to inspect container `{}`: {}", container.id(), err);
                return None;
            }
        };

        let address = container
            .label(&policy.addr_label)
            .unwrap_or_else(|| info.ip_address());
        let endpoint = format!("http://{address}:{port}/{path}");

        let mut tags = HashMap::new();
        for label in &policy.label_tags {
            if let Some(value) = container.label(label) {
                tags.insert(label.clone(), value.to_owned());
            }
        }
        for name in &policy.env_tags {
            for entry in info.env() {
                // NAME=VALUE with exactly one `=`; the tag keeps the name part
                // as it literally appears and the trimmed value.
                let parts: Vec<&str> = entry.split('=').collect();
                let [entry_name, entry_value] = parts.as_slice() else {
                    continue;
                };
                let value = entry_value.trim();
                if value.is_empty() || entry_name.trim() != name {
                    continue;
                }
                tags.insert((*entry_name).to_owned(), value.to_owned());
            }
        }
        tags.insert(CONTAINER_ID_TAG.to_owned(), container.id().to_string());

        Some(ContainerTarget { endpoint, tags })
    }
}
