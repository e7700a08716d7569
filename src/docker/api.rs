//! Serde models for the subset of the Docker Engine API this crate consumes.
//!
//! Unknown fields are ignored and nullable sections are optional, so the
//! models stay compatible across daemon versions.

use std::collections::HashMap;

/// One element of the `GET /containers/json` response.
#[derive(Debug, serde::Deserialize)]
pub(super) struct ContainerListEntry {
    #[serde(rename = "Id")]
    pub id: String,
    /// The daemon reports `null` instead of an empty map for label-less containers.
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
}

/// The `GET /containers/{id}/json` response.
#[derive(Debug, serde::Deserialize)]
pub(super) struct ContainerInspectResponse {
    #[serde(rename = "Config", default)]
    pub config: Option<ContainerConfig>,
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: Option<NetworkSettings>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(super) struct ContainerConfig {
    #[serde(rename = "Env", default)]
    pub env: Option<Vec<String>>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(super) struct NetworkSettings {
    /// IP address on the default bridge network; empty for containers
    /// attached only to user-defined networks.
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
}
