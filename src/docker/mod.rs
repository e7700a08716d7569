//! A minimal Docker Engine API client covering the two calls discovery
//! needs: the container listing and the per-container inspect.
//!
//! The daemon is reached over its Unix domain socket
//! (`unix:///var/run/docker.sock`) or a plain TCP endpoint
//! (`tcp://host:port`). Each call opens a fresh connection; the client holds
//! no state besides the endpoint itself.

use std::path::PathBuf;

use crate::container::{ContainerID, ContainerInfo, ContainerSummary};
use crate::discovery::Inventory;
use crate::http;

mod api;
mod error;

pub use error::{Error, Result};

#[derive(Debug, Clone)]
enum Transport {
    Unix(PathBuf),
    Tcp(String),
}

#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEndpoint`] unless the endpoint uses the
    /// `unix://` or `tcp://` scheme.
    pub fn new(endpoint: &str) -> Result<Self> {
        let transport = if let Some(path) = endpoint.strip_prefix("unix://") {
            Transport::Unix(PathBuf::from(path))
        } else if let Some(authority) = endpoint.strip_prefix("tcp://") {
            Transport::Tcp(authority.to_owned())
        } else {
            return Err(Error::UnsupportedEndpoint(endpoint.to_owned()));
        };

        Ok(Self { transport })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let (status, body) = match &self.transport {
            Transport::Unix(socket) => http::get_unix(socket, path).await?,
            Transport::Tcp(authority) => http::get_tcp(authority, path).await?,
        };

        if status != hyper::StatusCode::OK {
            return Err(Error::Status {
                path: path.to_owned(),
                status,
            });
        }

        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            path: path.to_owned(),
            source,
        })
    }
}

impl Inventory for Client {
    type Error = Error;

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let entries: Vec<api::ContainerListEntry> = self.get_json("/containers/json").await?;

        entries
            .into_iter()
            .map(|entry| {
                Ok(ContainerSummary::new(
                    ContainerID::new(entry.id)?,
                    entry.labels.unwrap_or_default(),
                ))
            })
            .collect()
    }

    async fn inspect_container(&self, id: &ContainerID) -> Result<ContainerInfo> {
        let response: api::ContainerInspectResponse =
            self.get_json(&format!("/containers/{id}/json")).await?;

        let ip_address = response
            .network_settings
            .map(|settings| settings.ip_address)
            .unwrap_or_default();
        let env = response
            .config
            .and_then(|config| config.env)
            .unwrap_or_default();

        Ok(ContainerInfo::new(ip_address, env))
    }
}
