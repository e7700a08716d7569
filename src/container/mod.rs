use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use phpfpm_monitor::container::{ContainerID, Error};
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.as_ref(), "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or longer than
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A container as returned by the inventory listing: its identity plus the
/// label set the discovery filter is evaluated against.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    id: ContainerID,
    labels: HashMap<String, String>,
}

impl ContainerSummary {
    pub fn new(id: ContainerID, labels: HashMap<String, String>) -> Self {
        Self { id, labels }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    /// Looks up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Detailed container data obtained from a per-container inspect call.
#[derive(Debug, Clone, Default)]
pub struct ContainerInfo {
    ip_address: String,
    env: Vec<String>,
}

impl ContainerInfo {
    pub fn new(ip_address: String, env: Vec<String>) -> Self {
        Self { ip_address, env }
    }

    /// The container's IP address on the default network. May be empty for
    /// containers attached only to user-defined networks.
    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// Raw environment entries in `NAME=VALUE` form, as reported by the runtime.
    pub fn env(&self) -> &[String] {
        &self.env
    }
}
