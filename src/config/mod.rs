//! Connection configuration shared by every handle the client creates.
//!
//! Configuration is a flat set of string keys and values. Settings are
//! additive: [`Configuration::add_properties`] overlays new keys on top of
//! what is already there. Each handle is created from a [`Properties`]
//! snapshot, so changing the configuration never affects handles that are
//! already open.
//!
//! # Well-known keys
//!
//! | Key | Default |
//! |-----|---------|
//! | `coordinator.quorum` | `localhost` |
//! | `coordinator.client_port` | `2181` |
//! | `coordinator.znode_parent` | `/rucksbase` |
//! | `client.scanner.caching` | unset |

use std::{collections::BTreeMap, path::Path, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::util::Status;

pub const QUORUM: &str = "coordinator.quorum";
pub const CLIENT_PORT: &str = "coordinator.client_port";
pub const ZNODE_PARENT: &str = "coordinator.znode_parent";
pub const SCANNER_CACHING: &str = "client.scanner.caching";

pub const DEFAULT_QUORUM: &str = "localhost";
pub const DEFAULT_CLIENT_PORT: u16 = 2181;
pub const DEFAULT_ZNODE_PARENT: &str = "/rucksbase";

/// Coordination service address a handle connects to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub quorum: String,
    pub client_port: u16,
    pub znode_parent: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint {
            quorum: DEFAULT_QUORUM.to_string(),
            client_port: DEFAULT_CLIENT_PORT,
            znode_parent: DEFAULT_ZNODE_PARENT.to_string(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}{}", self.quorum, self.client_port, self.znode_parent)
    }
}

/// An immutable set of configuration properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Properties::default()
    }

    /// Parse a JSON object of string keys to string values.
    pub fn from_json_str(json: &str) -> Result<Self, Status> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Status> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse an optional numeric property.
    pub fn get_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, Status> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                Status::invalid_argument(format!("malformed value for {key}: {raw:?}"))
            }),
        }
    }

    /// The coordination endpoint described by these properties.
    pub fn endpoint(&self) -> Result<Endpoint, Status> {
        Ok(Endpoint {
            quorum: self.get(QUORUM).unwrap_or(DEFAULT_QUORUM).to_string(),
            client_port: self.get_parsed(CLIENT_PORT)?.unwrap_or(DEFAULT_CLIENT_PORT),
            znode_parent: self.get(ZNODE_PARENT).unwrap_or(DEFAULT_ZNODE_PARENT).to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

/// Process-wide mutable configuration, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    inner: Arc<RwLock<Properties>>,
}

impl Configuration {
    pub fn new() -> Self {
        Configuration::default()
    }

    pub fn from_properties(props: Properties) -> Self {
        Configuration {
            inner: Arc::new(RwLock::new(props)),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().set(key, value);
    }

    /// Overlay every entry of `props`, keeping keys it does not mention.
    pub fn add_properties<'a>(&self, props: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let mut guard = self.inner.write();
        for (k, v) in props {
            guard.set(k, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).map(str::to_string)
    }

    pub fn snapshot(&self) -> Properties {
        self.inner.read().clone()
    }
}
