//! The client access layer.
//!
//! [`StoreClient`] runs every logical operation inside a resource scope:
//! it acquires an admin or table handle from its [`Connector`], runs
//! exactly one operation against it and releases the handle on every exit
//! path. Admin operations manage tables and column families. Row
//! operations translate optional parameters into well-formed store
//! requests. [`ResultScan`] walks a row range lazily, one page at a time.
//!
//! ```text
//! caller ──→ StoreClient ──→ with_admin / with_table ──→ Connector
//!                 │                                          │
//!                 └──→ scan() ──→ ResultScan ──→ Table ──→ Scanner
//! ```
//!
//! Every public operation returns either a value or an [`Error`]:
//! `InvalidArgument` for blank required parameters, detected before any
//! I/O, and `Service` for everything the store reports.
//!
//! [`Error`]: crate::Error

mod admin;
mod patch;
mod rows;
mod scan;
mod scope;

pub use patch::ColumnFamilyPatch;
pub use rows::{CellCheck, ColumnDelete, ColumnPut};
pub use scan::{DEFAULT_FETCH_SIZE, ResultScan, ScanSpec};

use crate::{
    config::Configuration,
    mem::{MemCluster, MemConnector},
    store::Connector,
};

/// Client of a wide-column store reached through `C`.
///
/// # Example
///
/// ```
/// use rucksbase::{MemCluster, StoreClient};
///
/// let cluster = MemCluster::new();
/// let client = StoreClient::embedded(&cluster);
///
/// client.create_table("orders").unwrap();
/// client.add_column("orders", "o", Some(5), None, None).unwrap();
/// client.put("orders", "r1", "o", "q1", None, "v1", true).unwrap();
///
/// let row = client.get("orders", "r1", Some("o"), Some("q1"), None, None).unwrap();
/// assert_eq!(row.value(b"o", b"q1").unwrap().as_ref(), b"v1");
/// assert_eq!(cluster.open_handles(), 0);
/// ```
pub struct StoreClient<C: Connector> {
    connector: C,
    configuration: Configuration,
}

impl<C: Connector> StoreClient<C> {
    /// A client with an empty configuration, which addresses the default
    /// endpoint.
    pub fn new(connector: C) -> Self {
        StoreClient::with_configuration(connector, Configuration::new())
    }

    pub fn with_configuration(connector: C, configuration: Configuration) -> Self {
        StoreClient {
            connector,
            configuration,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Overlay `properties` on the shared configuration.
    ///
    /// Only handles acquired afterwards see the change.
    pub fn add_properties<'a>(&self, properties: impl IntoIterator<Item = (&'a str, &'a str)>) {
        self.configuration.add_properties(properties);
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl StoreClient<MemConnector> {
    /// A client of an embedded cluster, configured with its endpoint.
    pub fn embedded(cluster: &MemCluster) -> Self {
        StoreClient::with_configuration(
            cluster.connector(),
            Configuration::from_properties(cluster.properties()),
        )
    }
}
