pub mod client;
pub mod codec;
pub mod compression;
pub mod config;
pub mod error;
pub mod mem;
pub mod statistics;
pub mod store;
pub mod util;

pub use client::{
    CellCheck, ColumnDelete, ColumnFamilyPatch, ColumnPut, DEFAULT_FETCH_SIZE, ResultScan,
    ScanSpec, StoreClient,
};
pub use codec::{FromBytes, Json, ToBytes};
pub use config::{Configuration, Endpoint, Properties};
pub use error::{Error, Result};
pub use mem::{MemCluster, MemConnector};
pub use statistics::Statistics;
pub use store::{
    BloomFilterType, Cell, ColumnFamilyDescriptor, CompressionType, RowResult, TableDescriptor,
};
pub use util::{Code, Status};
