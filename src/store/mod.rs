//! The store capability the client layer is built on.
//!
//! A [`Connector`] hands out two kinds of handles: an [`Admin`] for table and
//! family lifecycle, and a [`Table`] bound to one table for row operations.
//! A table handle can open a [`Scanner`] that walks a row range in batches.
//! Every handle must be released with [`Handle::close`]; the client layer
//! guarantees that on every exit path.
//!
//! ```text
//! Connector
//!     ├─→ connect_admin(props)        → Admin
//!     └─→ connect_table(props, name)  → Table
//!                                          └─→ scanner(&Scan) → Scanner
//! ```
//!
//! Handles are not shared between threads by the client; each logical
//! operation acquires its own.

pub mod descriptor;
pub mod request;
pub mod result;

pub use descriptor::{
    BloomFilterType, ColumnFamilyDescriptor, CompressionType, TableDescriptor,
    DEFAULT_MAX_VERSIONS,
};
pub use request::{
    ColumnSelection, Delete, DeleteEntry, Get, LATEST_TIMESTAMP, Put, PutCell, Scan, TimeRange,
};
pub use result::{Cell, RowResult};

use crate::{config::Properties, util::Status};

/// A releasable connection resource.
pub trait Handle {
    /// Release the handle. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), Status>;
}

/// Factory for admin and table handles.
pub trait Connector: Send + Sync {
    type Admin: Admin;
    type Table: Table;

    /// Open an administrative connection using `props`.
    fn connect_admin(&self, props: &Properties) -> Result<Self::Admin, Status>;

    /// Open a connection bound to `table` using `props`.
    fn connect_table(&self, props: &Properties, table: &str) -> Result<Self::Table, Status>;
}

/// Table and column-family lifecycle.
pub trait Admin: Handle {
    fn is_master_running(&self) -> Result<bool, Status>;

    fn create_table(&self, desc: &TableDescriptor) -> Result<(), Status>;

    /// Fails with `TableNotFound` when the table does not exist.
    fn table_descriptor(&self, table: &str) -> Result<TableDescriptor, Status>;

    fn delete_table(&self, table: &str) -> Result<(), Status>;

    fn is_table_disabled(&self, table: &str) -> Result<bool, Status>;

    fn enable_table(&self, table: &str) -> Result<(), Status>;

    fn disable_table(&self, table: &str) -> Result<(), Status>;

    fn add_column(&self, table: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status>;

    fn modify_column(&self, table: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status>;

    fn delete_column(&self, table: &str, family: &str) -> Result<(), Status>;

    /// Persist buffered state of `table`. Also legal right after `table`
    /// was deleted.
    fn flush(&self, table: &str) -> Result<(), Status>;
}

/// Row operations against one table.
pub trait Table: Handle {
    type Scanner: Scanner;

    fn name(&self) -> &str;

    fn table_descriptor(&self) -> Result<TableDescriptor, Status>;

    fn get(&self, get: &Get) -> Result<RowResult, Status>;

    fn put(&self, put: &Put) -> Result<(), Status>;

    fn delete(&self, delete: &Delete) -> Result<(), Status>;

    /// Open a cursor positioned before the first row of `scan`.
    fn scanner(&self, scan: &Scan) -> Result<Self::Scanner, Status>;

    /// Atomically add `amount` to the 64-bit counter at the cell (absent
    /// counts as zero) and return the new value.
    fn increment_column_value(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        amount: i64,
        write_to_wal: bool,
    ) -> Result<i64, Status>;

    /// Apply `put` only if the newest value at the cell equals `expected`
    /// (`None`: the cell must not exist).
    fn check_and_put(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> Result<bool, Status>;

    /// Apply `delete` only if the newest value at the cell equals `expected`
    /// (`None`: the cell must not exist).
    fn check_and_delete(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> Result<bool, Status>;
}

/// Server-side cursor over a row range.
pub trait Scanner: Handle {
    /// Fetch up to `max_rows` further rows. Returns fewer than `max_rows`
    /// only once the range is exhausted.
    fn next_batch(&mut self, max_rows: usize) -> Result<Vec<RowResult>, Status>;
}
