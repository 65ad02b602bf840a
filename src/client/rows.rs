use bytes::Bytes;

use super::StoreClient;
use crate::{
    codec::{ToBytes, identifier},
    error::{Result, require_not_blank},
    store::{Connector, Delete, Get, LATEST_TIMESTAMP, Put, RowResult, Table},
    util::Status,
};

/// The cell a conditional mutation tests, and the value it must hold.
///
/// `expected: None` means the cell must not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCheck {
    pub family: String,
    pub qualifier: String,
    pub expected: Option<Bytes>,
}

impl CellCheck {
    /// The cell must currently hold `value`.
    pub fn equals(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl ToBytes,
    ) -> Result<Self> {
        Ok(CellCheck {
            family: family.into(),
            qualifier: qualifier.into(),
            expected: Some(value.to_bytes()?),
        })
    }

    /// The cell must not exist.
    pub fn absent(family: impl Into<String>, qualifier: impl Into<String>) -> Self {
        CellCheck {
            family: family.into(),
            qualifier: qualifier.into(),
            expected: None,
        }
    }
}

/// A single-cell write guarded by a [`CellCheck`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPut {
    pub family: String,
    pub qualifier: String,
    /// `None`: assigned by the store when applied.
    pub timestamp: Option<i64>,
    pub value: Bytes,
    pub write_to_wal: bool,
}

impl ColumnPut {
    pub fn new(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl ToBytes,
    ) -> Result<Self> {
        Ok(ColumnPut {
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp: None,
            value: value.to_bytes()?,
            write_to_wal: true,
        })
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn write_to_wal(mut self, write_to_wal: bool) -> Self {
        self.write_to_wal = write_to_wal;
        self
    }
}

/// What a delete removes from a row.
///
/// | family | qualifier | removes |
/// |---|---|---|
/// | `None` | ignored | the whole row |
/// | `Some` | `None` | the family |
/// | `Some` | `Some` | one version, or all with `delete_all_versions` |
///
/// Everything is cut off at `timestamp`, or at the newest version when it
/// is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDelete {
    pub family: Option<String>,
    pub qualifier: Option<String>,
    pub timestamp: Option<i64>,
    pub delete_all_versions: bool,
}

impl ColumnDelete {
    pub fn row() -> Self {
        ColumnDelete::default()
    }

    pub fn family(family: impl Into<String>) -> Self {
        ColumnDelete {
            family: Some(family.into()),
            ..ColumnDelete::default()
        }
    }

    pub fn column(family: impl Into<String>, qualifier: impl Into<String>) -> Self {
        ColumnDelete {
            family: Some(family.into()),
            qualifier: Some(qualifier.into()),
            ..ColumnDelete::default()
        }
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn all_versions(mut self, delete_all_versions: bool) -> Self {
        self.delete_all_versions = delete_all_versions;
        self
    }
}

/// Point read of `row`. A qualifier only narrows a given family.
pub(crate) fn build_get(
    row: &str,
    family: Option<&str>,
    qualifier: Option<&str>,
    max_versions: Option<u32>,
    timestamp: Option<i64>,
) -> std::result::Result<Get, Status> {
    let mut get = Get::new(identifier(row));
    match (family, qualifier) {
        (Some(family), Some(qualifier)) => {
            get.add_column(identifier(family), identifier(qualifier));
        }
        (Some(family), None) => {
            get.add_family(identifier(family));
        }
        (None, _) => {}
    }
    if let Some(max_versions) = max_versions {
        get.set_max_versions(max_versions)?;
    }
    if let Some(ts) = timestamp {
        get.set_time_stamp(ts);
    }
    Ok(get)
}

pub(crate) fn build_put(
    row: &str,
    family: &str,
    qualifier: &str,
    timestamp: Option<i64>,
    value: Bytes,
    write_to_wal: bool,
) -> Put {
    let mut put = Put::new(identifier(row));
    match timestamp {
        Some(ts) => put.add_with_timestamp(identifier(family), identifier(qualifier), ts, value),
        None => put.add(identifier(family), identifier(qualifier), value),
    };
    put.set_write_to_wal(write_to_wal);
    put
}

pub(crate) fn build_delete(row: &str, target: &ColumnDelete) -> Delete {
    let cutoff = target.timestamp.unwrap_or(LATEST_TIMESTAMP);
    let mut delete = Delete::new(identifier(row), LATEST_TIMESTAMP);
    match (&target.family, &target.qualifier) {
        (Some(family), Some(qualifier)) if target.delete_all_versions => {
            delete.delete_columns(identifier(family), identifier(qualifier), cutoff);
        }
        (Some(family), Some(qualifier)) => {
            delete.delete_column(identifier(family), identifier(qualifier), cutoff);
        }
        (Some(family), None) => {
            delete.delete_family(identifier(family), cutoff);
        }
        (None, _) => {}
    }
    delete
}

impl<C: Connector> StoreClient<C> {
    /// Read `row`.
    ///
    /// With no family every family is returned; a qualifier narrows the
    /// given family. `max_versions` bounds the versions per column
    /// (default 1), and `timestamp` selects exactly that version. A missing
    /// row is an empty result.
    pub fn get(
        &self,
        table: &str,
        row: &str,
        family: Option<&str>,
        qualifier: Option<&str>,
        max_versions: Option<u32>,
        timestamp: Option<i64>,
    ) -> Result<RowResult> {
        self.with_table(table, |t| {
            let get = build_get(row, family, qualifier, max_versions, timestamp)?;
            t.get(&get)
        })
    }

    /// Whether `row` has any visible cell.
    pub fn exists(
        &self,
        table: &str,
        row: &str,
        max_versions: Option<u32>,
        timestamp: Option<i64>,
    ) -> Result<bool> {
        let result = self.get(table, row, None, None, max_versions, timestamp)?;
        Ok(!result.is_empty())
    }

    /// Write `value` to one cell. Without a timestamp the store assigns
    /// one. With `write_to_wal` off the write is acknowledged before it is
    /// journaled and may be lost in a crash.
    #[allow(clippy::too_many_arguments)]
    pub fn put<V: ToBytes + ?Sized>(
        &self,
        table: &str,
        row: &str,
        family: &str,
        qualifier: &str,
        timestamp: Option<i64>,
        value: &V,
        write_to_wal: bool,
    ) -> Result<()> {
        self.with_table(table, |t| {
            let put = build_put(row, family, qualifier, timestamp, value.to_bytes()?, write_to_wal);
            t.put(&put)
        })
    }

    /// Delete from `row`; see [`ColumnDelete`] for the shapes.
    pub fn delete(
        &self,
        table: &str,
        row: &str,
        family: Option<&str>,
        qualifier: Option<&str>,
        timestamp: Option<i64>,
        delete_all_versions: bool,
    ) -> Result<()> {
        let target = ColumnDelete {
            family: family.map(str::to_string),
            qualifier: qualifier.map(str::to_string),
            timestamp,
            delete_all_versions,
        };
        self.with_table(table, |t| t.delete(&build_delete(row, &target)))
    }

    /// Atomically add `amount` to the counter at the cell and return the
    /// new value. An absent cell counts as zero.
    pub fn increment(
        &self,
        table: &str,
        row: &str,
        family: &str,
        qualifier: &str,
        amount: i64,
        write_to_wal: bool,
    ) -> Result<i64> {
        require_not_blank("table name", table)?;
        require_not_blank("row", row)?;
        require_not_blank("column family", family)?;
        require_not_blank("column qualifier", qualifier)?;
        self.with_table(table, |t| {
            t.increment_column_value(
                row.as_bytes(),
                family.as_bytes(),
                qualifier.as_bytes(),
                amount,
                write_to_wal,
            )
        })
    }

    /// Apply `put` to `row` only if `check` holds. Returns whether it was
    /// applied.
    pub fn check_and_put(
        &self,
        table: &str,
        row: &str,
        check: &CellCheck,
        put: &ColumnPut,
    ) -> Result<bool> {
        self.with_table(table, |t| {
            let mutation = build_put(
                row,
                &put.family,
                &put.qualifier,
                put.timestamp,
                put.value.clone(),
                put.write_to_wal,
            );
            t.check_and_put(
                row.as_bytes(),
                check.family.as_bytes(),
                check.qualifier.as_bytes(),
                check.expected.as_deref(),
                &mutation,
            )
        })
    }

    /// Apply `delete` to `row` only if `check` holds. Returns whether it
    /// was applied.
    pub fn check_and_delete(
        &self,
        table: &str,
        row: &str,
        check: &CellCheck,
        delete: &ColumnDelete,
    ) -> Result<bool> {
        self.with_table(table, |t| {
            t.check_and_delete(
                row.as_bytes(),
                check.family.as_bytes(),
                check.qualifier.as_bytes(),
                check.expected.as_deref(),
                &build_delete(row, delete),
            )
        })
    }
}
