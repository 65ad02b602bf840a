//! Low-level request objects understood by the store.
//!
//! These are the well-formed shapes the client layer translates its
//! optional-parameter calls into. All identifiers are raw bytes.

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;

use crate::util::Status;

/// Timestamp meaning "the newest version" / "assign at apply time".
pub const LATEST_TIMESTAMP: i64 = i64::MAX;

/// Half-open timestamp interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    min: i64,
    max: i64,
}

impl TimeRange {
    /// Every timestamp.
    pub fn all() -> Self {
        TimeRange {
            min: 0,
            max: LATEST_TIMESTAMP,
        }
    }

    pub fn new(min: i64, max: i64) -> Result<Self, Status> {
        if min < 0 || max < min {
            return Err(Status::invalid_argument(format!(
                "invalid time range [{min}, {max})"
            )));
        }
        Ok(TimeRange { min, max })
    }

    /// Exactly one timestamp.
    pub fn at(ts: i64) -> Self {
        TimeRange {
            min: ts,
            max: ts.saturating_add(1),
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    #[inline]
    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.min && ts < self.max
    }

    pub fn is_all(&self) -> bool {
        *self == TimeRange::all()
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::all()
    }
}

/// Which families and columns a read touches.
///
/// An empty selection means every family. A family mapped to `None` means
/// every qualifier of that family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    families: BTreeMap<Bytes, Option<BTreeSet<Bytes>>>,
}

impl ColumnSelection {
    pub fn add_family(&mut self, family: Bytes) {
        self.families.insert(family, None);
    }

    /// Narrow `family` to `qualifier` (plus any qualifiers already added).
    pub fn add_column(&mut self, family: Bytes, qualifier: Bytes) {
        self.families
            .entry(family)
            .or_insert(None)
            .get_or_insert_with(BTreeSet::new)
            .insert(qualifier);
    }

    pub fn is_all(&self) -> bool {
        self.families.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &Bytes> {
        self.families.keys()
    }

    pub fn selects_family(&self, family: &[u8]) -> bool {
        self.is_all() || self.families.contains_key(family)
    }

    pub fn selects(&self, family: &[u8], qualifier: &[u8]) -> bool {
        if self.is_all() {
            return true;
        }
        match self.families.get(family) {
            None => false,
            Some(None) => true,
            Some(Some(qualifiers)) => qualifiers.contains(qualifier),
        }
    }
}

fn check_max_versions(max_versions: u32) -> Result<u32, Status> {
    if max_versions == 0 {
        return Err(Status::invalid_argument("max versions must be positive"));
    }
    Ok(max_versions)
}

/// Point read of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    pub row: Bytes,
    pub columns: ColumnSelection,
    pub time_range: TimeRange,
    pub max_versions: u32,
}

impl Get {
    pub fn new(row: Bytes) -> Self {
        Get {
            row,
            columns: ColumnSelection::default(),
            time_range: TimeRange::all(),
            max_versions: 1,
        }
    }

    pub fn add_family(&mut self, family: Bytes) -> &mut Self {
        self.columns.add_family(family);
        self
    }

    pub fn add_column(&mut self, family: Bytes, qualifier: Bytes) -> &mut Self {
        self.columns.add_column(family, qualifier);
        self
    }

    pub fn set_time_stamp(&mut self, ts: i64) -> &mut Self {
        self.time_range = TimeRange::at(ts);
        self
    }

    pub fn set_time_range(&mut self, min: i64, max: i64) -> Result<&mut Self, Status> {
        self.time_range = TimeRange::new(min, max)?;
        Ok(self)
    }

    pub fn set_max_versions(&mut self, max_versions: u32) -> Result<&mut Self, Status> {
        self.max_versions = check_max_versions(max_versions)?;
        Ok(self)
    }
}

/// One cell of a [`Put`]. A `None` timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCell {
    pub family: Bytes,
    pub qualifier: Bytes,
    pub timestamp: Option<i64>,
    pub value: Bytes,
}

/// Write of one or more cells to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Put {
    pub row: Bytes,
    pub cells: Vec<PutCell>,
    /// Journal the write before acknowledging it.
    pub write_to_wal: bool,
}

impl Put {
    pub fn new(row: Bytes) -> Self {
        Put {
            row,
            cells: Vec::new(),
            write_to_wal: true,
        }
    }

    pub fn add(&mut self, family: Bytes, qualifier: Bytes, value: Bytes) -> &mut Self {
        self.cells.push(PutCell {
            family,
            qualifier,
            timestamp: None,
            value,
        });
        self
    }

    pub fn add_with_timestamp(
        &mut self,
        family: Bytes,
        qualifier: Bytes,
        ts: i64,
        value: Bytes,
    ) -> &mut Self {
        self.cells.push(PutCell {
            family,
            qualifier,
            timestamp: Some(ts),
            value,
        });
        self
    }

    pub fn set_write_to_wal(&mut self, write_to_wal: bool) -> &mut Self {
        self.write_to_wal = write_to_wal;
        self
    }
}

/// What a single [`Delete`] entry removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteEntry {
    /// Every cell of the family with timestamp `<= timestamp`.
    Family { family: Bytes, timestamp: i64 },
    /// Every version of the column with timestamp `<= timestamp`.
    Columns {
        family: Bytes,
        qualifier: Bytes,
        timestamp: i64,
    },
    /// A single version of the column: the one at `timestamp`, or the newest
    /// when `timestamp` is [`LATEST_TIMESTAMP`].
    Column {
        family: Bytes,
        qualifier: Bytes,
        timestamp: i64,
    },
}

/// Removal of cells from a single row.
///
/// With no entries the whole row is deleted up to `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub row: Bytes,
    pub timestamp: i64,
    pub entries: Vec<DeleteEntry>,
    pub write_to_wal: bool,
}

impl Delete {
    pub fn new(row: Bytes, timestamp: i64) -> Self {
        Delete {
            row,
            timestamp,
            entries: Vec::new(),
            write_to_wal: true,
        }
    }

    pub fn delete_family(&mut self, family: Bytes, timestamp: i64) -> &mut Self {
        self.entries.push(DeleteEntry::Family { family, timestamp });
        self
    }

    pub fn delete_columns(&mut self, family: Bytes, qualifier: Bytes, timestamp: i64) -> &mut Self {
        self.entries.push(DeleteEntry::Columns {
            family,
            qualifier,
            timestamp,
        });
        self
    }

    pub fn delete_column(&mut self, family: Bytes, qualifier: Bytes, timestamp: i64) -> &mut Self {
        self.entries.push(DeleteEntry::Column {
            family,
            qualifier,
            timestamp,
        });
        self
    }

    pub fn is_whole_row(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Range read over `[start_row, stop_row)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub columns: ColumnSelection,
    pub time_range: TimeRange,
    pub max_versions: u32,
    pub start_row: Option<Bytes>,
    pub stop_row: Option<Bytes>,
    /// Rows the store should ship per round trip.
    pub caching: Option<u32>,
    pub cache_blocks: bool,
}

impl Default for Scan {
    fn default() -> Self {
        Scan {
            columns: ColumnSelection::default(),
            time_range: TimeRange::all(),
            max_versions: 1,
            start_row: None,
            stop_row: None,
            caching: None,
            cache_blocks: true,
        }
    }
}

impl Scan {
    pub fn new() -> Self {
        Scan::default()
    }

    pub fn add_family(&mut self, family: Bytes) -> &mut Self {
        self.columns.add_family(family);
        self
    }

    pub fn add_column(&mut self, family: Bytes, qualifier: Bytes) -> &mut Self {
        self.columns.add_column(family, qualifier);
        self
    }

    pub fn set_time_stamp(&mut self, ts: i64) -> &mut Self {
        self.time_range = TimeRange::at(ts);
        self
    }

    pub fn set_time_range(&mut self, min: i64, max: i64) -> Result<&mut Self, Status> {
        self.time_range = TimeRange::new(min, max)?;
        Ok(self)
    }

    pub fn set_max_versions(&mut self, max_versions: u32) -> Result<&mut Self, Status> {
        self.max_versions = check_max_versions(max_versions)?;
        Ok(self)
    }

    pub fn set_caching(&mut self, rows: u32) -> &mut Self {
        self.caching = Some(rows);
        self
    }

    pub fn set_cache_blocks(&mut self, cache_blocks: bool) -> &mut Self {
        self.cache_blocks = cache_blocks;
        self
    }

    pub fn set_start_row(&mut self, row: Bytes) -> &mut Self {
        self.start_row = Some(row);
        self
    }

    pub fn set_stop_row(&mut self, row: Bytes) -> &mut Self {
        self.stop_row = Some(row);
        self
    }

    /// Whether `row` falls inside `[start_row, stop_row)`.
    pub fn in_range(&self, row: &[u8]) -> bool {
        let after_start = self.start_row.as_deref().is_none_or(|start| row >= start);
        let before_stop = self
            .stop_row
            .as_deref()
            .is_none_or(|stop| stop.is_empty() || row < stop);
        after_start && before_stop
    }
}
