use std::{cmp::Reverse, ops::Bound};

use bytes::{BufMut, Bytes, BytesMut};
use crossbeam_skiplist::SkipMap;

use crate::{
    compression,
    store::{Cell, ColumnFamilyDescriptor, LATEST_TIMESTAMP, TimeRange, descriptor::FOREVER},
    util::Status,
};

/// Sort key of a stored cell.
///
/// Cells of one row are contiguous, grouped by qualifier, and within a
/// qualifier the newest timestamp sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CellKey {
    row: Bytes,
    qualifier: Bytes,
    timestamp: Reverse<i64>,
}

impl CellKey {
    fn new(row: Bytes, qualifier: Bytes, timestamp: i64) -> Self {
        CellKey {
            row,
            qualifier,
            timestamp: Reverse(timestamp),
        }
    }

    /// Smallest key of `row`.
    fn row_start(row: &[u8]) -> Self {
        CellKey::new(Bytes::copy_from_slice(row), Bytes::new(), LATEST_TIMESTAMP)
    }

    /// Smallest key of the first row strictly after `row`.
    fn after_row(row: &[u8]) -> Self {
        let mut next = BytesMut::with_capacity(row.len() + 1);
        next.put_slice(row);
        next.put_u8(0);
        CellKey::new(next.freeze(), Bytes::new(), LATEST_TIMESTAMP)
    }

    fn ts(&self) -> i64 {
        self.timestamp.0
    }
}

/// Cells of one column family, kept sorted in a concurrent skiplist.
///
/// Values are held encoded with the family's compression codec.
pub(crate) struct FamilyStore {
    descriptor: ColumnFamilyDescriptor,
    cells: SkipMap<CellKey, Bytes>,
}

impl FamilyStore {
    pub fn new(descriptor: ColumnFamilyDescriptor) -> Result<Self, Status> {
        check_codec(&descriptor)?;
        Ok(FamilyStore {
            descriptor,
            cells: SkipMap::new(),
        })
    }

    pub fn descriptor(&self) -> &ColumnFamilyDescriptor {
        &self.descriptor
    }

    /// Replace the descriptor, re-encoding stored values if the codec
    /// changed and trimming versions beyond the new limit.
    pub fn set_descriptor(&mut self, descriptor: ColumnFamilyDescriptor) -> Result<(), Status> {
        check_codec(&descriptor)?;
        let old = self.descriptor.compression;
        let new = descriptor.compression;
        if old != new {
            let reencoded = SkipMap::new();
            for entry in self.cells.iter() {
                let raw = compression::decompress(old, entry.value())?;
                reencoded.insert(
                    entry.key().clone(),
                    Bytes::from(compression::compress(new, &raw)?),
                );
            }
            self.cells = reencoded;
        }
        self.descriptor = descriptor;

        let mut last: Option<(Bytes, Bytes)> = None;
        for entry in self.cells.iter() {
            let key = entry.key();
            let column = (key.row.clone(), key.qualifier.clone());
            if last.as_ref() != Some(&column) {
                self.trim_versions(&key.row, &key.qualifier);
                last = Some(column);
            }
        }
        Ok(())
    }

    pub fn put(&self, row: Bytes, qualifier: Bytes, ts: i64, value: &[u8]) -> Result<(), Status> {
        let encoded = compression::compress(self.descriptor.compression, value)?;
        self.cells
            .insert(CellKey::new(row.clone(), qualifier.clone(), ts), Bytes::from(encoded));
        self.trim_versions(&row, &qualifier);
        Ok(())
    }

    /// Drop versions of the column beyond the family's `max_versions`.
    fn trim_versions(&self, row: &Bytes, qualifier: &Bytes) {
        let keep = self.descriptor.max_versions.max(1) as usize;
        let start = CellKey::new(row.clone(), qualifier.clone(), LATEST_TIMESTAMP);
        let stale: Vec<CellKey> = self
            .cells
            .range(start..)
            .take_while(|e| e.key().row == *row && e.key().qualifier == *qualifier)
            .skip(keep)
            .map(|e| e.key().clone())
            .collect();
        for key in stale {
            self.cells.remove(&key);
        }
    }

    fn expired(&self, ts: i64, now: i64) -> bool {
        let ttl = self.descriptor.time_to_live;
        ttl != FOREVER && ts < now.saturating_sub(i64::from(ttl) * 1000)
    }

    /// Visible cells of `row` whose qualifier passes `select`, at most
    /// `max_versions` per qualifier, newest first.
    pub fn read(
        &self,
        row: &[u8],
        family: &Bytes,
        select: impl Fn(&[u8]) -> bool,
        time_range: TimeRange,
        max_versions: u32,
        now: i64,
    ) -> Result<Vec<Cell>, Status> {
        let mut out = Vec::new();
        let mut current: Option<Bytes> = None;
        let mut taken = 0u32;

        for entry in self.cells.range(CellKey::row_start(row)..) {
            let key = entry.key();
            if key.row.as_ref() != row {
                break;
            }
            if current.as_ref() != Some(&key.qualifier) {
                current = Some(key.qualifier.clone());
                taken = 0;
            }
            if taken >= max_versions
                || !time_range.contains(key.ts())
                || self.expired(key.ts(), now)
                || !select(&key.qualifier)
            {
                continue;
            }
            taken += 1;
            out.push(Cell {
                row: key.row.clone(),
                family: family.clone(),
                qualifier: key.qualifier.clone(),
                timestamp: key.ts(),
                value: Bytes::from(compression::decompress(
                    self.descriptor.compression,
                    entry.value(),
                )?),
            });
        }
        Ok(out)
    }

    /// Newest visible value of one column.
    pub fn latest(&self, row: &[u8], qualifier: &[u8], now: i64) -> Result<Option<Bytes>, Status> {
        let start = CellKey::new(
            Bytes::copy_from_slice(row),
            Bytes::copy_from_slice(qualifier),
            LATEST_TIMESTAMP,
        );
        for entry in self.cells.range(start..) {
            let key = entry.key();
            if key.row.as_ref() != row || key.qualifier.as_ref() != qualifier {
                break;
            }
            if self.expired(key.ts(), now) {
                continue;
            }
            let raw = compression::decompress(self.descriptor.compression, entry.value())?;
            return Ok(Some(Bytes::from(raw)));
        }
        Ok(None)
    }

    /// First row `>= from` (or `> from` when excluded) holding any cell.
    pub fn next_row(&self, from: Bound<&[u8]>) -> Option<Bytes> {
        let start = match from {
            Bound::Unbounded => return self.cells.front().map(|e| e.key().row.clone()),
            Bound::Included(row) => CellKey::row_start(row),
            Bound::Excluded(row) => CellKey::after_row(row),
        };
        self.cells.range(start..).next().map(|e| e.key().row.clone())
    }

    /// Remove every cell of `row` with timestamp `<= ts`.
    pub fn delete_row(&self, row: &[u8], ts: i64) -> usize {
        self.remove_where(row, |key| key.ts() <= ts)
    }

    /// Remove every version of the column with timestamp `<= ts`.
    pub fn delete_columns(&self, row: &[u8], qualifier: &[u8], ts: i64) -> usize {
        self.remove_where(row, |key| key.qualifier.as_ref() == qualifier && key.ts() <= ts)
    }

    /// Remove one version: exactly `ts`, or the newest when `ts` is latest.
    pub fn delete_version(&self, row: &[u8], qualifier: &[u8], ts: i64) -> usize {
        if ts != LATEST_TIMESTAMP {
            let key = CellKey::new(
                Bytes::copy_from_slice(row),
                Bytes::copy_from_slice(qualifier),
                ts,
            );
            return usize::from(self.cells.remove(&key).is_some());
        }
        let start = CellKey::new(
            Bytes::copy_from_slice(row),
            Bytes::copy_from_slice(qualifier),
            LATEST_TIMESTAMP,
        );
        let newest = self
            .cells
            .range(start..)
            .next()
            .filter(|e| e.key().row.as_ref() == row && e.key().qualifier.as_ref() == qualifier)
            .map(|e| e.key().clone());
        match newest {
            Some(key) => usize::from(self.cells.remove(&key).is_some()),
            None => 0,
        }
    }

    fn remove_where(&self, row: &[u8], pred: impl Fn(&CellKey) -> bool) -> usize {
        let doomed: Vec<CellKey> = self
            .cells
            .range(CellKey::row_start(row)..)
            .take_while(|e| e.key().row.as_ref() == row)
            .filter(|e| pred(e.key()))
            .map(|e| e.key().clone())
            .collect();
        doomed
            .iter()
            .filter(|key| self.cells.remove(*key).is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

fn check_codec(descriptor: &ColumnFamilyDescriptor) -> Result<(), Status> {
    for codec in [descriptor.compression, descriptor.compaction_compression] {
        if !compression::is_supported(codec) {
            return Err(Status::not_supported(format!(
                "family {}: compression codec {codec:?} is not available",
                descriptor.name
            )));
        }
    }
    Ok(())
}
