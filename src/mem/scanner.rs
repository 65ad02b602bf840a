use std::{ops::Bound, sync::Arc};

use bytes::Bytes;

use super::{cluster::ClusterInner, table::TableEntry};
use crate::{
    store::{Handle, RowResult, Scan, Scanner},
    util::Status,
};

/// Cursor over a row range of an embedded table.
///
/// The cursor remembers the last row it returned, so rows written behind it
/// are not revisited and rows written ahead of it are picked up.
pub struct MemScanner {
    cluster: Arc<ClusterInner>,
    entry: Arc<TableEntry>,
    scan: Scan,
    last_row: Option<Bytes>,
    exhausted: bool,
    closed: bool,
}

impl MemScanner {
    pub(crate) fn open(
        cluster: Arc<ClusterInner>,
        entry: Arc<TableEntry>,
        scan: &Scan,
    ) -> Result<Self, Status> {
        {
            let state = entry.state.read();
            state.check_enabled(&entry.name)?;
            state.selected(&scan.columns)?;
        }
        cluster.statistics.record_scanner_opened(scan.cache_blocks);
        tracing::debug!(
            table = %entry.name,
            caching = ?scan.caching,
            cache_blocks = scan.cache_blocks,
            "scanner opened"
        );
        Ok(MemScanner {
            cluster,
            entry,
            scan: scan.clone(),
            last_row: None,
            exhausted: false,
            closed: false,
        })
    }

    fn lower_bound(&self) -> Bound<&[u8]> {
        match (&self.last_row, &self.scan.start_row) {
            (Some(last), _) => Bound::Excluded(last.as_ref()),
            (None, Some(start)) => Bound::Included(start.as_ref()),
            (None, None) => Bound::Unbounded,
        }
    }
}

impl Scanner for MemScanner {
    fn next_batch(&mut self, max_rows: usize) -> Result<Vec<RowResult>, Status> {
        if self.closed {
            return Err(Status::closed("scanner is closed"));
        }
        if max_rows == 0 {
            return Err(Status::invalid_argument("batch size must be positive"));
        }
        self.cluster.check_table_ops()?;

        let mut batch = Vec::new();
        if self.exhausted {
            self.cluster.statistics.record_batch(0);
            return Ok(batch);
        }

        let entry = self.entry.clone();
        let state = entry.state.read();
        state.check_enabled(&entry.name)?;
        let families = state.selected(&self.scan.columns)?;
        let now = self.cluster.now();

        while batch.len() < max_rows {
            let bound = self.lower_bound();
            let next = families
                .iter()
                .filter_map(|(_, store)| store.next_row(bound))
                .min();
            let row = match next {
                Some(row) if self.scan.in_range(&row) => row,
                _ => {
                    self.exhausted = true;
                    break;
                }
            };
            let result = state.read_row(
                &row,
                &self.scan.columns,
                self.scan.time_range,
                self.scan.max_versions,
                now,
            )?;
            self.last_row = Some(row);
            if !result.is_empty() {
                batch.push(result);
            }
        }

        self.cluster.statistics.record_batch(batch.len() as u64);
        Ok(batch)
    }
}

impl Handle for MemScanner {
    fn close(&mut self) -> Result<(), Status> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cluster.statistics.record_scanner_closed();
        tracing::debug!(table = %self.entry.name, "scanner closed");
        self.cluster.check_close()
    }
}
