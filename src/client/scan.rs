use std::vec;

use super::StoreClient;
use crate::{
    codec::identifier,
    config::SCANNER_CACHING,
    error::{Error, Result, require_not_blank},
    store::{Connector, Handle, RowResult, Scan, Scanner, Table},
    util::Status,
};

/// Rows fetched per page when a [`ScanSpec`] does not say otherwise.
pub const DEFAULT_FETCH_SIZE: usize = 50;

/// What to scan and how to page through it.
///
/// A qualifier only applies together with a family. A time range takes
/// precedence over a single timestamp.
///
/// # Example
///
/// ```
/// use rucksbase::ScanSpec;
///
/// let spec = ScanSpec::new()
///     .family("o")
///     .start_row("r2")
///     .stop_row("r4")
///     .fetch_size(100);
/// assert_eq!(spec.max_versions, 1);
/// assert!(spec.cache_blocks);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSpec {
    pub family: Option<String>,
    pub qualifier: Option<String>,
    pub timestamp: Option<i64>,
    /// `[min, max)`.
    pub time_range: Option<(i64, i64)>,
    /// Rows the store ships per round trip. Falls back to the
    /// `client.scanner.caching` property.
    pub caching: Option<u32>,
    pub cache_blocks: bool,
    pub max_versions: u32,
    /// Inclusive.
    pub start_row: Option<String>,
    /// Exclusive.
    pub stop_row: Option<String>,
    /// Rows requested from the cursor per page.
    pub fetch_size: usize,
}

impl Default for ScanSpec {
    fn default() -> Self {
        ScanSpec {
            family: None,
            qualifier: None,
            timestamp: None,
            time_range: None,
            caching: None,
            cache_blocks: true,
            max_versions: 1,
            start_row: None,
            stop_row: None,
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }
}

impl ScanSpec {
    pub fn new() -> Self {
        ScanSpec::default()
    }

    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn column(mut self, family: impl Into<String>, qualifier: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn time_range(mut self, min: i64, max: i64) -> Self {
        self.time_range = Some((min, max));
        self
    }

    pub fn caching(mut self, rows: u32) -> Self {
        self.caching = Some(rows);
        self
    }

    pub fn cache_blocks(mut self, cache_blocks: bool) -> Self {
        self.cache_blocks = cache_blocks;
        self
    }

    pub fn max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = max_versions;
        self
    }

    pub fn start_row(mut self, row: impl Into<String>) -> Self {
        self.start_row = Some(row.into());
        self
    }

    pub fn stop_row(mut self, row: impl Into<String>) -> Self {
        self.stop_row = Some(row.into());
        self
    }

    pub fn fetch_size(mut self, rows: usize) -> Self {
        self.fetch_size = rows;
        self
    }
}

/// Translate `spec` into a store scan. `default_caching` applies when the
/// spec sets none.
pub(crate) fn build_scan(spec: &ScanSpec, default_caching: Option<u32>) -> std::result::Result<Scan, Status> {
    let mut scan = Scan::new();
    match (&spec.family, &spec.qualifier) {
        (Some(family), Some(qualifier)) => {
            scan.add_column(identifier(family), identifier(qualifier));
        }
        (Some(family), None) => {
            scan.add_family(identifier(family));
        }
        (None, _) => {}
    }
    match (spec.time_range, spec.timestamp) {
        (Some((min, max)), _) => {
            scan.set_time_range(min, max)?;
        }
        (None, Some(ts)) => {
            scan.set_time_stamp(ts);
        }
        (None, None) => {}
    }
    if let Some(caching) = spec.caching.or(default_caching) {
        scan.set_caching(caching);
    }
    scan.set_cache_blocks(spec.cache_blocks);
    scan.set_max_versions(spec.max_versions)?;
    if let Some(start) = &spec.start_row {
        scan.set_start_row(identifier(start));
    }
    if let Some(stop) = &spec.stop_row {
        scan.set_stop_row(identifier(stop));
    }
    Ok(scan)
}

impl<C: Connector> StoreClient<C> {
    /// Lazily scan `table`.
    ///
    /// The table handle is acquired now; the first page is fetched on the
    /// first call to `next`. The handle and the cursor are released once a
    /// page comes back shorter than `fetch_size`, on an error, on
    /// [`ResultScan::close`], or when the iterator is dropped.
    pub fn scan(&self, table: &str, spec: &ScanSpec) -> Result<ResultScan<C::Table>> {
        require_not_blank("table name", table)?;
        if spec.fetch_size == 0 {
            return Err(Error::InvalidArgument("fetch size must be positive".into()));
        }
        let default_caching = self
            .configuration
            .snapshot()
            .get_parsed::<u32>(SCANNER_CACHING)?;
        let scan = build_scan(spec, default_caching)?;
        let handle = self.open_table(table)?;
        Ok(ResultScan::new(handle, scan, spec.fetch_size))
    }
}

enum ScanState<S> {
    NotStarted,
    HasPage {
        scanner: S,
        rows: vec::IntoIter<RowResult>,
        last_page: bool,
    },
    Exhausted,
}

/// Forward-only iterator over the rows of a scan, fetched in pages.
///
/// A page shorter than the fetch size is the only end-of-data signal, so a
/// range holding an exact multiple of the fetch size costs one extra, empty
/// fetch. After the first error the iterator is exhausted.
pub struct ResultScan<T: Table> {
    table: Option<T>,
    scan: Scan,
    fetch_size: usize,
    state: ScanState<T::Scanner>,
    pages: usize,
}

impl<T: Table> std::fmt::Debug for ResultScan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultScan")
            .field("fetch_size", &self.fetch_size)
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

impl<T: Table> ResultScan<T> {
    fn new(table: T, scan: Scan, fetch_size: usize) -> Self {
        ResultScan {
            table: Some(table),
            scan,
            fetch_size,
            state: ScanState::NotStarted,
            pages: 0,
        }
    }

    /// Pages fetched from the cursor so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ScanState::Exhausted)
    }

    /// Release the cursor and the table handle. Calling it again, or after
    /// the scan ran to its end, does nothing.
    pub fn close(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, ScanState::Exhausted);
        let mut first_err: Option<Status> = None;
        if let ScanState::HasPage { mut scanner, .. } = state {
            if let Err(e) = scanner.close() {
                first_err.get_or_insert(e);
            }
        }
        if let Some(mut table) = self.table.take() {
            if let Err(e) = table.close() {
                first_err.get_or_insert(e);
            }
            tracing::debug!(table = table.name(), pages = self.pages, "scan closed");
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Close after a failure, keeping the failure as the reported error.
    fn abort(&mut self, cause: Status) -> Error {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to release scan after error");
        }
        cause.into()
    }

    fn fetch(&mut self, scanner: &mut T::Scanner) -> std::result::Result<Vec<RowResult>, Status> {
        let batch = scanner.next_batch(self.fetch_size)?;
        self.pages += 1;
        tracing::debug!(page = self.pages, rows = batch.len(), "fetched scan page");
        Ok(batch)
    }

    fn start(&mut self) -> std::result::Result<(), Status> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| Status::closed("scan is closed"))?;
        let mut scanner = table.scanner(&self.scan)?;
        let batch = match self.fetch(&mut scanner) {
            Ok(batch) => batch,
            Err(e) => {
                if let Err(close_err) = scanner.close() {
                    tracing::warn!(error = %close_err, "failed to close scanner");
                }
                return Err(e);
            }
        };
        self.state = ScanState::HasPage {
            last_page: batch.len() < self.fetch_size,
            rows: batch.into_iter(),
            scanner,
        };
        Ok(())
    }
}

impl<T: Table> Iterator for ResultScan<T> {
    type Item = Result<RowResult>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, ScanState::Exhausted) {
                ScanState::Exhausted => return None,
                ScanState::NotStarted => {
                    if let Err(e) = self.start() {
                        return Some(Err(self.abort(e)));
                    }
                }
                ScanState::HasPage {
                    mut scanner,
                    mut rows,
                    last_page,
                } => {
                    if let Some(row) = rows.next() {
                        self.state = ScanState::HasPage {
                            scanner,
                            rows,
                            last_page,
                        };
                        return Some(Ok(row));
                    }
                    if last_page {
                        self.state = ScanState::HasPage {
                            scanner,
                            rows,
                            last_page,
                        };
                        return self.close().err().map(Err);
                    }
                    match self.fetch(&mut scanner) {
                        Ok(batch) => {
                            self.state = ScanState::HasPage {
                                last_page: batch.len() < self.fetch_size,
                                rows: batch.into_iter(),
                                scanner,
                            };
                        }
                        Err(e) => {
                            self.state = ScanState::HasPage {
                                scanner,
                                rows,
                                last_page,
                            };
                            return Some(Err(self.abort(e)));
                        }
                    }
                }
            }
        }
    }
}

impl<T: Table> Drop for ResultScan<T> {
    fn drop(&mut self) {
        if self.table.is_some() {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "failed to release abandoned scan");
            }
        }
    }
}
