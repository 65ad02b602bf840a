use std::{
    collections::BTreeMap,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::{Mutex, RwLock};

use super::{
    connector::MemConnector,
    journal::{Journal, JournalRecord},
    table::TableEntry,
};
use crate::{
    config::{Endpoint, Properties},
    statistics::Statistics,
    store::{ColumnFamilyDescriptor, TableDescriptor},
    util::Status,
};

/// Shared state behind every handle of one [`MemCluster`].
pub(crate) struct ClusterInner {
    pub endpoint: Endpoint,
    pub statistics: Arc<Statistics>,
    master_running: AtomicBool,
    tables: RwLock<BTreeMap<String, Arc<TableEntry>>>,
    clock: AtomicI64,
    journal: Mutex<Option<Journal>>,
    fail_table_ops: AtomicBool,
    fail_close: AtomicBool,
}

impl ClusterInner {
    /// Wall clock in milliseconds.
    pub fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    /// A store-assigned timestamp, strictly greater than any handed out
    /// before.
    pub fn next_timestamp(&self) -> i64 {
        let now = self.now();
        let mut last = self.clock.load(Ordering::Acquire);
        loop {
            let next = now.max(last + 1);
            match self
                .clock
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    pub fn check_endpoint(&self, props: &Properties) -> Result<(), Status> {
        let requested = props.endpoint()?;
        if requested != self.endpoint {
            return Err(Status::connection_refused(format!(
                "no cluster at {requested}"
            )));
        }
        Ok(())
    }

    pub fn check_master(&self) -> Result<(), Status> {
        if !self.is_master_running() {
            return Err(Status::master_not_running(format!(
                "master of {} is not running",
                self.endpoint
            )));
        }
        Ok(())
    }

    pub fn is_master_running(&self) -> bool {
        self.master_running.load(Ordering::Acquire)
    }

    pub fn check_table_ops(&self) -> Result<(), Status> {
        if self.fail_table_ops.load(Ordering::Acquire) {
            return Err(Status::io_error("region server unreachable"));
        }
        Ok(())
    }

    pub fn check_close(&self) -> Result<(), Status> {
        if self.fail_close.load(Ordering::Acquire) {
            return Err(Status::io_error("connection reset while closing"));
        }
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<Arc<TableEntry>, Status> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Status::table_not_found(name))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Append `records` to the journal when the write is durable and a
    /// journal is configured.
    pub fn log_mutation(&self, records: &[JournalRecord], write_to_wal: bool) -> Result<(), Status> {
        if !write_to_wal {
            self.statistics.record_unjournaled_write();
            return Ok(());
        }
        let mut journal = self.journal.lock();
        if let Some(journal) = journal.as_mut() {
            for record in records {
                let written = journal.append(record)?;
                self.statistics.record_journal_write(written as u64);
            }
        }
        Ok(())
    }

    pub fn create_table(&self, desc: &TableDescriptor) -> Result<(), Status> {
        if desc.name.is_empty() {
            return Err(Status::invalid_argument("table name must not be empty"));
        }
        let mut tables = self.tables.write();
        if tables.contains_key(&desc.name) {
            return Err(Status::table_exists(&desc.name));
        }
        tables.insert(desc.name.clone(), Arc::new(TableEntry::new(desc)?));
        tracing::debug!(table = %desc.name, "created table");
        Ok(())
    }

    pub fn delete_table(&self, name: &str) -> Result<(), Status> {
        let mut tables = self.tables.write();
        let entry = tables.get(name).ok_or_else(|| Status::table_not_found(name))?;
        entry.state.read().check_disabled(name)?;
        tables.remove(name);
        tracing::debug!(table = name, "deleted table");
        Ok(())
    }

    pub fn table_descriptor(&self, name: &str) -> Result<TableDescriptor, Status> {
        Ok(self.table(name)?.state.read().descriptor(name))
    }

    pub fn is_table_disabled(&self, name: &str) -> Result<bool, Status> {
        Ok(!self.table(name)?.state.read().enabled)
    }

    pub fn enable_table(&self, name: &str) -> Result<(), Status> {
        let entry = self.table(name)?;
        let mut state = entry.state.write();
        state.check_disabled(name)?;
        state.enabled = true;
        tracing::debug!(table = name, "enabled table");
        Ok(())
    }

    pub fn disable_table(&self, name: &str) -> Result<(), Status> {
        let entry = self.table(name)?;
        let mut state = entry.state.write();
        state.check_enabled(name)?;
        state.enabled = false;
        tracing::debug!(table = name, "disabled table");
        Ok(())
    }

    pub fn add_column(&self, name: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status> {
        let entry = self.table(name)?;
        let mut state = entry.state.write();
        state.check_disabled(name)?;
        state.add_family(name, family)
    }

    pub fn modify_column(&self, name: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status> {
        let entry = self.table(name)?;
        let mut state = entry.state.write();
        state.check_disabled(name)?;
        state.modify_family(name, family)
    }

    pub fn delete_column(&self, name: &str, family: &str) -> Result<(), Status> {
        let entry = self.table(name)?;
        let mut state = entry.state.write();
        state.check_disabled(name)?;
        state.remove_family(name, family)
    }

    /// Sync the journal. Flushing a table that was just deleted still
    /// persists the deletion, so the table need not exist.
    pub fn flush(&self, name: &str) -> Result<(), Status> {
        tracing::debug!(table = name, "flush");
        if let Some(journal) = self.journal.lock().as_mut() {
            journal.sync()?;
            self.statistics.record_journal_sync();
        }
        self.statistics.record_flush();
        Ok(())
    }
}

/// An in-process store cluster.
///
/// Cloning yields another reference to the same cluster.
///
/// # Example
///
/// ```
/// use rucksbase::{ColumnFamilyDescriptor, MemCluster, TableDescriptor};
///
/// let cluster = MemCluster::new();
/// let mut desc = TableDescriptor::new("orders");
/// desc.set_family(ColumnFamilyDescriptor::new("o"));
/// cluster.create_table(&desc).unwrap();
/// assert!(cluster.table_names().contains(&"orders".to_string()));
/// ```
#[derive(Clone)]
pub struct MemCluster {
    inner: Arc<ClusterInner>,
}

impl Default for MemCluster {
    fn default() -> Self {
        MemCluster::new()
    }
}

impl MemCluster {
    /// A cluster reachable at the default endpoint.
    pub fn new() -> Self {
        MemCluster::with_endpoint(Endpoint::default())
    }

    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        MemCluster {
            inner: Arc::new(ClusterInner {
                endpoint,
                statistics: Arc::new(Statistics::new()),
                master_running: AtomicBool::new(true),
                tables: RwLock::new(BTreeMap::new()),
                clock: AtomicI64::new(0),
                journal: Mutex::new(None),
                fail_table_ops: AtomicBool::new(false),
                fail_close: AtomicBool::new(false),
            }),
        }
    }

    /// Journal durable mutations to `path`, appending to any existing file.
    pub fn open_journal(&self, path: impl AsRef<Path>) -> Result<(), Status> {
        let journal = Journal::open(path)?;
        tracing::debug!(path = %journal.path().display(), "journal opened");
        *self.inner.journal.lock() = Some(journal);
        Ok(())
    }

    /// Re-apply every record of the journal at `path` to the existing
    /// tables, returning the number of records applied.
    ///
    /// Records of tables that no longer exist are skipped.
    pub fn recover(&self, path: impl AsRef<Path>) -> Result<usize, Status> {
        let mut applied = 0;
        for record in Journal::replay(path)? {
            let entry = match self.inner.table(record.table()) {
                Ok(entry) => entry,
                Err(_) => {
                    tracing::warn!(table = record.table(), "skipping journal record of unknown table");
                    continue;
                }
            };
            entry.state.read().apply(&record)?;
            applied += 1;
        }
        tracing::debug!(applied, "journal recovered");
        Ok(applied)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Properties that address this cluster.
    pub fn properties(&self) -> Properties {
        use crate::config::{CLIENT_PORT, QUORUM, ZNODE_PARENT};
        let endpoint = &self.inner.endpoint;
        [
            (QUORUM, endpoint.quorum.clone()),
            (CLIENT_PORT, endpoint.client_port.to_string()),
            (ZNODE_PARENT, endpoint.znode_parent.clone()),
        ]
        .into_iter()
        .collect()
    }

    pub fn connector(&self) -> MemConnector {
        MemConnector::new(self.inner.clone())
    }

    pub fn statistics(&self) -> Arc<Statistics> {
        self.inner.statistics.clone()
    }

    /// Handles currently open against this cluster.
    pub fn open_handles(&self) -> u64 {
        self.inner.statistics.open_handles()
    }

    pub fn stop_master(&self) {
        self.inner.master_running.store(false, Ordering::Release);
    }

    pub fn start_master(&self) {
        self.inner.master_running.store(true, Ordering::Release);
    }

    /// Make every table operation fail with an I/O error.
    pub fn fail_table_ops(&self, fail: bool) {
        self.inner.fail_table_ops.store(fail, Ordering::Release);
    }

    /// Make every handle release fail with an I/O error.
    pub fn fail_close(&self, fail: bool) {
        self.inner.fail_close.store(fail, Ordering::Release);
    }

    /// Create a table directly, bypassing any connection.
    pub fn create_table(&self, desc: &TableDescriptor) -> Result<(), Status> {
        self.inner.create_table(desc)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.inner.tables.read().keys().cloned().collect()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.inner.table_exists(name)
    }
}
