use std::sync::atomic::{AtomicU64, Ordering};

/// Cluster-wide statistics
///
/// Thread-safe counters for handle lifecycle and data traffic.
/// Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Handle lifecycle
    pub admins_opened: AtomicU64,
    pub admins_closed: AtomicU64,
    pub tables_opened: AtomicU64,
    pub tables_closed: AtomicU64,
    pub scanners_opened: AtomicU64,
    pub scanners_closed: AtomicU64,

    // Row traffic
    pub num_gets: AtomicU64,
    pub num_puts: AtomicU64,
    pub num_deletes: AtomicU64,
    pub num_increments: AtomicU64,
    pub num_check_and_mutates: AtomicU64,

    // Scans
    pub batches_fetched: AtomicU64,
    pub rows_scanned: AtomicU64,
    pub uncached_scans: AtomicU64,

    // Journal
    pub journal_writes: AtomicU64,
    pub journal_syncs: AtomicU64,
    pub journal_bytes_written: AtomicU64,
    pub unjournaled_writes: AtomicU64,

    pub num_flushes: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_admin_opened(&self) {
        self.admins_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_admin_closed(&self) {
        self.admins_closed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_table_opened(&self) {
        self.tables_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_table_closed(&self) {
        self.tables_closed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_scanner_opened(&self, cache_blocks: bool) {
        self.scanners_opened.fetch_add(1, Ordering::Relaxed);
        if !cache_blocks {
            self.uncached_scans.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_scanner_closed(&self) {
        self.scanners_closed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_get(&self) {
        self.num_gets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_put(&self) {
        self.num_puts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self) {
        self.num_deletes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_increment(&self) {
        self.num_increments.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_check_and_mutate(&self) {
        self.num_check_and_mutates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch(&self, rows: u64) {
        self.batches_fetched.fetch_add(1, Ordering::Relaxed);
        self.rows_scanned.fetch_add(rows, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_journal_write(&self, bytes: u64) {
        self.journal_writes.fetch_add(1, Ordering::Relaxed);
        self.journal_bytes_written
            .fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_journal_sync(&self) {
        self.journal_syncs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unjournaled_write(&self) {
        self.unjournaled_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush(&self) {
        self.num_flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Admin, table and scanner handles currently open.
    pub fn open_handles(&self) -> u64 {
        self.open_admins() + self.open_tables() + self.open_scanners()
    }

    pub fn open_admins(&self) -> u64 {
        load(&self.admins_opened).saturating_sub(load(&self.admins_closed))
    }

    pub fn open_tables(&self) -> u64 {
        load(&self.tables_opened).saturating_sub(load(&self.tables_closed))
    }

    pub fn open_scanners(&self) -> u64 {
        load(&self.scanners_opened).saturating_sub(load(&self.scanners_closed))
    }

    /// Snapshot of every counter.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            admins_opened: load(&self.admins_opened),
            admins_closed: load(&self.admins_closed),
            tables_opened: load(&self.tables_opened),
            tables_closed: load(&self.tables_closed),
            scanners_opened: load(&self.scanners_opened),
            scanners_closed: load(&self.scanners_closed),
            num_gets: load(&self.num_gets),
            num_puts: load(&self.num_puts),
            num_deletes: load(&self.num_deletes),
            num_increments: load(&self.num_increments),
            num_check_and_mutates: load(&self.num_check_and_mutates),
            batches_fetched: load(&self.batches_fetched),
            rows_scanned: load(&self.rows_scanned),
            uncached_scans: load(&self.uncached_scans),
            journal_writes: load(&self.journal_writes),
            journal_syncs: load(&self.journal_syncs),
            journal_bytes_written: load(&self.journal_bytes_written),
            unjournaled_writes: load(&self.unjournaled_writes),
            num_flushes: load(&self.num_flushes),
        }
    }
}

#[inline]
fn load(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

/// Point-in-time copy of [`Statistics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub admins_opened: u64,
    pub admins_closed: u64,
    pub tables_opened: u64,
    pub tables_closed: u64,
    pub scanners_opened: u64,
    pub scanners_closed: u64,
    pub num_gets: u64,
    pub num_puts: u64,
    pub num_deletes: u64,
    pub num_increments: u64,
    pub num_check_and_mutates: u64,
    pub batches_fetched: u64,
    pub rows_scanned: u64,
    pub uncached_scans: u64,
    pub journal_writes: u64,
    pub journal_syncs: u64,
    pub journal_bytes_written: u64,
    pub unjournaled_writes: u64,
    pub num_flushes: u64,
}

impl std::fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Handles:")?;
        writeln!(
            f,
            "  Admin: {} opened, {} closed",
            self.admins_opened, self.admins_closed
        )?;
        writeln!(
            f,
            "  Table: {} opened, {} closed",
            self.tables_opened, self.tables_closed
        )?;
        writeln!(
            f,
            "  Scanner: {} opened, {} closed",
            self.scanners_opened, self.scanners_closed
        )?;
        writeln!(f, "Rows:")?;
        writeln!(
            f,
            "  Gets: {}, Puts: {}, Deletes: {}, Increments: {}, CheckAndMutate: {}",
            self.num_gets,
            self.num_puts,
            self.num_deletes,
            self.num_increments,
            self.num_check_and_mutates
        )?;
        writeln!(
            f,
            "  Scanned: {} rows in {} batches",
            self.rows_scanned, self.batches_fetched
        )?;
        writeln!(f, "Journal:")?;
        write!(
            f,
            "  Writes: {} ({} bytes), Syncs: {}, Skipped: {}",
            self.journal_writes,
            self.journal_bytes_written,
            self.journal_syncs,
            self.unjournaled_writes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_handles() {
        let stats = Statistics::new();
        stats.record_admin_opened();
        stats.record_table_opened();
        stats.record_table_opened();
        stats.record_scanner_opened(true);
        assert_eq!(stats.open_handles(), 4);

        stats.record_admin_closed();
        stats.record_table_closed();
        stats.record_table_closed();
        stats.record_scanner_closed();
        assert_eq!(stats.open_handles(), 0);
    }

    #[test]
    fn test_batches() {
        let stats = Statistics::new();
        stats.record_batch(50);
        stats.record_batch(0);
        let snap = stats.snapshot();
        assert_eq!(snap.batches_fetched, 2);
        assert_eq!(snap.rows_scanned, 50);
    }

    #[test]
    fn test_uncached_scans() {
        let stats = Statistics::new();
        stats.record_scanner_opened(false);
        stats.record_scanner_opened(true);
        assert_eq!(stats.snapshot().uncached_scans, 1);
    }

    #[test]
    fn test_display() {
        let stats = Statistics::new();
        stats.record_journal_write(64);
        let text = stats.snapshot().to_string();
        assert!(text.contains("Writes: 1 (64 bytes)"));
    }
}
