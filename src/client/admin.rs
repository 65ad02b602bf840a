use super::{ColumnFamilyPatch, StoreClient};
use crate::{
    error::{Error, Result, require_not_blank},
    store::{Admin, ColumnFamilyDescriptor, Connector, Table, TableDescriptor},
    util::Status,
};

/// Answer "no" when the store reports the table missing; keep every other
/// failure.
fn missing_table_is_false(
    answer: std::result::Result<bool, Status>,
) -> std::result::Result<bool, Status> {
    match answer {
        Err(status) if status.is_table_not_found() => Ok(false),
        other => other,
    }
}

/// Run a structural change with `table` disabled, then re-enable and flush.
///
/// If the change fails the table is re-enabled before the failure is
/// returned.
fn while_disabled<A: Admin>(
    admin: &A,
    table: &str,
    change: impl FnOnce(&A) -> std::result::Result<(), Status>,
) -> std::result::Result<(), Status> {
    admin.disable_table(table)?;
    if let Err(err) = change(admin) {
        if let Err(e) = admin.enable_table(table) {
            tracing::warn!(table, error = %e, "failed to re-enable table after a failed change");
        }
        return Err(err);
    }
    admin.enable_table(table)?;
    admin.flush(table)
}

impl<C: Connector> StoreClient<C> {
    /// Whether the store's master is reachable and running.
    ///
    /// Never fails: every failure reads as `false`.
    pub fn alive(&self) -> bool {
        match self.with_admin(|admin| admin.is_master_running()) {
            Ok(running) => running,
            Err(err) => {
                match err.status() {
                    Some(status) if status.is_connectivity() => {
                        tracing::debug!(error = %err, "store is not reachable")
                    }
                    _ => tracing::warn!(error = %err, "liveness check failed"),
                }
                false
            }
        }
    }

    /// Create a table with no column families.
    pub fn create_table(&self, name: &str) -> Result<()> {
        require_not_blank("table name", name)?;
        self.with_admin(|admin| {
            admin.create_table(&TableDescriptor::new(name))?;
            admin.flush(name)
        })
    }

    pub fn exists_table(&self, name: &str) -> Result<bool> {
        require_not_blank("table name", name)?;
        self.with_admin(|admin| missing_table_is_false(admin.table_descriptor(name).map(|_| true)))
    }

    /// Disable and delete the table.
    pub fn delete_table(&self, name: &str) -> Result<()> {
        require_not_blank("table name", name)?;
        self.with_admin(|admin| {
            admin.disable_table(name)?;
            admin.delete_table(name)?;
            admin.flush(name)
        })
    }

    /// Whether the table is disabled. A missing table is not disabled.
    pub fn is_disabled_table(&self, name: &str) -> Result<bool> {
        require_not_blank("table name", name)?;
        self.with_admin(|admin| missing_table_is_false(admin.is_table_disabled(name)))
    }

    pub fn enable_table(&self, name: &str) -> Result<()> {
        require_not_blank("table name", name)?;
        self.with_admin(|admin| admin.enable_table(name))
    }

    pub fn disable_table(&self, name: &str) -> Result<()> {
        require_not_blank("table name", name)?;
        self.with_admin(|admin| admin.disable_table(name))
    }

    /// Add a column family, setting only the tunables supplied.
    pub fn add_column(
        &self,
        table: &str,
        family: &str,
        max_versions: Option<u32>,
        in_memory: Option<bool>,
        scope: Option<i32>,
    ) -> Result<()> {
        require_not_blank("table name", table)?;
        require_not_blank("column family", family)?;
        let patch = ColumnFamilyPatch {
            max_versions,
            in_memory,
            replication_scope: scope,
            ..ColumnFamilyPatch::default()
        };
        self.with_admin(|admin| {
            patch.validate()?;
            let desc = patch.apply(&ColumnFamilyDescriptor::new(family));
            while_disabled(admin, table, |admin| admin.add_column(table, &desc))
        })
    }

    /// Whether `table` has the column family, read through a table handle.
    pub fn exists_column(&self, table: &str, family: &str) -> Result<bool> {
        require_not_blank("column family", family)?;
        self.with_table(table, |t| {
            Ok::<_, Status>(t.table_descriptor()?.has_family(family))
        })
    }

    /// Overlay `patch` on the current descriptor of the family.
    ///
    /// Fails with a `NoSuchColumnFamily` service error when the family does
    /// not exist.
    pub fn modify_column(&self, table: &str, family: &str, patch: &ColumnFamilyPatch) -> Result<()> {
        require_not_blank("table name", table)?;
        require_not_blank("column family", family)?;
        self.with_admin(|admin| {
            patch.validate()?;
            let current = admin.table_descriptor(table)?;
            let base = current.family(family).ok_or_else(|| {
                Status::no_such_family(format!("column family {family} does not exist in {table}"))
            })?;
            let desc = patch.apply(base);
            while_disabled(admin, table, |admin| admin.modify_column(table, &desc))
        })
    }

    pub fn delete_column(&self, table: &str, family: &str) -> Result<()> {
        require_not_blank("table name", table)?;
        require_not_blank("column family", family)?;
        self.with_admin(|admin| {
            while_disabled(admin, table, |admin| admin.delete_column(table, family))
        })
    }

    /// The full descriptor of `table`.
    pub fn table_descriptor(&self, table: &str) -> Result<TableDescriptor> {
        require_not_blank("table name", table)?;
        self.with_admin(|admin| admin.table_descriptor(table))
    }
}
