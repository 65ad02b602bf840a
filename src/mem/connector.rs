use std::sync::Arc;

use super::{cluster::ClusterInner, scanner::MemScanner};
use crate::{
    config::Properties,
    store::{
        Admin, ColumnFamilyDescriptor, Connector, Delete, Get, Handle, Put, RowResult, Scan, Table,
        TableDescriptor,
    },
    util::Status,
};

/// Hands out handles to a [`MemCluster`](super::MemCluster).
///
/// A handle that is dropped without [`Handle::close`] stays counted as open
/// in the cluster statistics.
#[derive(Clone)]
pub struct MemConnector {
    cluster: Arc<ClusterInner>,
}

impl MemConnector {
    pub(crate) fn new(cluster: Arc<ClusterInner>) -> Self {
        MemConnector { cluster }
    }
}

impl Connector for MemConnector {
    type Admin = MemAdmin;
    type Table = MemTable;

    fn connect_admin(&self, props: &Properties) -> Result<MemAdmin, Status> {
        self.cluster.check_endpoint(props)?;
        self.cluster.check_master()?;
        self.cluster.statistics.record_admin_opened();
        Ok(MemAdmin {
            cluster: self.cluster.clone(),
            closed: false,
        })
    }

    fn connect_table(&self, props: &Properties, table: &str) -> Result<MemTable, Status> {
        self.cluster.check_endpoint(props)?;
        if !self.cluster.table_exists(table) {
            return Err(Status::table_not_found(table));
        }
        self.cluster.statistics.record_table_opened();
        Ok(MemTable {
            cluster: self.cluster.clone(),
            name: table.to_string(),
            closed: false,
        })
    }
}

fn check_open(closed: bool, what: &str) -> Result<(), Status> {
    if closed {
        return Err(Status::closed(format!("{what} handle is closed")));
    }
    Ok(())
}

/// Administrative handle of the embedded store.
pub struct MemAdmin {
    cluster: Arc<ClusterInner>,
    closed: bool,
}

impl MemAdmin {
    fn live(&self) -> Result<&ClusterInner, Status> {
        check_open(self.closed, "admin")?;
        Ok(&self.cluster)
    }
}

impl Handle for MemAdmin {
    fn close(&mut self) -> Result<(), Status> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cluster.statistics.record_admin_closed();
        self.cluster.check_close()
    }
}

impl Admin for MemAdmin {
    fn is_master_running(&self) -> Result<bool, Status> {
        Ok(self.live()?.is_master_running())
    }

    fn create_table(&self, desc: &TableDescriptor) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.create_table(desc)
    }

    fn table_descriptor(&self, table: &str) -> Result<TableDescriptor, Status> {
        self.live()?.table_descriptor(table)
    }

    fn delete_table(&self, table: &str) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.delete_table(table)
    }

    fn is_table_disabled(&self, table: &str) -> Result<bool, Status> {
        self.live()?.is_table_disabled(table)
    }

    fn enable_table(&self, table: &str) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.enable_table(table)
    }

    fn disable_table(&self, table: &str) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.disable_table(table)
    }

    fn add_column(&self, table: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.add_column(table, family)
    }

    fn modify_column(&self, table: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.modify_column(table, family)
    }

    fn delete_column(&self, table: &str, family: &str) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.check_master()?;
        cluster.delete_column(table, family)
    }

    fn flush(&self, table: &str) -> Result<(), Status> {
        self.live()?.flush(table)
    }
}

/// Table-bound handle of the embedded store.
pub struct MemTable {
    cluster: Arc<ClusterInner>,
    name: String,
    closed: bool,
}

impl MemTable {
    /// The cluster, once the handle is known to be usable.
    fn live(&self) -> Result<&ClusterInner, Status> {
        check_open(self.closed, "table")?;
        self.cluster.check_table_ops()?;
        Ok(&self.cluster)
    }
}

impl Handle for MemTable {
    fn close(&mut self) -> Result<(), Status> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cluster.statistics.record_table_closed();
        self.cluster.check_close()
    }
}

impl Table for MemTable {
    type Scanner = MemScanner;

    fn name(&self) -> &str {
        &self.name
    }

    fn table_descriptor(&self) -> Result<TableDescriptor, Status> {
        self.live()?.table_descriptor(&self.name)
    }

    fn get(&self, get: &Get) -> Result<RowResult, Status> {
        let cluster = self.live()?;
        cluster.table(&self.name)?.get(cluster, get)
    }

    fn put(&self, put: &Put) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.table(&self.name)?.put(cluster, put)
    }

    fn delete(&self, delete: &Delete) -> Result<(), Status> {
        let cluster = self.live()?;
        cluster.table(&self.name)?.delete(cluster, delete)
    }

    fn scanner(&self, scan: &Scan) -> Result<MemScanner, Status> {
        let cluster = self.live()?;
        let entry = cluster.table(&self.name)?;
        MemScanner::open(self.cluster.clone(), entry, scan)
    }

    fn increment_column_value(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        amount: i64,
        write_to_wal: bool,
    ) -> Result<i64, Status> {
        let cluster = self.live()?;
        cluster
            .table(&self.name)?
            .increment(cluster, row, family, qualifier, amount, write_to_wal)
    }

    fn check_and_put(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> Result<bool, Status> {
        let cluster = self.live()?;
        cluster
            .table(&self.name)?
            .check_and_put(cluster, row, family, qualifier, expected, put)
    }

    fn check_and_delete(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> Result<bool, Status> {
        let cluster = self.live()?;
        cluster
            .table(&self.name)?
            .check_and_delete(cluster, row, family, qualifier, expected, delete)
    }
}
