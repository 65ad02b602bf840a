use std::collections::BTreeMap;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use super::{cluster::ClusterInner, family::FamilyStore, journal::JournalRecord};
use crate::{
    store::{
        ColumnFamilyDescriptor, ColumnSelection, Delete, DeleteEntry, Get, LATEST_TIMESTAMP, Put,
        RowResult, TableDescriptor, TimeRange,
    },
    util::Status,
};

/// Schema, enablement and data of one table.
pub(crate) struct TableState {
    pub enabled: bool,
    families: BTreeMap<Bytes, FamilyStore>,
}

impl TableState {
    pub fn check_enabled(&self, table: &str) -> Result<(), Status> {
        if !self.enabled {
            return Err(Status::table_not_enabled(table));
        }
        Ok(())
    }

    pub fn check_disabled(&self, table: &str) -> Result<(), Status> {
        if self.enabled {
            return Err(Status::table_not_disabled(table));
        }
        Ok(())
    }

    pub fn family(&self, name: &[u8]) -> Result<&FamilyStore, Status> {
        self.families.get(name).ok_or_else(|| {
            Status::no_such_family(format!(
                "column family {} does not exist",
                String::from_utf8_lossy(name)
            ))
        })
    }

    pub fn descriptor(&self, table: &str) -> TableDescriptor {
        let mut desc = TableDescriptor::new(table);
        for store in self.families.values() {
            desc.set_family(store.descriptor().clone());
        }
        desc
    }

    pub fn add_family(&mut self, table: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status> {
        let key = Bytes::copy_from_slice(family.name.as_bytes());
        if self.families.contains_key(&key) {
            return Err(Status::invalid_family_operation(format!(
                "family {} already exists in {table}",
                family.name
            )));
        }
        self.families.insert(key, FamilyStore::new(family.clone())?);
        Ok(())
    }

    pub fn modify_family(&mut self, table: &str, family: &ColumnFamilyDescriptor) -> Result<(), Status> {
        match self.families.get_mut(family.name.as_bytes()) {
            Some(store) => store.set_descriptor(family.clone()),
            None => Err(Status::invalid_family_operation(format!(
                "family {} does not exist in {table}",
                family.name
            ))),
        }
    }

    pub fn remove_family(&mut self, table: &str, family: &str) -> Result<(), Status> {
        match self.families.remove(family.as_bytes()) {
            Some(_) => Ok(()),
            None => Err(Status::invalid_family_operation(format!(
                "family {family} does not exist in {table}"
            ))),
        }
    }

    /// Family stores touched by `columns`, in family order.
    pub fn selected<'a>(
        &'a self,
        columns: &'a ColumnSelection,
    ) -> Result<Vec<(&'a Bytes, &'a FamilyStore)>, Status> {
        for family in columns.families() {
            self.family(family)?;
        }
        Ok(self
            .families
            .iter()
            .filter(|(name, _)| columns.selects_family(name))
            .collect())
    }

    pub fn read_row(
        &self,
        row: &[u8],
        columns: &ColumnSelection,
        time_range: TimeRange,
        max_versions: u32,
        now: i64,
    ) -> Result<RowResult, Status> {
        let mut cells = Vec::new();
        for (name, store) in self.selected(columns)? {
            cells.extend(store.read(
                row,
                name,
                |q| columns.selects(name, q),
                time_range,
                max_versions,
                now,
            )?);
        }
        Ok(RowResult::new(Bytes::copy_from_slice(row), cells))
    }

    /// Apply one journaled mutation.
    pub fn apply(&self, record: &JournalRecord) -> Result<(), Status> {
        match record {
            JournalRecord::Put {
                row,
                family,
                qualifier,
                timestamp,
                value,
                ..
            } => self
                .family(family)?
                .put(row.clone(), qualifier.clone(), *timestamp, value),
            JournalRecord::DeleteRow { row, timestamp, .. } => {
                for store in self.families.values() {
                    store.delete_row(row, *timestamp);
                }
                Ok(())
            }
            JournalRecord::DeleteFamily {
                row,
                family,
                timestamp,
                ..
            } => {
                self.family(family)?.delete_row(row, *timestamp);
                Ok(())
            }
            JournalRecord::DeleteColumns {
                row,
                family,
                qualifier,
                timestamp,
                ..
            } => {
                self.family(family)?.delete_columns(row, qualifier, *timestamp);
                Ok(())
            }
            JournalRecord::DeleteVersion {
                row,
                family,
                qualifier,
                timestamp,
                ..
            } => {
                self.family(family)?.delete_version(row, qualifier, *timestamp);
                Ok(())
            }
        }
    }
}

/// A table of the embedded store.
///
/// Reads take the state lock shared. Mutations additionally hold the
/// mutation lock so read-modify-write operations are atomic. Schema changes
/// take the state lock exclusively.
pub(crate) struct TableEntry {
    pub name: String,
    pub state: RwLock<TableState>,
    mutation: Mutex<()>,
}

impl TableEntry {
    pub fn new(desc: &TableDescriptor) -> Result<Self, Status> {
        let mut state = TableState {
            enabled: true,
            families: BTreeMap::new(),
        };
        for family in desc.families() {
            state.add_family(&desc.name, family)?;
        }
        Ok(TableEntry {
            name: desc.name.clone(),
            state: RwLock::new(state),
            mutation: Mutex::new(()),
        })
    }

    pub fn get(&self, cluster: &ClusterInner, get: &Get) -> Result<RowResult, Status> {
        let state = self.state.read();
        state.check_enabled(&self.name)?;
        cluster.statistics.record_get();
        state.read_row(
            &get.row,
            &get.columns,
            get.time_range,
            get.max_versions,
            cluster.now(),
        )
    }

    pub fn put(&self, cluster: &ClusterInner, put: &Put) -> Result<(), Status> {
        let _guard = self.mutation.lock();
        let state = self.state.read();
        state.check_enabled(&self.name)?;
        let records = self.put_records(cluster, &state, put)?;
        cluster.statistics.record_put();
        self.commit(cluster, &state, &records, put.write_to_wal)
    }

    pub fn delete(&self, cluster: &ClusterInner, delete: &Delete) -> Result<(), Status> {
        let _guard = self.mutation.lock();
        let state = self.state.read();
        state.check_enabled(&self.name)?;
        let records = self.delete_records(&state, delete)?;
        cluster.statistics.record_delete();
        self.commit(cluster, &state, &records, delete.write_to_wal)
    }

    pub fn increment(
        &self,
        cluster: &ClusterInner,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        amount: i64,
        write_to_wal: bool,
    ) -> Result<i64, Status> {
        check_row(row)?;
        let _guard = self.mutation.lock();
        let state = self.state.read();
        state.check_enabled(&self.name)?;

        let current = state.family(family)?.latest(row, qualifier, cluster.now())?;
        let old = match current {
            None => 0,
            Some(value) => {
                let raw: [u8; 8] = value.as_ref().try_into().map_err(|_| {
                    Status::invalid_argument("attempted to increment a field that is not 64 bits wide")
                })?;
                i64::from_be_bytes(raw)
            }
        };
        let new = old
            .checked_add(amount)
            .ok_or_else(|| Status::invalid_argument("increment overflows a 64-bit counter"))?;

        let record = JournalRecord::Put {
            table: self.name.clone(),
            row: Bytes::copy_from_slice(row),
            family: Bytes::copy_from_slice(family),
            qualifier: Bytes::copy_from_slice(qualifier),
            timestamp: cluster.next_timestamp(),
            value: Bytes::copy_from_slice(&new.to_be_bytes()),
        };
        cluster.statistics.record_increment();
        self.commit(cluster, &state, &[record], write_to_wal)?;
        Ok(new)
    }

    pub fn check_and_put(
        &self,
        cluster: &ClusterInner,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> Result<bool, Status> {
        check_same_row(row, &put.row)?;
        let _guard = self.mutation.lock();
        let state = self.state.read();
        state.check_enabled(&self.name)?;
        cluster.statistics.record_check_and_mutate();

        if !self.current_matches(cluster, &state, row, family, qualifier, expected)? {
            return Ok(false);
        }
        let records = self.put_records(cluster, &state, put)?;
        self.commit(cluster, &state, &records, put.write_to_wal)?;
        Ok(true)
    }

    pub fn check_and_delete(
        &self,
        cluster: &ClusterInner,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> Result<bool, Status> {
        check_same_row(row, &delete.row)?;
        let _guard = self.mutation.lock();
        let state = self.state.read();
        state.check_enabled(&self.name)?;
        cluster.statistics.record_check_and_mutate();

        if !self.current_matches(cluster, &state, row, family, qualifier, expected)? {
            return Ok(false);
        }
        let records = self.delete_records(&state, delete)?;
        self.commit(cluster, &state, &records, delete.write_to_wal)?;
        Ok(true)
    }

    fn current_matches(
        &self,
        cluster: &ClusterInner,
        state: &TableState,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
    ) -> Result<bool, Status> {
        let current = state.family(family)?.latest(row, qualifier, cluster.now())?;
        Ok(match (expected, current) {
            (None, None) => true,
            (Some(expected), Some(current)) => expected == current.as_ref(),
            _ => false,
        })
    }

    fn put_records(
        &self,
        cluster: &ClusterInner,
        state: &TableState,
        put: &Put,
    ) -> Result<Vec<JournalRecord>, Status> {
        check_row(&put.row)?;
        if put.cells.is_empty() {
            return Err(Status::invalid_argument("put carries no cells"));
        }
        // Every cell without an explicit timestamp shares one assigned instant.
        let mut assigned = None;
        let mut records = Vec::with_capacity(put.cells.len());
        for cell in &put.cells {
            state.family(&cell.family)?;
            let timestamp = match cell.timestamp {
                Some(ts) if ts != LATEST_TIMESTAMP => ts,
                _ => *assigned.get_or_insert_with(|| cluster.next_timestamp()),
            };
            records.push(JournalRecord::Put {
                table: self.name.clone(),
                row: put.row.clone(),
                family: cell.family.clone(),
                qualifier: cell.qualifier.clone(),
                timestamp,
                value: cell.value.clone(),
            });
        }
        Ok(records)
    }

    fn delete_records(&self, state: &TableState, delete: &Delete) -> Result<Vec<JournalRecord>, Status> {
        check_row(&delete.row)?;
        let table = self.name.clone();
        let row = delete.row.clone();
        if delete.is_whole_row() {
            return Ok(vec![JournalRecord::DeleteRow {
                table,
                row,
                timestamp: delete.timestamp,
            }]);
        }

        let mut records = Vec::with_capacity(delete.entries.len());
        for entry in &delete.entries {
            let record = match entry {
                DeleteEntry::Family { family, timestamp } => {
                    state.family(family)?;
                    JournalRecord::DeleteFamily {
                        table: table.clone(),
                        row: row.clone(),
                        family: family.clone(),
                        timestamp: *timestamp,
                    }
                }
                DeleteEntry::Columns {
                    family,
                    qualifier,
                    timestamp,
                } => {
                    state.family(family)?;
                    JournalRecord::DeleteColumns {
                        table: table.clone(),
                        row: row.clone(),
                        family: family.clone(),
                        qualifier: qualifier.clone(),
                        timestamp: *timestamp,
                    }
                }
                DeleteEntry::Column {
                    family,
                    qualifier,
                    timestamp,
                } => {
                    state.family(family)?;
                    JournalRecord::DeleteVersion {
                        table: table.clone(),
                        row: row.clone(),
                        family: family.clone(),
                        qualifier: qualifier.clone(),
                        timestamp: *timestamp,
                    }
                }
            };
            records.push(record);
        }
        Ok(records)
    }

    /// Journal `records` when durable, then apply them.
    fn commit(
        &self,
        cluster: &ClusterInner,
        state: &TableState,
        records: &[JournalRecord],
        write_to_wal: bool,
    ) -> Result<(), Status> {
        cluster.log_mutation(records, write_to_wal)?;
        for record in records {
            state.apply(record)?;
        }
        Ok(())
    }
}

fn check_row(row: &[u8]) -> Result<(), Status> {
    if row.is_empty() {
        return Err(Status::invalid_argument("row key must not be empty"));
    }
    Ok(())
}

fn check_same_row(checked: &[u8], mutated: &[u8]) -> Result<(), Status> {
    if checked != mutated {
        return Err(Status::invalid_argument(
            "mutation row does not match the checked row",
        ));
    }
    Ok(())
}
