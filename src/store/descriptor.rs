use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default number of versions a family keeps per column.
pub const DEFAULT_MAX_VERSIONS: u32 = 3;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: u32 = 64 * 1024;

/// Time-to-live meaning "never expire".
pub const FOREVER: u32 = i32::MAX as u32;

/// Compression algorithm applied to stored family data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    None,
    Gz,
    Lzo,
    Snappy,
    Lz4,
}

/// Bloom filter kind maintained for a family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomFilterType {
    #[default]
    None,
    Row,
    RowCol,
}

/// Schema and tuning of one column family.
///
/// # Example
///
/// ```
/// use rucksbase::{ColumnFamilyDescriptor, CompressionType};
///
/// let cf = ColumnFamilyDescriptor {
///     max_versions: 10,
///     compression: CompressionType::Snappy,
///     ..ColumnFamilyDescriptor::new("o")
/// };
/// assert_eq!(cf.name, "o");
/// assert!(cf.block_cache_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamilyDescriptor {
    pub name: String,
    pub max_versions: u32,
    pub in_memory: bool,
    pub replication_scope: i32,
    pub block_size: u32,
    pub compression: CompressionType,
    pub compaction_compression: CompressionType,
    /// Seconds a cell stays visible after its timestamp.
    pub time_to_live: u32,
    pub block_cache_enabled: bool,
    pub bloom_filter: BloomFilterType,
    /// Free-form metadata.
    pub values: BTreeMap<String, String>,
}

impl ColumnFamilyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnFamilyDescriptor {
            name: name.into(),
            max_versions: DEFAULT_MAX_VERSIONS,
            in_memory: false,
            replication_scope: 0,
            block_size: DEFAULT_BLOCK_SIZE,
            compression: CompressionType::None,
            compaction_compression: CompressionType::None,
            time_to_live: FOREVER,
            block_cache_enabled: true,
            bloom_filter: BloomFilterType::None,
            values: BTreeMap::new(),
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Schema of a table: its name and column families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    families: BTreeMap<String, ColumnFamilyDescriptor>,
}

impl TableDescriptor {
    /// A table with no column families.
    pub fn new(name: impl Into<String>) -> Self {
        TableDescriptor {
            name: name.into(),
            families: BTreeMap::new(),
        }
    }

    pub fn family(&self, name: &str) -> Option<&ColumnFamilyDescriptor> {
        self.families.get(name)
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    pub fn families(&self) -> impl Iterator<Item = &ColumnFamilyDescriptor> {
        self.families.values()
    }

    /// Insert or replace a family descriptor.
    pub fn set_family(&mut self, family: ColumnFamilyDescriptor) {
        self.families.insert(family.name.clone(), family);
    }

    pub fn remove_family(&mut self, name: &str) -> Option<ColumnFamilyDescriptor> {
        self.families.remove(name)
    }
}
