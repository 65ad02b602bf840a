use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    store::{BloomFilterType, ColumnFamilyDescriptor, CompressionType},
    util::Status,
};

/// A partial update of a [`ColumnFamilyDescriptor`].
///
/// Only fields that are `Some` overwrite the descriptor it is applied to.
/// Metadata `values` are merged key by key: keys not mentioned keep their
/// value.
///
/// # Example
///
/// ```
/// use rucksbase::{ColumnFamilyDescriptor, ColumnFamilyPatch};
///
/// let base = ColumnFamilyDescriptor {
///     max_versions: 3,
///     ..ColumnFamilyDescriptor::new("o")
/// };
/// let patch = ColumnFamilyPatch::new().time_to_live(3600);
/// let patched = patch.apply(&base);
/// assert_eq!(patched.max_versions, 3);
/// assert_eq!(patched.time_to_live, 3600);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnFamilyPatch {
    pub max_versions: Option<u32>,
    pub block_size: Option<u32>,
    pub compression: Option<CompressionType>,
    pub compaction_compression: Option<CompressionType>,
    pub in_memory: Option<bool>,
    pub time_to_live: Option<u32>,
    pub block_cache_enabled: Option<bool>,
    pub bloom_filter: Option<BloomFilterType>,
    pub replication_scope: Option<i32>,
    pub values: Option<BTreeMap<String, String>>,
}

impl ColumnFamilyPatch {
    pub fn new() -> Self {
        ColumnFamilyPatch::default()
    }

    pub fn max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = Some(max_versions);
        self
    }

    pub fn block_size(mut self, block_size: u32) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn compaction_compression(mut self, compression: CompressionType) -> Self {
        self.compaction_compression = Some(compression);
        self
    }

    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = Some(in_memory);
        self
    }

    pub fn time_to_live(mut self, seconds: u32) -> Self {
        self.time_to_live = Some(seconds);
        self
    }

    pub fn block_cache_enabled(mut self, enabled: bool) -> Self {
        self.block_cache_enabled = Some(enabled);
        self
    }

    pub fn bloom_filter(mut self, bloom_filter: BloomFilterType) -> Self {
        self.bloom_filter = Some(bloom_filter);
        self
    }

    pub fn replication_scope(mut self, scope: i32) -> Self {
        self.replication_scope = Some(scope);
        self
    }

    /// Set one metadata entry.
    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether applying the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == ColumnFamilyPatch::default()
    }

    /// Reject values no descriptor may hold.
    pub fn validate(&self) -> Result<(), Status> {
        if self.max_versions == Some(0) {
            return Err(Status::invalid_argument("max versions must be positive"));
        }
        if self.block_size == Some(0) {
            return Err(Status::invalid_argument("block size must be positive"));
        }
        Ok(())
    }

    /// A copy of `base` with every supplied field overlaid.
    pub fn apply(&self, base: &ColumnFamilyDescriptor) -> ColumnFamilyDescriptor {
        let mut desc = base.clone();
        if let Some(v) = self.max_versions {
            desc.max_versions = v;
        }
        if let Some(v) = self.block_size {
            desc.block_size = v;
        }
        if let Some(v) = self.compression {
            desc.compression = v;
        }
        if let Some(v) = self.compaction_compression {
            desc.compaction_compression = v;
        }
        if let Some(v) = self.in_memory {
            desc.in_memory = v;
        }
        if let Some(v) = self.time_to_live {
            desc.time_to_live = v;
        }
        if let Some(v) = self.block_cache_enabled {
            desc.block_cache_enabled = v;
        }
        if let Some(v) = self.bloom_filter {
            desc.bloom_filter = v;
        }
        if let Some(v) = self.replication_scope {
            desc.replication_scope = v;
        }
        if let Some(values) = &self.values {
            desc.values
                .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        desc
    }
}
