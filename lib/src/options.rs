//! Store options and the small enums that replace boolean flag parameters.

use derive_builder::Builder;

/// Default memory budget handed to RocksDB's universal-compaction tuning.
pub const DEFAULT_MEMTABLE_BUDGET: usize = 512 * 1024 * 1024;

/// Options fixed for the lifetime of an opened [`crate::GraphStore`].
///
/// ```
/// use graphstore::GraphStoreOptions;
///
/// let options = GraphStoreOptions::builder()
///     .create_if_missing(true)
///     .disable_pos_index(true)
///     .build()
///     .unwrap();
/// assert!(options.disable_pos_index());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(pattern = "owned", default)]
pub struct GraphStoreOptions {
    /// Create the store directory if it does not exist yet.
    create_if_missing: bool,
    /// Skip the POS index: no POS writes, and POS queries are rejected.
    disable_pos_index: bool,
    /// Memtable budget in bytes used to tune universal-style compaction.
    memtable_budget: usize,
}

impl Default for GraphStoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            disable_pos_index: false,
            memtable_budget: DEFAULT_MEMTABLE_BUDGET,
        }
    }
}

impl GraphStoreOptions {
    pub fn builder() -> GraphStoreOptionsBuilder {
        GraphStoreOptionsBuilder::default()
    }

    pub fn create_if_missing(&self) -> bool {
        self.create_if_missing
    }

    pub fn disable_pos_index(&self) -> bool {
        self.disable_pos_index
    }

    pub fn memtable_budget(&self) -> usize {
        self.memtable_budget
    }

    pub(crate) fn to_db_options(self) -> rocksdb::Options {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(self.create_if_missing);
        opts.create_missing_column_families(true);
        opts
    }

    pub(crate) fn to_cf_options(self) -> rocksdb::Options {
        let mut opts = rocksdb::Options::default();
        opts.optimize_universal_style_compaction(self.memtable_budget);
        opts
    }
}

/// Whether a store is opened for writing or only for reading.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum AccessMode {
    #[default]
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    pub fn is_read_only(self) -> bool {
        matches!(self, AccessMode::ReadOnly)
    }
}

impl From<bool> for AccessMode {
    /// `true` means read-only.
    fn from(value: bool) -> Self {
        if value {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        }
    }
}

/// The two physical orderings under which triplets are indexed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IndexOrder {
    /// subject, predicate, object: the primary index.
    Spo,
    /// predicate, object, subject: the optional secondary index.
    Pos,
}

impl IndexOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexOrder::Spo => "SPO",
            IndexOrder::Pos => "POS",
        }
    }
}
