//! The RocksDB-backed store and its two indexes.

use std::path::{Path, PathBuf};

use log::{debug, error, info, trace};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, WriteBatch, DB, DEFAULT_COLUMN_FAMILY_NAME};
use serde::Serialize;

use crate::codec::{index_key, index_records, key_prefix};
use crate::errors::{GraphStoreError, Result};
use crate::group::SubjectGroups;
use crate::iter::TripletIter;
use crate::options::{AccessMode, GraphStoreOptions, IndexOrder};
use crate::term::{Iri, Term};
use crate::triplet::Triplet;

/// Name of the column family holding POS-ordered records.
pub const POS_COLUMN_FAMILY: &str = "POS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub spo_records: usize,
    pub pos_records: usize,
}

/// An opened triple store.
///
/// Every triplet is written to the SPO index (the default column family) and,
/// unless disabled, to the POS index. Queries scan one index by a leading
/// prefix of canonical term strings.
pub struct GraphStore {
    db: DB,
    path: PathBuf,
    options: GraphStoreOptions,
    mode: AccessMode,
}

impl GraphStore {
    /// Opens or creates the store at `path`.
    ///
    /// # Errors
    /// * [`GraphStoreError::Lock`] - another live handle holds the store
    /// * [`GraphStoreError::NotExist`] - the store is missing and may not be created
    /// * [`GraphStoreError::Store`] - any other engine failure
    pub fn open<P: AsRef<Path>>(path: P, options: GraphStoreOptions, mode: AccessMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let creatable = options.create_if_missing() && !mode.is_read_only();
        if !creatable && !path.join("CURRENT").exists() {
            error!("Failed to open graph store at {:?}: store does not exist", path);
            return Err(GraphStoreError::NotExist { path });
        }

        let db_opts = options.to_db_options();
        let opened = if mode.is_read_only() {
            let mut names = vec![DEFAULT_COLUMN_FAMILY_NAME];
            if !options.disable_pos_index() {
                names.push(POS_COLUMN_FAMILY);
            }
            DB::open_cf_for_read_only(&db_opts, &path, names, false)
        } else {
            // POS is always created so a later handle may enable it
            let descriptors = [DEFAULT_COLUMN_FAMILY_NAME, POS_COLUMN_FAMILY]
                .into_iter()
                .map(|name| ColumnFamilyDescriptor::new(name, options.to_cf_options()));
            DB::open_cf_descriptors(&db_opts, &path, descriptors)
        };
        let db = opened.map_err(|e| {
            error!("Failed to open graph store at {:?}: {}", path, e);
            classify_open_error(&path, e)
        })?;

        info!(
            "Opened graph store at {:?} ({:?}, POS index {})",
            path,
            mode,
            if options.disable_pos_index() { "disabled" } else { "enabled" }
        );
        Ok(Self {
            db,
            path,
            options,
            mode,
        })
    }

    /// Opens read-write with default options, creating the store if needed.
    pub fn open_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, GraphStoreOptions::default(), AccessMode::ReadWrite)
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P, options: GraphStoreOptions) -> Result<Self> {
        Self::open(path, options, AccessMode::ReadOnly)
    }

    /// Closes the store. Column family handles are borrowed from the engine and
    /// every iterator borrows the store, so all of them are gone before the
    /// engine itself is released here.
    pub fn close(self) {
        info!("Closing graph store at {:?}", self.path);
        drop(self.db);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &GraphStoreOptions {
        &self.options
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    fn pos_enabled(&self) -> bool {
        !self.options.disable_pos_index()
    }

    fn cf(&self, order: IndexOrder) -> Result<&ColumnFamily> {
        let name = match order {
            IndexOrder::Spo => DEFAULT_COLUMN_FAMILY_NAME,
            IndexOrder::Pos => {
                if !self.pos_enabled() {
                    return Err(GraphStoreError::IndexDisabled);
                }
                POS_COLUMN_FAMILY
            }
        };
        self.db
            .cf_handle(name)
            .ok_or(GraphStoreError::MissingColumnFamily(name))
    }

    /// Compacts the full key range of every open index.
    pub fn compact(&self) -> Result<()> {
        info!("Compacting graph store at {:?}", self.path);
        let mut orders = vec![IndexOrder::Spo];
        if self.pos_enabled() {
            orders.push(IndexOrder::Pos);
        }
        for order in orders {
            let cf = self.cf(order)?;
            self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        }
        Ok(())
    }

    /// Adds one triplet.
    ///
    /// The SPO and POS records are two separate writes: if the engine fails in
    /// between, the SPO record stays without its POS twin. Use
    /// [`GraphStore::add_all`] when both indexes must change atomically.
    pub fn add(&self, triplet: &Triplet) -> Result<()> {
        for record in index_records(triplet, self.pos_enabled()) {
            let cf = self.cf(record.order)?;
            self.db
                .put_cf(cf, &record.key, &record.value)
                .map_err(GraphStoreError::store(format!(
                    "writing {} record",
                    record.order.as_str()
                )))?;
            trace!(
                "PUT {} {}",
                record.order.as_str(),
                String::from_utf8_lossy(&record.key)
            );
        }
        Ok(())
    }

    /// Adds a collection of triplets in one atomic batch and returns how many
    /// triplets were written.
    pub fn add_all<'t, I>(&self, triplets: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'t Triplet>,
    {
        let mut batch = WriteBatch::default();
        let mut count = 0usize;
        for triplet in triplets {
            for record in index_records(triplet, self.pos_enabled()) {
                batch.put_cf(self.cf(record.order)?, &record.key, &record.value);
            }
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }
        self.db
            .write(batch)
            .map_err(GraphStoreError::store("writing batch"))?;
        debug!("Committed batch of {} triplets", count);
        Ok(count)
    }

    /// True if the SPO index holds exactly this triplet.
    pub fn contains(&self, triplet: &Triplet) -> Result<bool> {
        let cf = self.cf(IndexOrder::Spo)?;
        let found = self
            .db
            .get_pinned_cf(cf, index_key(triplet, IndexOrder::Spo))
            .map_err(GraphStoreError::store("reading SPO record"))?;
        Ok(found.is_some())
    }

    /// Scans `order` by up to three leading canonical strings.
    ///
    /// Fewer keys return a superset ordered by the unconstrained positions.
    pub fn query<S: AsRef<str>>(&self, order: IndexOrder, keys: &[S]) -> Result<TripletIter<'_>> {
        if keys.len() > 3 {
            return Err(GraphStoreError::InvalidQuery(format!(
                "at most three keys, got {}",
                keys.len()
            )));
        }
        self.scan(order, key_prefix(keys), true)
    }

    /// Scans `order` by a raw byte prefix, e.g. a namespace `<http://ex.org/`.
    pub fn query_prefix(&self, order: IndexOrder, prefix: &str) -> Result<TripletIter<'_>> {
        self.scan(order, prefix.as_bytes().to_vec(), false)
    }

    /// Scans the SPO index. Keys must form a leading prefix.
    pub fn query_spo(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
    ) -> Result<TripletIter<'_>> {
        let keys = leading_keys([
            subject.map(Term::canonical),
            predicate.map(Iri::to_string),
            object.map(Term::canonical),
        ])?;
        self.query(IndexOrder::Spo, &keys)
    }

    /// Scans the POS index. Keys must form a leading prefix.
    pub fn query_pos(
        &self,
        predicate: Option<&Iri>,
        object: Option<&Term>,
        subject: Option<&Term>,
    ) -> Result<TripletIter<'_>> {
        if !self.pos_enabled() {
            return Err(GraphStoreError::IndexDisabled);
        }
        let keys = leading_keys([
            predicate.map(Iri::to_string),
            object.map(Term::canonical),
            subject.map(Term::canonical),
        ])?;
        self.query(IndexOrder::Pos, &keys)
    }

    /// The whole SPO index grouped by subject, then by predicate.
    pub fn subject_groups(&self) -> Result<SubjectGroups<TripletIter<'_>>> {
        Ok(SubjectGroups::new(self.query_spo(None, None, None)?))
    }

    /// Counts the records of each index.
    pub fn stats(&self) -> Result<StoreStats> {
        let spo_records = self.count_records(IndexOrder::Spo)?;
        let pos_records = if self.pos_enabled() {
            self.count_records(IndexOrder::Pos)?
        } else {
            0
        };
        Ok(StoreStats {
            spo_records,
            pos_records,
        })
    }

    fn count_records(&self, order: IndexOrder) -> Result<usize> {
        let mut cursor = self.db.raw_iterator_cf(self.cf(order)?);
        cursor.seek_to_first();
        let mut count = 0usize;
        while cursor.valid() {
            count += 1;
            cursor.next();
        }
        cursor
            .status()
            .map_err(GraphStoreError::store("counting records"))?;
        Ok(count)
    }

    fn scan(&self, order: IndexOrder, prefix: Vec<u8>, check_boundary: bool) -> Result<TripletIter<'_>> {
        let cf = self.cf(order)?;
        debug!(
            "Query {} with prefix {:?}",
            order.as_str(),
            String::from_utf8_lossy(&prefix)
        );
        Ok(TripletIter::new(
            self.db.raw_iterator_cf(cf),
            prefix,
            check_boundary,
        ))
    }
}

/// Drops trailing `None`s and rejects a key following a missing one.
fn leading_keys(keys: [Option<String>; 3]) -> Result<Vec<String>> {
    let mut leading = Vec::with_capacity(3);
    let mut gap = false;
    for key in keys {
        match key {
            Some(_) if gap => {
                return Err(GraphStoreError::InvalidQuery(
                    "query keys must form a leading prefix".into(),
                ))
            }
            Some(key) => leading.push(key),
            None => gap = true,
        }
    }
    Ok(leading)
}

fn classify_open_error(path: &Path, e: rocksdb::Error) -> GraphStoreError {
    let message = e.to_string();
    if message.contains("LOCK") || message.contains("lock hold") {
        GraphStoreError::Lock {
            path: path.to_path_buf(),
            source: e,
        }
    } else if message.contains("does not exist") || message.contains("No such file or directory") {
        GraphStoreError::NotExist {
            path: path.to_path_buf(),
        }
    } else {
        GraphStoreError::Store {
            context: format!("opening graph store at {:?}", path),
            source: e,
        }
    }
}
