//! Prefix-bounded range iteration over one index.

use std::iter::FusedIterator;

use rocksdb::{DBRawIteratorWithThreadMode, DB};

use crate::codec::{at_term_boundary, decode_value};
use crate::errors::{GraphStoreError, Result};
use crate::triplet::Triplet;

/// Forward, lazy iterator over the triplets whose index key starts with a
/// fixed byte prefix.
///
/// Triplets are decoded from record values. The iterator owns the engine
/// cursor and releases it when dropped, whether it was drained, closed or
/// abandoned part way. It borrows the store, so it cannot outlive it. The read
/// view is the engine's snapshot at creation time.
pub struct TripletIter<'a> {
    cursor: DBRawIteratorWithThreadMode<'a, DB>,
    prefix: Vec<u8>,
    check_boundary: bool,
    done: bool,
}

impl<'a> TripletIter<'a> {
    /// Seeks `cursor` to the first key >= `prefix`. With `check_boundary`,
    /// keys whose last prefixed term merely starts with the prefix's last term
    /// are skipped (see [`at_term_boundary`]).
    pub(crate) fn new(
        mut cursor: DBRawIteratorWithThreadMode<'a, DB>,
        prefix: Vec<u8>,
        check_boundary: bool,
    ) -> Self {
        cursor.seek(&prefix);
        let mut iter = Self {
            cursor,
            check_boundary: check_boundary && !prefix.is_empty(),
            prefix,
            done: false,
        };
        iter.skip_partial_terms();
        iter
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// True iff the cursor is valid and its key starts with the prefix.
    pub fn has_next(&self) -> bool {
        !self.done
            && self.cursor.valid()
            && self
                .cursor
                .key()
                .is_some_and(|key| key.starts_with(&self.prefix))
    }

    /// Releases the cursor.
    pub fn close(self) {}

    /// Drains the remaining triplets, stopping at the first error.
    pub fn collect_triplets(self) -> Result<Vec<Triplet>> {
        self.collect()
    }

    /// Feeds every remaining triplet to `f`, stopping at the first error.
    pub fn for_each_triplet<F>(self, mut f: F) -> Result<()>
    where
        F: FnMut(Triplet),
    {
        for triplet in self {
            f(triplet?);
        }
        Ok(())
    }

    fn skip_partial_terms(&mut self) {
        if !self.check_boundary {
            return;
        }
        loop {
            let partial = match self.cursor.key() {
                Some(key) => {
                    key.starts_with(&self.prefix) && !at_term_boundary(&key[self.prefix.len()..])
                }
                None => false,
            };
            if !partial {
                break;
            }
            self.cursor.next();
        }
    }
}

impl Iterator for TripletIter<'_> {
    type Item = Result<Triplet>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            if self.done {
                return None;
            }
            self.done = true;
            return match self.cursor.status() {
                Ok(()) => None,
                Err(e) => Some(Err(GraphStoreError::store("iterating index")(e))),
            };
        }
        let decoded = match self.cursor.value() {
            Some(value) => decode_value(value),
            None => Err(GraphStoreError::Parse("record without a value".into())),
        };
        match decoded {
            Ok(triplet) => {
                self.cursor.next();
                self.skip_partial_terms();
                Some(Ok(triplet))
            }
            Err(e) => {
                log::error!(
                    "aborting scan over prefix {:?}: {}",
                    String::from_utf8_lossy(&self.prefix),
                    e
                );
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for TripletIter<'_> {}
