//! Index key and value encoding.
//!
//! Key: the canonical forms of the three terms concatenated without separator,
//! in the order of the index (SPO or POS). Value: the canonical forms in
//! subject/predicate/object order joined by [`VALUE_DELIMITER`].
//!
//! The concatenated key is unambiguous only because canonical forms are
//! self-delimiting; prefix scans additionally check [`at_term_boundary`] so a
//! trailing blank node or literal key does not match longer terms.

use crate::errors::{GraphStoreError, Result};
use crate::options::IndexOrder;
use crate::term::Term;
use crate::triplet::Triplet;

pub const VALUE_DELIMITER: char = '|';

/// One key/value pair destined for the column family of `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub order: IndexOrder,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

pub fn index_key(triplet: &Triplet, order: IndexOrder) -> Vec<u8> {
    let s = triplet.subject.canonical();
    let p = triplet.predicate.to_string();
    let o = triplet.object.canonical();
    match order {
        IndexOrder::Spo => [s, p, o].concat().into_bytes(),
        IndexOrder::Pos => [p, o, s].concat().into_bytes(),
    }
}

pub fn index_value(triplet: &Triplet) -> Vec<u8> {
    format!(
        "{}{d}{}{d}{}",
        triplet.subject,
        triplet.predicate,
        triplet.object,
        d = VALUE_DELIMITER
    )
    .into_bytes()
}

/// The SPO record, and the POS record unless `with_pos` is false.
pub fn index_records(triplet: &Triplet, with_pos: bool) -> Vec<IndexRecord> {
    let value = index_value(triplet);
    let mut records = vec![IndexRecord {
        order: IndexOrder::Spo,
        key: index_key(triplet, IndexOrder::Spo),
        value: value.clone(),
    }];
    if with_pos {
        records.push(IndexRecord {
            order: IndexOrder::Pos,
            key: index_key(triplet, IndexOrder::Pos),
            value,
        });
    }
    records
}

/// Decodes a stored value into a triplet.
///
/// Terms are read with [`Term::parse_prefix`] rather than by splitting on the
/// delimiter, so a `|` inside a literal is tolerated in any position.
pub fn decode_value(bytes: &[u8]) -> Result<Triplet> {
    let source = std::str::from_utf8(bytes)
        .map_err(|e| GraphStoreError::Parse(format!("stored value is not UTF-8: {}", e)))?;
    let (subject, rest) = Term::parse_prefix(source)?;
    let rest = expect_delimiter(rest, source)?;
    let (predicate, rest) = Term::parse_prefix(rest)?;
    let rest = expect_delimiter(rest, source)?;
    let object = Term::parse(rest)?;
    Triplet::try_new(subject, predicate, object)
        .map_err(|e| GraphStoreError::Parse(format!("{} in stored value {:?}", e, source)))
}

fn expect_delimiter<'a>(rest: &'a str, source: &str) -> Result<&'a str> {
    rest.strip_prefix(VALUE_DELIMITER).ok_or_else(|| {
        GraphStoreError::Parse(format!(
            "expected three {:?}-delimited terms in {:?}",
            VALUE_DELIMITER, source
        ))
    })
}

/// Concatenates leading canonical strings into a scan prefix.
pub fn key_prefix<S: AsRef<str>>(keys: &[S]) -> Vec<u8> {
    let mut prefix = Vec::new();
    for key in keys {
        prefix.extend_from_slice(key.as_ref().as_bytes());
    }
    prefix
}

/// True when `rest`, the part of a key after a prefix that ends with a
/// complete term, starts a new term (or is empty). A blank node label or a
/// literal suffix continuing the last term of the prefix is not a boundary.
pub fn at_term_boundary(rest: &[u8]) -> bool {
    match rest {
        [] => true,
        [b'<', ..] | [b'"', ..] => true,
        [b'_', b':', ..] => true,
        _ => false,
    }
}
