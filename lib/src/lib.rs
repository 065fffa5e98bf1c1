//! An embedded RDF triple store.
//!
//! Triplets are kept in two RocksDB-backed indexes: SPO in the default column
//! family and POS in a column family of its own. Lookups are prefix scans over
//! canonical N-Triples term strings, and [`SubjectGroups`] turns an SPO scan
//! into a nested subject/predicate/object walk for serializers.

extern crate derive_builder;

pub mod codec;
pub mod consts;
pub mod errors;
pub mod group;
pub mod io;
pub mod iter;
pub mod options;
pub mod prefix;
pub mod store;
pub mod term;
pub mod triplet;

pub use errors::{GraphStoreError, Result};
pub use group::{group_by, Group, GroupBy, PredicateGroup, PredicateGroups, SubjectGroup, SubjectGroups};
pub use iter::TripletIter;
pub use options::{AccessMode, GraphStoreOptions, GraphStoreOptionsBuilder, IndexOrder};
pub use prefix::PrefixMapping;
pub use store::{GraphStore, StoreStats};
pub use term::{BlankNode, Iri, Literal, Term};
pub use triplet::Triplet;

/// Lets `GRAPHSTORE_LOG` override `RUST_LOG` before a logger is installed.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("GRAPHSTORE_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
