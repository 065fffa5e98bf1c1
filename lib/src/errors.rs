//! Error taxonomy for the store, its iterators and the format layer.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, GraphStoreError>;

#[derive(Error, Debug)]
pub enum GraphStoreError {
    /// The store directory is locked by another live handle.
    #[error("store at {path:?} is locked by another handle: {source}")]
    Lock {
        path: PathBuf,
        source: rocksdb::Error,
    },

    /// The store does not exist and creation was not requested.
    #[error("store at {path:?} does not exist")]
    NotExist { path: PathBuf },

    /// Any other engine failure.
    #[error("{context}: {source}")]
    Store {
        context: String,
        source: rocksdb::Error,
    },

    /// A stored value or canonical term string could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid triplet: {0}")]
    InvalidTriplet(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The POS index was disabled when this handle was opened.
    #[error("POS index has been disabled in options")]
    IndexDisabled,

    #[error("column family {0} is not open")]
    MissingColumnFamily(&'static str),

    #[error("no graph loader or serializer registered for format {0:?}")]
    UnknownFormat(String),

    /// The RDF parser behind a loader rejected its input.
    #[error("RDF parse error: {0}")]
    Rdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl GraphStoreError {
    /// Wraps an engine error with the name of the failed operation.
    pub(crate) fn store(context: impl Into<String>) -> impl FnOnce(rocksdb::Error) -> Self {
        let context = context.into();
        move |source| GraphStoreError::Store { context, source }
    }
}

impl From<oxigraph::io::RdfParseError> for GraphStoreError {
    fn from(e: oxigraph::io::RdfParseError) -> Self {
        GraphStoreError::Rdf(e.to_string())
    }
}
