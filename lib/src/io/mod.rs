//! Loading RDF documents into a store and serializing a store back out.
//!
//! Formats are looked up by id (`nt`, `ttl`, ...) in a [`FormatRegistry`].
//! [`load`] and [`serialize`] use the built-in registry; callers needing
//! extra formats build their own and register factories on it.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

use log::debug;

use crate::errors::{GraphStoreError, Result};
use crate::prefix::PrefixMapping;
use crate::store::GraphStore;

pub mod csv;
pub mod jsonld;
pub mod jsonld_frame;
pub mod loader;
pub mod writer;

pub use self::csv::CsvSerializer;
pub use self::jsonld::JsonLdSerializer;
pub use self::jsonld_frame::JsonLdFrameSerializer;
pub use self::loader::{RdfLoader, LOAD_BATCH_SIZE};
pub use self::writer::{node_id, RdfWriter};

/// Reads a document from `input` into `store`.
pub trait Loader {
    /// Returns the number of triplets written.
    fn load(&self, store: &GraphStore, input: &mut dyn BufRead) -> Result<usize>;
}

/// Writes the whole SPO index of `store` to `out`.
pub trait Serializer {
    fn serialize(
        &self,
        out: &mut dyn Write,
        store: &GraphStore,
        prefixes: &PrefixMapping,
    ) -> Result<()>;
}

pub type LoaderFactory = fn() -> Box<dyn Loader>;
pub type SerializerFactory = fn() -> Box<dyn Serializer>;

/// Format id to loader/serializer factory tables.
#[derive(Clone)]
pub struct FormatRegistry {
    loaders: BTreeMap<String, LoaderFactory>,
    serializers: BTreeMap<String, SerializerFactory>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register_loader("nt", || Box::new(RdfLoader::ntriples()))
            .register_loader("ttl", || Box::new(RdfLoader::turtle()))
            .register_loader("xml", || Box::new(RdfLoader::rdf_xml()));
        registry
            .register_serializer("nt", || Box::new(RdfWriter::ntriples()))
            .register_serializer("ttl", || Box::new(RdfWriter::turtle()))
            .register_serializer("jsonld", || Box::new(JsonLdSerializer::default()))
            .register_serializer("jsonld-frame", || Box::new(JsonLdFrameSerializer::default()))
            .register_serializer("xml", || Box::new(RdfWriter::rdf_xml()))
            .register_serializer("csv", || Box::new(CsvSerializer));
        registry
    }
}

impl FormatRegistry {
    /// A registry without any format.
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
            serializers: BTreeMap::new(),
        }
    }

    /// Adds or replaces the loader for `format`.
    pub fn register_loader(&mut self, format: &str, factory: LoaderFactory) -> &mut Self {
        self.loaders.insert(format.to_string(), factory);
        self
    }

    /// Adds or replaces the serializer for `format`.
    pub fn register_serializer(&mut self, format: &str, factory: SerializerFactory) -> &mut Self {
        self.serializers.insert(format.to_string(), factory);
        self
    }

    pub fn loader(&self, format: &str) -> Result<Box<dyn Loader>> {
        self.loaders
            .get(format)
            .map(|factory| factory())
            .ok_or_else(|| GraphStoreError::UnknownFormat(format.to_string()))
    }

    pub fn serializer(&self, format: &str) -> Result<Box<dyn Serializer>> {
        self.serializers
            .get(format)
            .map(|factory| factory())
            .ok_or_else(|| GraphStoreError::UnknownFormat(format.to_string()))
    }

    pub fn loader_formats(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    pub fn serializer_formats(&self) -> impl Iterator<Item = &str> {
        self.serializers.keys().map(String::as_str)
    }

    pub fn load(&self, store: &GraphStore, input: &mut dyn BufRead, format: &str) -> Result<usize> {
        let loader = self.loader(format)?;
        debug!("Loading {} document into {:?}", format, store.path());
        loader.load(store, input)
    }

    pub fn serialize(
        &self,
        out: &mut dyn Write,
        store: &GraphStore,
        format: &str,
        prefixes: &PrefixMapping,
    ) -> Result<()> {
        let serializer = self.serializer(format)?;
        debug!("Serializing {:?} as {}", store.path(), format);
        serializer.serialize(out, store, prefixes)?;
        out.flush()?;
        Ok(())
    }
}

/// Loads `input` in `format` with the built-in registry.
pub fn load(store: &GraphStore, input: &mut dyn BufRead, format: &str) -> Result<usize> {
    FormatRegistry::default().load(store, input, format)
}

/// Serializes `store` in `format` with the built-in registry.
pub fn serialize(
    out: &mut dyn Write,
    store: &GraphStore,
    format: &str,
    prefixes: &PrefixMapping,
) -> Result<()> {
    FormatRegistry::default().serialize(out, store, format, prefixes)
}

/// Guesses a loader format id from a file extension.
pub fn format_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "nt" => Some("nt"),
        "ttl" | "n3" => Some("ttl"),
        "xml" | "rdf" | "owl" => Some("xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_builtins() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.loader_formats().collect::<Vec<_>>(),
            vec!["nt", "ttl", "xml"]
        );
        assert_eq!(
            registry.serializer_formats().collect::<Vec<_>>(),
            vec!["csv", "jsonld", "jsonld-frame", "nt", "ttl", "xml"]
        );
    }

    #[test]
    fn unknown_format_is_an_error() {
        let registry = FormatRegistry::default();
        assert!(matches!(
            registry.serializer("jsonld-compact"),
            Err(GraphStoreError::UnknownFormat(f)) if f == "jsonld-compact"
        ));
        assert!(registry.serializer("jsonld-frame").is_ok());
        assert!(matches!(
            FormatRegistry::empty().loader("nt"),
            Err(GraphStoreError::UnknownFormat(_))
        ));
    }

    #[test]
    fn registering_replaces_entries() {
        let mut registry = FormatRegistry::empty();
        registry.register_serializer("txt", || Box::new(RdfWriter::ntriples()));
        assert!(registry.serializer("txt").is_ok());
        registry.register_serializer("txt", || Box::new(CsvSerializer));
        assert_eq!(registry.serializer_formats().count(), 1);
    }

    #[test]
    fn extensions_map_to_formats() {
        assert_eq!(format_from_extension(Path::new("a/b.nt")), Some("nt"));
        assert_eq!(format_from_extension(Path::new("b.TTL")), Some("ttl"));
        assert_eq!(format_from_extension(Path::new("b.rdf")), Some("xml"));
        assert_eq!(format_from_extension(Path::new("b.csv")), None);
        assert_eq!(format_from_extension(Path::new("noext")), None);
    }
}
