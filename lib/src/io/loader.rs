use std::io::BufRead;

use log::{debug, info};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{NamedOrBlankNode, Quad};

use crate::errors::{GraphStoreError, Result};
use crate::io::Loader;
use crate::store::GraphStore;
use crate::term::{Iri, Literal, Term};
use crate::triplet::Triplet;

/// Triplets committed per `add_all` batch.
pub const LOAD_BATCH_SIZE: usize = 10_000;

/// Streams a document through an oxigraph parser into the store. Each batch
/// of [`LOAD_BATCH_SIZE`] triplets is atomic; a parse error leaves earlier
/// batches committed.
#[derive(Debug, Clone)]
pub struct RdfLoader {
    format: RdfFormat,
    base_iri: Option<String>,
}

impl RdfLoader {
    pub fn new(format: RdfFormat) -> Self {
        Self {
            format,
            base_iri: None,
        }
    }

    pub fn ntriples() -> Self {
        Self::new(RdfFormat::NTriples)
    }

    pub fn turtle() -> Self {
        Self::new(RdfFormat::Turtle)
    }

    pub fn rdf_xml() -> Self {
        Self::new(RdfFormat::RdfXml)
    }

    /// Resolves relative IRIs of Turtle and RDF/XML documents against `base`.
    pub fn with_base_iri(mut self, base: impl Into<String>) -> Self {
        self.base_iri = Some(base.into());
        self
    }

    fn parser(&self) -> Result<RdfParser> {
        let parser = RdfParser::from_format(self.format);
        match &self.base_iri {
            Some(base) => parser
                .with_base_iri(base.as_str())
                .map_err(|e| GraphStoreError::Rdf(format!("invalid base IRI {:?}: {}", base, e))),
            None => Ok(parser),
        }
    }
}

impl Loader for RdfLoader {
    fn load(&self, store: &GraphStore, input: &mut dyn BufRead) -> Result<usize> {
        let mut batch = Vec::with_capacity(LOAD_BATCH_SIZE);
        let mut total = 0usize;
        for quad in self.parser()?.for_reader(input) {
            batch.push(triplet_from_quad(quad?)?);
            if batch.len() >= LOAD_BATCH_SIZE {
                total += store.add_all(&batch)?;
                debug!("Loaded {} triplets so far", total);
                batch.clear();
            }
        }
        total += store.add_all(&batch)?;
        info!(
            "Loaded {} triplets ({:?}) into {:?}",
            total,
            self.format,
            store.path()
        );
        Ok(total)
    }
}

/// Maps a parsed quad into a triplet, dropping its graph name.
pub fn triplet_from_quad(quad: Quad) -> Result<Triplet> {
    let subject = match quad.subject {
        NamedOrBlankNode::NamedNode(nn) => Term::resource(nn.into_string())?,
        NamedOrBlankNode::BlankNode(bn) => Term::blank(bn.into_string())?,
    };
    let predicate = Iri::new(quad.predicate.into_string())?;
    let object = match quad.object {
        oxigraph::model::Term::NamedNode(nn) => Term::resource(nn.into_string())?,
        oxigraph::model::Term::BlankNode(bn) => Term::blank(bn.into_string())?,
        oxigraph::model::Term::Literal(lit) => {
            if let Some(lang) = lit.language() {
                Literal::new_language_tagged(lit.value(), lang)?.into()
            } else {
                let datatype = Iri::new(lit.datatype().as_str())?;
                Literal::new_typed(lit.value(), datatype).into()
            }
        }
    };
    Ok(Triplet::new(subject, predicate, object))
}
