use std::fmt::Display;
use std::io::Write;

use log::debug;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{
    BlankNode as OxBlankNode, Literal as OxLiteral, NamedNode, NamedOrBlankNode, Term as OxTerm,
    Triple,
};

use crate::errors::{GraphStoreError, Result};
use crate::io::Serializer;
use crate::prefix::PrefixMapping;
use crate::store::GraphStore;
use crate::term::{BlankNode, Iri, Literal, Term};

/// Serializes the SPO index through oxigraph's `RdfSerializer`, one subject
/// group at a time.
#[derive(Debug, Clone, Copy)]
pub struct RdfWriter {
    format: RdfFormat,
    use_prefixes: bool,
    relabel_blank_nodes: bool,
}

impl RdfWriter {
    pub fn new(format: RdfFormat) -> Self {
        Self {
            format,
            use_prefixes: format != RdfFormat::NTriples,
            relabel_blank_nodes: false,
        }
    }

    /// N-Triples; the prefix mapping is ignored.
    pub fn ntriples() -> Self {
        Self::new(RdfFormat::NTriples)
    }

    pub fn turtle() -> Self {
        Self::new(RdfFormat::Turtle)
    }

    /// RDF/XML with blank nodes written under [`node_id`] labels.
    pub fn rdf_xml() -> Self {
        Self {
            relabel_blank_nodes: true,
            ..Self::new(RdfFormat::RdfXml)
        }
    }

    fn subject(&self, term: &Term) -> Result<NamedOrBlankNode> {
        match term {
            Term::Resource(iri) => Ok(named_node(iri)?.into()),
            Term::BlankNode(b) => Ok(self.blank_node(b)?.into()),
            Term::Literal(l) => Err(GraphStoreError::InvalidTriplet(format!(
                "literal subject {} cannot be written as {}",
                l,
                self.format.name()
            ))),
        }
    }

    fn object(&self, term: &Term) -> Result<OxTerm> {
        match term {
            Term::Resource(iri) => Ok(named_node(iri)?.into()),
            Term::BlankNode(b) => Ok(self.blank_node(b)?.into()),
            Term::Literal(l) => Ok(literal(l)?.into()),
        }
    }

    fn blank_node(&self, node: &BlankNode) -> Result<OxBlankNode> {
        if self.relabel_blank_nodes {
            OxBlankNode::new(node_id(node.as_str())).map_err(invalid)
        } else {
            OxBlankNode::new(node.as_str()).map_err(invalid)
        }
    }
}

impl Serializer for RdfWriter {
    fn serialize(&self, out: &mut dyn Write, store: &GraphStore, prefixes: &PrefixMapping) -> Result<()> {
        let mut serializer = RdfSerializer::from_format(self.format);
        if self.use_prefixes {
            for (prefix, namespace) in prefixes.namespaces() {
                serializer = serializer.with_prefix(prefix, namespace).map_err(|e| {
                    GraphStoreError::Parse(format!("namespace of prefix {}: {}", prefix, e))
                })?;
            }
        }

        let mut writer = serializer.for_writer(out);
        let mut count = 0usize;
        for group in store.subject_groups()? {
            let group = group?;
            let subject = self.subject(&group.key)?;
            for predicate in group.items {
                let predicate = predicate?;
                let property = named_node(&predicate.key)?;
                for triplet in predicate.items {
                    let triple = Triple::new(subject.clone(), property.clone(), self.object(&triplet.object)?);
                    writer.serialize_triple(&triple)?;
                    count += 1;
                }
            }
        }
        writer.finish()?;
        debug!("Wrote {} triples as {}", count, self.format.name());
        Ok(())
    }
}

/// `n` followed by the hex blake3 digest of the label.
pub fn node_id(label: &str) -> String {
    format!("n{}", blake3::hash(label.as_bytes()).to_hex())
}

fn named_node(iri: &Iri) -> Result<NamedNode> {
    NamedNode::new(iri.as_str()).map_err(invalid)
}

fn literal(literal: &Literal) -> Result<OxLiteral> {
    if let Some(lang) = literal.language() {
        OxLiteral::new_language_tagged_literal(literal.value(), lang).map_err(invalid)
    } else if let Some(datatype) = literal.datatype() {
        Ok(OxLiteral::new_typed_literal(literal.value(), named_node(datatype)?))
    } else {
        Ok(OxLiteral::new_simple_literal(literal.value()))
    }
}

fn invalid(e: impl Display) -> GraphStoreError {
    GraphStoreError::InvalidTriplet(e.to_string())
}
