use std::fmt;

use crate::errors::{GraphStoreError, Result};
use crate::term::{Iri, Term};

/// A (subject, predicate, object) statement. The predicate is always an IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triplet {
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Triplet {
    pub fn new(subject: Term, predicate: Iri, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Builds a triplet from three terms, rejecting a non-resource predicate.
    pub fn try_new(subject: Term, predicate: Term, object: Term) -> Result<Self> {
        match predicate {
            Term::Resource(iri) => Ok(Self::new(subject, iri, object)),
            other => Err(GraphStoreError::InvalidTriplet(format!(
                "predicate must be a resource, got {}",
                other
            ))),
        }
    }

    /// Parses three canonical strings.
    pub fn parse(subject: &str, predicate: &str, object: &str) -> Result<Self> {
        Self::try_new(
            Term::parse(subject)?,
            Term::parse(predicate)?,
            Term::parse(object)?,
        )
    }
}

/// Space separated canonical forms, i.e. an N-Triples statement without the dot.
impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}
