use std::collections::BTreeMap;
use std::io::Write;

use serde_json::{Map, Number, Value};

use crate::consts::{RDF_TYPE, XSD_DOUBLE, XSD_INTEGER};
use crate::errors::{GraphStoreError, Result};
use crate::group::{PredicateGroup, SubjectGroup};
use crate::io::Serializer;
use crate::prefix::{extract_namespace, PrefixMapping};
use crate::store::GraphStore;
use crate::term::{Literal, Term};

/// Flattened JSON-LD: a `@context` built from an optional user context and
/// the prefix mapping, and a `@graph` holding one node object per subject,
/// written one per line so large stores stream.
#[derive(Debug, Clone, Default)]
pub struct JsonLdSerializer {
    context: BTreeMap<String, String>,
}

impl JsonLdSerializer {
    /// Uses `context` entries (`@vocab` and term aliases) ahead of prefixes.
    pub fn with_context(context: BTreeMap<String, String>) -> Self {
        Self { context }
    }

    pub fn set_context(&mut self, key: &str, value: &str) -> &mut Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn context_object(&self, prefixes: &PrefixMapping) -> Map<String, Value> {
        let mut context: Map<String, Value> = self
            .context
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let vocab = self.context.get("@vocab");
        for (prefix, namespace) in prefixes.namespaces() {
            if vocab.map(String::as_str) == Some(namespace) {
                continue;
            }
            context.insert(prefix.to_string(), Value::String(namespace.to_string()));
        }
        context
    }

    /// Context alias, then `@vocab` relative name, then prefixed name.
    fn short_form(&self, uri: &str, prefixes: &PrefixMapping) -> String {
        if let Some((alias, _)) = self
            .context
            .iter()
            .find(|(k, v)| v.as_str() == uri && !k.starts_with('@'))
        {
            return alias.clone();
        }
        if let (Some(vocab), Some(namespace)) = (self.context.get("@vocab"), extract_namespace(uri)) {
            if vocab == namespace {
                return uri[namespace.len()..].to_string();
            }
        }
        prefixes.short_form(uri)
    }

    pub(crate) fn node_id(&self, term: &Term, prefixes: &PrefixMapping) -> Result<String> {
        match term {
            Term::Resource(iri) => Ok(self.short_form(iri.as_str(), prefixes)),
            Term::BlankNode(b) => Ok(b.to_string()),
            Term::Literal(l) => Err(GraphStoreError::InvalidTriplet(format!(
                "literal {} cannot identify a JSON-LD node",
                l
            ))),
        }
    }

    /// `{"@id": ...}` pointing at a resource or blank node.
    pub(crate) fn reference(&self, term: &Term, prefixes: &PrefixMapping) -> Result<Value> {
        let mut reference = Map::new();
        reference.insert("@id".into(), Value::String(self.node_id(term, prefixes)?));
        Ok(Value::Object(reference))
    }

    fn node_object(&self, subject: SubjectGroup, prefixes: &PrefixMapping) -> Result<Value> {
        let mut node = Map::new();
        node.insert("@id".into(), Value::String(self.node_id(&subject.key, prefixes)?));
        for predicate in subject.items {
            let (key, value) =
                self.property(predicate?, prefixes, &mut |term| self.reference(term, prefixes))?;
            node.insert(key, value);
        }
        Ok(Value::Object(node))
    }

    /// The key and value of one predicate group. Resource and blank node
    /// objects, other than types, are rendered by `reference`.
    pub(crate) fn property(
        &self,
        group: PredicateGroup,
        prefixes: &PrefixMapping,
        reference: &mut dyn FnMut(&Term) -> Result<Value>,
    ) -> Result<(String, Value)> {
        let is_type = group.key.as_str() == RDF_TYPE;
        let key = if is_type {
            "@type".to_string()
        } else {
            self.short_form(group.key.as_str(), prefixes)
        };
        let mut values = Vec::new();
        for triplet in group.items {
            let value = match &triplet.object {
                Term::Literal(l) => self.literal(l, prefixes),
                resource if is_type => Value::String(self.node_id(resource, prefixes)?),
                resource => reference(resource)?,
            };
            values.push(value);
        }
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        Ok((key, value))
    }

    fn literal(&self, literal: &Literal, prefixes: &PrefixMapping) -> Value {
        if let Some(lang) = literal.language() {
            let mut object = Map::new();
            object.insert("@value".into(), Value::String(literal.value().to_string()));
            object.insert("@language".into(), Value::String(lang.to_string()));
            return Value::Object(object);
        }
        match literal.datatype() {
            Some(datatype) => {
                let mut object = Map::new();
                object.insert(
                    "@value".into(),
                    typed_value(literal.value(), datatype.as_str()),
                );
                object.insert(
                    "@type".into(),
                    Value::String(self.short_form(datatype.as_str(), prefixes)),
                );
                Value::Object(object)
            }
            None => Value::String(literal.value().to_string()),
        }
    }
}

/// JSON numbers for parseable `xsd:integer` and `xsd:double` values.
fn typed_value(lexical: &str, datatype: &str) -> Value {
    let number = match datatype {
        XSD_INTEGER => lexical.trim().parse::<i64>().ok().map(Number::from),
        XSD_DOUBLE => lexical
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64),
        _ => None,
    };
    number
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(lexical.to_string()))
}

impl Serializer for JsonLdSerializer {
    fn serialize(&self, out: &mut dyn Write, store: &GraphStore, prefixes: &PrefixMapping) -> Result<()> {
        let nodes = store
            .subject_groups()?
            .map(|subject| self.node_object(subject?, prefixes));
        write_document(out, &self.context_object(prefixes), nodes)
    }
}

/// Writes `{"@context": ..., "@graph": [...]}` with one node per line.
pub(crate) fn write_document<I>(out: &mut dyn Write, context: &Map<String, Value>, nodes: I) -> Result<()>
where
    I: IntoIterator<Item = Result<Value>>,
{
    writeln!(out, "{{")?;
    writeln!(out, "  \"@context\": {},", serde_json::to_string(context)?)?;
    write!(out, "  \"@graph\": [")?;
    let mut first = true;
    for node in nodes {
        write!(out, "{}\n    {}", if first { "" } else { "," }, serde_json::to_string(&node?)?)?;
        first = false;
    }
    writeln!(out, "{}]", if first { "" } else { "\n  " })?;
    writeln!(out, "}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_for_numeric_datatypes() {
        assert_eq!(typed_value("42", XSD_INTEGER), Value::from(42));
        assert_eq!(typed_value("2.5", XSD_DOUBLE), Value::from(2.5));
        assert_eq!(typed_value("NaN", XSD_DOUBLE), Value::from("NaN"));
        assert_eq!(typed_value("abc", XSD_INTEGER), Value::from("abc"));
        assert_eq!(
            typed_value("2020-01-01", "http://www.w3.org/2001/XMLSchema#date"),
            Value::from("2020-01-01")
        );
    }

    #[test]
    fn short_form_prefers_context() {
        let mut serializer = JsonLdSerializer::default();
        serializer
            .set_context("@vocab", "http://schema.org/")
            .set_context("label", "http://www.w3.org/2000/01/rdf-schema#label");
        let prefixes = PrefixMapping::with_defaults();
        assert_eq!(
            serializer.short_form("http://www.w3.org/2000/01/rdf-schema#label", &prefixes),
            "label"
        );
        assert_eq!(serializer.short_form("http://schema.org/name", &prefixes), "name");
        assert_eq!(
            serializer.short_form("http://www.w3.org/2002/07/owl#Class", &prefixes),
            "owl:Class"
        );
        assert_eq!(
            serializer.short_form("http://other.org/x", &prefixes),
            "http://other.org/x"
        );
    }

    #[test]
    fn context_skips_vocab_namespace() {
        let mut serializer = JsonLdSerializer::default();
        serializer.set_context("@vocab", "http://schema.org/");
        let mut prefixes = PrefixMapping::new();
        prefixes
            .set("schema", "http://schema.org/")
            .set("ex", "http://ex.org/");
        let context = serializer.context_object(&prefixes);
        assert_eq!(context.get("@vocab"), Some(&Value::from("http://schema.org/")));
        assert!(context.get("schema").is_none());
        assert_eq!(context.get("ex"), Some(&Value::from("http://ex.org/")));
    }
}
