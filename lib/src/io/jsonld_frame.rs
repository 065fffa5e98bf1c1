use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use serde_json::{Map, Value};

use crate::consts::{FRAME_ROOT_TYPE, RDF_TYPE};
use crate::errors::Result;
use crate::group::PredicateGroups;
use crate::io::jsonld::{write_document, JsonLdSerializer};
use crate::io::Serializer;
use crate::prefix::PrefixMapping;
use crate::store::GraphStore;
use crate::term::{Iri, Term};

/// Framed JSON-LD. The `@graph` holds the subjects typed
/// `<urn:resource>`, found through the POS index, and every resource they
/// reference is embedded in place the first time it is met. Later
/// references to an embedded node stay `{"@id": ...}`.
#[derive(Debug, Clone, Default)]
pub struct JsonLdFrameSerializer {
    inner: JsonLdSerializer,
}

impl JsonLdFrameSerializer {
    pub fn with_context(context: BTreeMap<String, String>) -> Self {
        Self {
            inner: JsonLdSerializer::with_context(context),
        }
    }

    fn framed_node(
        &self,
        store: &GraphStore,
        node: &Term,
        prefixes: &PrefixMapping,
        visited: &mut HashSet<Term>,
    ) -> Result<Value> {
        visited.insert(node.clone());
        let mut object = Map::new();
        object.insert("@id".into(), Value::String(self.inner.node_id(node, prefixes)?));

        let triplets = store.query_spo(Some(node), None, None)?.collect_triplets()?;
        for predicate in PredicateGroups::new(triplets.into_iter()) {
            let (key, value) = self.inner.property(predicate?, prefixes, &mut |term| {
                if visited.contains(term) {
                    self.inner.reference(term, prefixes)
                } else {
                    self.framed_node(store, term, prefixes, visited)
                }
            })?;
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

impl Serializer for JsonLdFrameSerializer {
    fn serialize(&self, out: &mut dyn Write, store: &GraphStore, prefixes: &PrefixMapping) -> Result<()> {
        let rdf_type = Iri::new(RDF_TYPE)?;
        let root_type = Term::resource(FRAME_ROOT_TYPE)?;
        let mut visited = HashSet::new();
        let nodes = store
            .query_pos(Some(&rdf_type), Some(&root_type), None)?
            .filter_map(|root| match root {
                Err(e) => Some(Err(e)),
                Ok(root) if visited.contains(&root.subject) => None,
                Ok(root) => Some(self.framed_node(store, &root.subject, prefixes, &mut visited)),
            });
        write_document(out, &self.inner.context_object(prefixes), nodes)
    }
}
