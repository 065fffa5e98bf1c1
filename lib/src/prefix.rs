//! Namespace prefix bookkeeping for the serializers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_PREFIXES;

/// Maps prefixes to namespace IRIs. Iteration order is the prefix order, so
/// serializers emit deterministic prologs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMapping {
    prefix_to_uri: BTreeMap<String, String>,
}

impl PrefixMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping preloaded with `rdf`, `rdfs`, `owl` and `xsd`.
    pub fn with_defaults() -> Self {
        let mut mapping = Self::new();
        for (prefix, uri) in DEFAULT_PREFIXES {
            mapping.set(prefix, uri);
        }
        mapping
    }

    /// Maps `prefix` to `uri`. An empty prefix allocates a generated one for
    /// the namespace of `uri` instead.
    pub fn set(&mut self, prefix: &str, uri: &str) -> &mut Self {
        if prefix.is_empty() {
            self.create(uri);
        } else {
            self.prefix_to_uri.insert(prefix.to_string(), uri.to_string());
        }
        self
    }

    pub fn extend<I, P, U>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: AsRef<str>,
        U: AsRef<str>,
    {
        for (prefix, uri) in entries {
            self.set(prefix.as_ref(), uri.as_ref());
        }
        self
    }

    /// Allocates the first free `nsN` prefix for the namespace of `uri`.
    /// Returns `None` when `uri` has no `#` or `/` to cut a namespace at.
    pub fn create(&mut self, uri: &str) -> Option<(String, String)> {
        let namespace = extract_namespace(uri)?.to_string();
        let prefix = (0..)
            .map(|i| format!("ns{}", i))
            .find(|candidate| !self.prefix_to_uri.contains_key(candidate))?;
        self.prefix_to_uri.insert(prefix.clone(), namespace.clone());
        Some((prefix, namespace))
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(String::as_str)
    }

    /// Expands `prefix:local`; unknown prefixes and strings without a colon
    /// are returned unchanged.
    pub fn expand_prefix(&self, prefixed: &str) -> String {
        match prefixed.split_once(':') {
            Some((prefix, local)) => match self.get(prefix) {
                Some(uri) => format!("{}{}", uri, local),
                None => prefixed.to_string(),
            },
            None => prefixed.to_string(),
        }
    }

    /// `prefix:local` when the namespace of `uri` is mapped, else `uri`.
    pub fn short_form(&self, uri: &str) -> String {
        match self.find_namespace(uri) {
            Some((prefix, namespace)) => format!("{}:{}", prefix, &uri[namespace.len()..]),
            None => uri.to_string(),
        }
    }

    /// The prefix entry whose namespace is exactly the namespace of `uri`.
    pub fn find_namespace(&self, uri: &str) -> Option<(&str, &str)> {
        let namespace = extract_namespace(uri)?;
        self.prefix_to_uri
            .iter()
            .find(|(_, ns)| ns.as_str() == namespace)
            .map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_uri
            .iter()
            .map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefix_to_uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix_to_uri.is_empty()
    }
}

/// Everything up to and including the last `#`, or else the last `/`.
pub fn extract_namespace(uri: &str) -> Option<&str> {
    let pos = uri.rfind('#').or_else(|| uri.rfind('/'))?;
    Some(&uri[..=pos])
}
