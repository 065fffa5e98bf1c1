//! IRIs of the vocabulary terms the serializers treat specially.

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

/// Subjects typed with this class are the roots of a framed JSON-LD dump.
pub const FRAME_ROOT_TYPE: &str = "urn:resource";

/// Prefixes a fresh [`crate::PrefixMapping::with_defaults`] starts from.
pub const DEFAULT_PREFIXES: [(&str, &str); 4] = [
    ("rdf", RDF_NS),
    ("rdfs", RDFS_NS),
    ("owl", OWL_NS),
    ("xsd", XSD_NS),
];
