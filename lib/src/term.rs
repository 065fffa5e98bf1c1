//! RDF terms and their canonical string form.
//!
//! The canonical form is the N-Triples term syntax. It is the only thing the
//! store persists: index keys are concatenations of canonical forms and values
//! are canonical forms joined by `|`. Every canonical form is self-delimiting,
//! which [`Term::parse_prefix`] relies on to read a term off the front of a
//! longer string.

use std::cmp::Ordering;
use std::fmt;

use crate::consts::XSD_STRING;
use crate::errors::{GraphStoreError, Result};

/// An IRI, stored without its angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iri(String);

impl Iri {
    /// Creates an IRI, rejecting characters that cannot appear in an
    /// N-Triples IRI reference (controls, space, `<>"{}|^` backtick, `\`).
    pub fn new(iri: impl Into<String>) -> Result<Self> {
        let iri = iri.into();
        if let Some(c) = iri.chars().find(|c| is_forbidden_in_iri(*c)) {
            return Err(GraphStoreError::Parse(format!(
                "character {:?} is not allowed in IRI {:?}",
                c, iri
            )));
        }
        Ok(Self(iri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

fn is_forbidden_in_iri(c: char) -> bool {
    c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
}

/// A blank node, stored without its `_:` marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(String);

impl BlankNode {
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(GraphStoreError::Parse("empty blank node label".into()));
        }
        if let Some(c) = label.chars().find(|c| !is_blank_label_char(*c)) {
            return Err(GraphStoreError::Parse(format!(
                "character {:?} is not allowed in blank node label {:?}",
                c, label
            )));
        }
        if label.starts_with(['.', '-']) || label.ends_with('.') {
            return Err(GraphStoreError::Parse(format!(
                "blank node label {:?} may not start with '.' or '-' nor end with '.'",
                label
            )));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

// ':' is excluded so that "_:" always marks the start of a new term inside a key.
fn is_blank_label_char(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !matches!(c, ':' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '@')
}

/// A literal with at most one of a datatype or a language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    datatype: Option<Iri>,
    language: Option<String>,
}

impl Literal {
    pub fn new_simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// `xsd:string` is the implicit datatype of a simple literal and is dropped.
    pub fn new_typed(value: impl Into<String>, datatype: Iri) -> Self {
        let datatype = if datatype.as_str() == XSD_STRING {
            None
        } else {
            Some(datatype)
        };
        Self {
            value: value.into(),
            datatype,
            language: None,
        }
    }

    pub fn new_language_tagged(value: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let language = language.into();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(GraphStoreError::Parse(format!(
                "invalid language tag {:?}",
                language
            )));
        }
        Ok(Self {
            value: value.into(),
            datatype: None,
            language: Some(language),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_literal(&self.value))?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^{}", dt)
        } else {
            Ok(())
        }
    }
}

/// Escapes a lexical value for the quoted canonical form.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// A subject or object position term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Resource(Iri),
    BlankNode(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn resource(iri: impl Into<String>) -> Result<Self> {
        Ok(Term::Resource(Iri::new(iri)?))
    }

    pub fn blank(label: impl Into<String>) -> Result<Self> {
        Ok(Term::BlankNode(BlankNode::new(label)?))
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal::new_simple(value))
    }

    /// The label without syntax: IRI text, blank node label or lexical value.
    pub fn label(&self) -> &str {
        match self {
            Term::Resource(iri) => iri.as_str(),
            Term::BlankNode(b) => b.as_str(),
            Term::Literal(l) => l.value(),
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Term::Resource(_))
    }

    pub fn as_resource(&self) -> Option<&Iri> {
        match self {
            Term::Resource(iri) => Some(iri),
            _ => None,
        }
    }

    /// The canonical string form used for keys and values.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Parses a complete canonical string.
    pub fn parse(source: &str) -> Result<Self> {
        let (term, rest) = Self::parse_prefix(source)?;
        if !rest.is_empty() {
            return Err(GraphStoreError::Parse(format!(
                "trailing characters {:?} after term in {:?}",
                rest, source
            )));
        }
        Ok(term)
    }

    /// Reads one canonical term off the front of `source`, returning the term
    /// and the unread remainder.
    pub fn parse_prefix(source: &str) -> Result<(Self, &str)> {
        match source.chars().next() {
            Some('<') => {
                let (iri, rest) = parse_iri(source)?;
                Ok((Term::Resource(iri), rest))
            }
            Some('_') => {
                let body = source.strip_prefix("_:").ok_or_else(|| {
                    GraphStoreError::Parse(format!("expected \"_:\" in {:?}", source))
                })?;
                let end = body
                    .char_indices()
                    .find(|(_, c)| !is_blank_label_char(*c))
                    .map(|(i, _)| i)
                    .unwrap_or(body.len());
                let node = BlankNode::new(&body[..end])?;
                Ok((Term::BlankNode(node), &body[end..]))
            }
            Some('"') => {
                let (literal, rest) = parse_literal(source)?;
                Ok((Term::Literal(literal), rest))
            }
            _ => Err(GraphStoreError::Parse(format!(
                "exception while parsing: {:?}",
                source
            ))),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Resource(iri) => iri.fmt(f),
            Term::BlankNode(b) => b.fmt(f),
            Term::Literal(l) => l.fmt(f),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Resource(iri)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

fn parse_iri(source: &str) -> Result<(Iri, &str)> {
    let body = &source[1..];
    let end = body
        .find('>')
        .ok_or_else(|| GraphStoreError::Parse(format!("unterminated IRI in {:?}", source)))?;
    Ok((Iri::new(&body[..end])?, &body[end + 1..]))
}

fn parse_literal(source: &str) -> Result<(Literal, &str)> {
    let mut value = String::new();
    let mut chars = source.char_indices().skip(1);
    let mut close = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                close = Some(i);
                break;
            }
            '\\' => {
                let (_, e) = chars.next().ok_or_else(|| {
                    GraphStoreError::Parse(format!("dangling escape in {:?}", source))
                })?;
                match e {
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    '\\' => value.push('\\'),
                    'u' | 'U' => {
                        let len = if e == 'u' { 4 } else { 8 };
                        let hex: String = chars.by_ref().take(len).map(|(_, h)| h).collect();
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .filter(|_| hex.len() == len)
                            .and_then(char::from_u32)
                            .ok_or_else(|| {
                                GraphStoreError::Parse(format!(
                                    "invalid unicode escape {:?} in {:?}",
                                    hex, source
                                ))
                            })?;
                        value.push(decoded);
                    }
                    other => {
                        return Err(GraphStoreError::Parse(format!(
                            "unknown escape \\{} in {:?}",
                            other, source
                        )))
                    }
                }
            }
            c => value.push(c),
        }
    }
    let close = close
        .ok_or_else(|| GraphStoreError::Parse(format!("unterminated literal in {:?}", source)))?;
    let rest = &source[close + 1..];

    if let Some(tagged) = rest.strip_prefix('@') {
        let end = tagged
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-'))
            .map(|(i, _)| i)
            .unwrap_or(tagged.len());
        let literal = Literal::new_language_tagged(value, &tagged[..end])?;
        Ok((literal, &tagged[end..]))
    } else if let Some(typed) = rest.strip_prefix("^^") {
        if !typed.starts_with('<') {
            return Err(GraphStoreError::Parse(format!(
                "expected datatype IRI in {:?}",
                source
            )));
        }
        let (datatype, rest) = parse_iri(typed)?;
        Ok((Literal::new_typed(value, datatype), rest))
    } else {
        Ok((Literal::new_simple(value), rest))
    }
}
