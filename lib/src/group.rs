//! Streaming grouping of an already ordered triplet stream.
//!
//! [`GroupBy`] partitions a source into contiguous groups by a selector. It
//! never sorts: triplets sharing a key must already be adjacent, which the SPO
//! index guarantees for subjects and, within a subject, for predicates. Only
//! the group being assembled is buffered.
//!
//! ```no_run
//! # fn main() -> graphstore::Result<()> {
//! let store = graphstore::GraphStore::open_default("/tmp/example.db")?;
//! for subject in store.subject_groups()? {
//!     let subject = subject?;
//!     for predicate in subject.items {
//!         let predicate = predicate?;
//!         let objects: Vec<_> = predicate.items.map(|t| t.object).collect();
//!         println!("{} {} {:?}", subject.key, predicate.key, objects);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::iter::FusedIterator;
use std::mem;

use crate::errors::Result;
use crate::term::{Iri, Term};
use crate::triplet::Triplet;

/// The triplets of one group, in source order.
pub type Buffered = std::vec::IntoIter<Triplet>;

/// A selected key and the iterator over the members sharing it.
#[derive(Debug)]
pub struct Group<K, I> {
    pub key: K,
    pub items: I,
}

/// Groups an ordered source with a selector `S` and a group constructor `C`.
pub struct GroupBy<I, K, G, S, C> {
    source: I,
    select: S,
    construct: C,
    current_key: Option<K>,
    buffer: Vec<Triplet>,
    peeked: Option<Result<G>>,
    exhausted: bool,
}

/// Builds a [`GroupBy`] over `source`.
pub fn group_by<I, K, G, S, C>(source: I, select: S, construct: C) -> GroupBy<I, K, G, S, C>
where
    I: Iterator<Item = Result<Triplet>>,
    K: PartialEq,
    S: FnMut(&Triplet) -> K,
    C: FnMut(K, Buffered) -> G,
{
    GroupBy {
        source,
        select,
        construct,
        current_key: None,
        buffer: Vec::new(),
        peeked: None,
        exhausted: false,
    }
}

impl<I, K, G, S, C> GroupBy<I, K, G, S, C>
where
    I: Iterator<Item = Result<Triplet>>,
    K: PartialEq,
    S: FnMut(&Triplet) -> K,
    C: FnMut(K, Buffered) -> G,
{
    /// Computes the next group if none is pending and returns it without
    /// consuming it. Repeated calls return the same pending group.
    pub fn peek(&mut self) -> Option<&Result<G>> {
        if self.peeked.is_none() {
            self.peeked = self.advance();
        }
        self.peeked.as_ref()
    }

    pub fn has_next(&mut self) -> bool {
        self.peek().is_some()
    }

    fn advance(&mut self) -> Option<Result<G>> {
        if self.exhausted {
            return None;
        }
        loop {
            match self.source.next() {
                Some(Ok(triplet)) => {
                    let key = (self.select)(&triplet);
                    match self.current_key.take() {
                        Some(open) if open != key => {
                            let members = mem::replace(&mut self.buffer, vec![triplet]);
                            self.current_key = Some(key);
                            return Some(Ok((self.construct)(open, members.into_iter())));
                        }
                        _ => {
                            self.buffer.push(triplet);
                            self.current_key = Some(key);
                        }
                    }
                }
                Some(Err(e)) => {
                    // a failed read aborts the whole grouping
                    self.exhausted = true;
                    self.current_key = None;
                    self.buffer.clear();
                    return Some(Err(e));
                }
                None => {
                    self.exhausted = true;
                    let key = self.current_key.take()?;
                    if self.buffer.is_empty() {
                        return None;
                    }
                    let members = mem::take(&mut self.buffer);
                    return Some(Ok((self.construct)(key, members.into_iter())));
                }
            }
        }
    }
}

impl<I, K, G, S, C> Iterator for GroupBy<I, K, G, S, C>
where
    I: Iterator<Item = Result<Triplet>>,
    K: PartialEq,
    S: FnMut(&Triplet) -> K,
    C: FnMut(K, Buffered) -> G,
{
    type Item = Result<G>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.peeked.take() {
            Some(pending) => Some(pending),
            None => self.advance(),
        }
    }
}

impl<I, K, G, S, C> FusedIterator for GroupBy<I, K, G, S, C>
where
    I: Iterator<Item = Result<Triplet>>,
    K: PartialEq,
    S: FnMut(&Triplet) -> K,
    C: FnMut(K, Buffered) -> G,
{
}

type Select<K> = fn(&Triplet) -> K;
type Construct<K, G> = fn(K, Buffered) -> G;
type Lifted = std::iter::Map<Buffered, fn(Triplet) -> Result<Triplet>>;

pub type PredicateGroup = Group<Iri, Buffered>;
pub type SubjectGroup = Group<Term, PredicateGroups>;

/// One subject's triplets grouped by predicate.
pub struct PredicateGroups {
    inner: GroupBy<Lifted, Iri, PredicateGroup, Select<Iri>, Construct<Iri, PredicateGroup>>,
}

impl PredicateGroups {
    pub fn new(triplets: Buffered) -> Self {
        let lifted: Lifted = triplets.map(Ok as fn(Triplet) -> Result<Triplet>);
        Self {
            inner: group_by(
                lifted,
                select_predicate as Select<Iri>,
                predicate_group as Construct<Iri, PredicateGroup>,
            ),
        }
    }

    pub fn peek(&mut self) -> Option<&Result<PredicateGroup>> {
        self.inner.peek()
    }

    pub fn has_next(&mut self) -> bool {
        self.inner.has_next()
    }
}

impl Iterator for PredicateGroups {
    type Item = Result<PredicateGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl FusedIterator for PredicateGroups {}

/// An SPO-ordered stream grouped by subject, each subject exposing its
/// [`PredicateGroups`].
pub struct SubjectGroups<I> {
    inner: GroupBy<I, Term, SubjectGroup, Select<Term>, Construct<Term, SubjectGroup>>,
}

impl<I> SubjectGroups<I>
where
    I: Iterator<Item = Result<Triplet>>,
{
    pub fn new(source: I) -> Self {
        Self {
            inner: group_by(
                source,
                select_subject as Select<Term>,
                subject_group as Construct<Term, SubjectGroup>,
            ),
        }
    }

    pub fn peek(&mut self) -> Option<&Result<SubjectGroup>> {
        self.inner.peek()
    }

    pub fn has_next(&mut self) -> bool {
        self.inner.has_next()
    }
}

impl<I> Iterator for SubjectGroups<I>
where
    I: Iterator<Item = Result<Triplet>>,
{
    type Item = Result<SubjectGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<I> FusedIterator for SubjectGroups<I> where I: Iterator<Item = Result<Triplet>> {}

fn select_subject(triplet: &Triplet) -> Term {
    triplet.subject.clone()
}

fn select_predicate(triplet: &Triplet) -> Iri {
    triplet.predicate.clone()
}

fn subject_group(key: Term, items: Buffered) -> SubjectGroup {
    Group {
        key,
        items: PredicateGroups::new(items),
    }
}

fn predicate_group(key: Iri, items: Buffered) -> PredicateGroup {
    Group { key, items }
}
