//! Removal of documents by primary key
//!
//! A filter is prepared against one snapshot and then executed against each
//! of its segments in turn. Outside recovery a filter removes at most once:
//! once executed, preparing it again against the same snapshot yields a
//! filter that matches nothing. During log replay the same removal may be
//! applied repeatedly, so preparation always yields a live filter.

use std::cell::Cell;
use std::fmt;
use std::ptr;
use tracing::{debug, warn};

use super::codec::{EncodedKey, PrimaryKey, PK_COLUMN};
use super::recovery::RecoveryMode;
use crate::segment::{DocIdIterator, DocNo, IndexSnapshot, SegmentReader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterState {
    Unprepared,
    Prepared { generation: u64 },
    Executed { generation: u64 },
}

/// Matches the document whose primary key equals `key`
pub struct PrimaryKeyFilter {
    key: PrimaryKey,
    term: EncodedKey,
    state: Cell<FilterState>,
}

impl PrimaryKeyFilter {
    pub fn new(key: PrimaryKey) -> Self {
        Self {
            key,
            term: key.encode(),
            state: Cell::new(FilterState::Unprepared),
        }
    }

    pub fn key(&self) -> PrimaryKey {
        self.key
    }

    pub fn state(&self) -> FilterState {
        self.state.get()
    }

    /// Bind the filter to `snapshot`
    pub fn prepare(&self, snapshot: &IndexSnapshot, mode: RecoveryMode) -> PreparedFilter<'_> {
        let generation = snapshot.generation();
        if let FilterState::Executed { generation: executed } = self.state.get() {
            if executed == generation && !mode.is_replay() {
                debug!(key = %self.key, generation, "Filter already executed against snapshot");
                return PreparedFilter::Empty;
            }
        }
        self.state.set(FilterState::Prepared { generation });
        PreparedFilter::Key {
            filter: self,
            generation,
        }
    }

    fn execute(&self, generation: u64, segment: &SegmentReader, mode: RecoveryMode) -> DocIdIterator {
        self.state.set(FilterState::Executed { generation });

        let mut docs = Vec::new();
        for docno in segment.live_docs_with_term(PK_COLUMN, &self.term) {
            if self.stored_key_matches(segment, docno) {
                docs.push(docno);
            }
        }

        if docs.len() > 1 && !mode.is_replay() {
            warn!(
                key = %self.key,
                segment = %segment.id(),
                matches = docs.len(),
                "Primary key is not unique within segment"
            );
        }
        DocIdIterator::from_docs(docs)
    }

    fn stored_key_matches(&self, segment: &SegmentReader, docno: DocNo) -> bool {
        match segment.primary_key(docno) {
            Ok(Some(id)) => id == self.key.id(),
            Ok(None) => false,
            Err(err) => {
                warn!(segment = %segment.id(), docno = docno.as_u32(), error = %err, "Skipping document");
                false
            }
        }
    }
}

impl fmt::Debug for PrimaryKeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryKeyFilter")
            .field("key", &self.key)
            .field("state", &self.state.get())
            .finish()
    }
}

/// A filter bound to a snapshot, or one that matches nothing
#[derive(Clone, Copy, Debug)]
pub enum PreparedFilter<'f> {
    Key {
        filter: &'f PrimaryKeyFilter,
        generation: u64,
    },
    Empty,
}

impl PreparedFilter<'_> {
    /// Live documents of `segment` holding the key
    pub fn execute(&self, segment: &SegmentReader, mode: RecoveryMode) -> DocIdIterator {
        match self {
            PreparedFilter::Key { filter, generation } => filter.execute(*generation, segment, mode),
            PreparedFilter::Empty => DocIdIterator::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PreparedFilter::Empty)
    }
}

impl PartialEq for PreparedFilter<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                PreparedFilter::Key {
                    filter: a,
                    generation: ga,
                },
                PreparedFilter::Key {
                    filter: b,
                    generation: gb,
                },
            ) => ptr::eq(*a, *b) && ga == gb,
            (PreparedFilter::Empty, PreparedFilter::Empty) => true,
            _ => false,
        }
    }
}

/// Owns the filters of one batch of removals
#[derive(Debug, Default)]
pub struct PrimaryKeyFilterContainer {
    filters: Vec<PrimaryKeyFilter>,
}

impl PrimaryKeyFilterContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter for `key` and return it
    pub fn emplace(&mut self, key: PrimaryKey) -> &PrimaryKeyFilter {
        let index = self.filters.len();
        self.filters.push(PrimaryKeyFilter::new(key));
        &self.filters[index]
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrimaryKeyFilter> {
        self.filters.iter()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }
}

impl<'c> IntoIterator for &'c PrimaryKeyFilterContainer {
    type Item = &'c PrimaryKeyFilter;
    type IntoIter = std::slice::Iter<'c, PrimaryKeyFilter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}
