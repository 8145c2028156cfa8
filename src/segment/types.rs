//! Core types for the in-memory segment store

use std::fmt;

/// Segment identifier (monotonically increasing per writer)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document number within a segment (0..doc_count)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Iterator over matching document numbers of one segment
#[derive(Debug, Default)]
pub struct DocIdIterator {
    docs: std::vec::IntoIter<DocNo>,
}

impl DocIdIterator {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_docs(docs: Vec<DocNo>) -> Self {
        Self {
            docs: docs.into_iter(),
        }
    }
}

impl Iterator for DocIdIterator {
    type Item = DocNo;

    fn next(&mut self) -> Option<DocNo> {
        self.docs.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.docs.size_hint()
    }
}

impl ExactSizeIterator for DocIdIterator {}
