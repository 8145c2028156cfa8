use std::sync::Arc;

use super::reader::SegmentReader;

/// Immutable, ordered view of the committed segments
///
/// Snapshots are identified by their generation, which every published
/// commit increments.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    generation: u64,
    segments: Vec<Arc<SegmentReader>>,
}

impl IndexSnapshot {
    pub fn new(generation: u64, segments: Vec<Arc<SegmentReader>>) -> Self {
        Self {
            generation,
            segments,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn segments(&self) -> &[Arc<SegmentReader>] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Documents in all segments, deleted ones included
    pub fn doc_count(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.doc_count())).sum()
    }

    pub fn live_doc_count(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.live_doc_count())).sum()
    }
}
