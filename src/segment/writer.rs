//! Index writer: buffers inserts and primary-key removals, publishes snapshots
//!
//! Inserts and removals are queued through a [`DocumentsContext`]. A commit
//! first applies the queued removals to the previous snapshot's segments,
//! then freezes the buffered documents into new segments and publishes the
//! result as the next snapshot.
//!
//! A removal also covers documents buffered before it in the same commit,
//! but never documents buffered after it, so a remove followed by an insert
//! of the same key replaces the document.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::buffer::MutableBuffer;
use super::reader::SegmentReader;
use super::snapshot::IndexSnapshot;
use super::types::{DocNo, SegmentId};
use crate::config::WriterConfig;
use crate::document::FieldIterator;
use crate::error::{DoclinkError, Result};
use crate::link::LinkConfig;
use crate::metrics::IndexMetrics;
use crate::pk::{PrimaryKey, PrimaryKeyFilterContainer, RecoveryFlag};

/// A queued removal; `watermark` counts the documents buffered before it
#[derive(Clone, Copy, Debug)]
struct PendingRemoval {
    key: PrimaryKey,
    watermark: usize,
}

#[derive(Debug, Default)]
struct PendingChanges {
    /// Buffers that reached `max_segment_docs`
    sealed: Vec<MutableBuffer>,
    active: MutableBuffer,
    removals: Vec<PendingRemoval>,
    doc_count: usize,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.doc_count == 0 && self.removals.is_empty()
    }

    fn largest_buffer(&self) -> usize {
        self.sealed
            .iter()
            .chain(std::iter::once(&self.active))
            .map(MutableBuffer::doc_count)
            .max()
            .unwrap_or(0)
    }

    fn into_buffers(mut self) -> (Vec<MutableBuffer>, Vec<PendingRemoval>) {
        if !self.active.is_empty() {
            self.sealed.push(self.active);
        }
        (self.sealed, self.removals)
    }
}

/// Outcome of a published commit
#[derive(Clone, Debug)]
pub struct CommitStats {
    pub generation: u64,
    pub documents_inserted: usize,
    pub documents_removed: usize,
    pub segments_created: usize,
}

/// Single-index writer over in-memory segments
pub struct IndexWriter {
    config: WriterConfig,
    snapshot: ArcSwap<IndexSnapshot>,
    pending: Mutex<PendingChanges>,
    commit_lock: Mutex<()>,
    next_segment_id: AtomicU64,
    recovery: RecoveryFlag,
    metrics: Option<IndexMetrics>,
}

impl IndexWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            snapshot: ArcSwap::from_pointee(IndexSnapshot::default()),
            pending: Mutex::new(PendingChanges::default()),
            commit_lock: Mutex::new(()),
            next_segment_id: AtomicU64::new(0),
            recovery: RecoveryFlag::new(),
            metrics: None,
        }
    }

    /// Use a recovery flag shared with the storage engine
    pub fn with_recovery_flag(mut self, flag: RecoveryFlag) -> Self {
        self.recovery = flag;
        self
    }

    pub fn with_metrics(mut self, metrics: IndexMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn recovery_flag(&self) -> &RecoveryFlag {
        &self.recovery
    }

    pub fn metrics(&self) -> Option<&IndexMetrics> {
        self.metrics.as_ref()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.load_full()
    }

    /// Open a batch of inserts and removals
    pub fn documents(&self) -> DocumentsContext<'_> {
        DocumentsContext {
            writer: self,
            inserted: 0,
            removed: 0,
        }
    }

    /// Documents and removals queued for the next commit
    pub fn pending_documents(&self) -> usize {
        self.pending.lock().doc_count
    }

    fn queue_removal(&self, key: PrimaryKey) {
        let mut pending = self.pending.lock();
        let watermark = pending.doc_count;
        pending.removals.push(PendingRemoval { key, watermark });
    }

    fn buffer_document(&self, key: PrimaryKey, fields: &mut FieldIterator<'_>) -> usize {
        let mut pending = self.pending.lock();
        let (_, field_count) = pending.active.index_document(key, fields);
        pending.doc_count += 1;

        let max_docs = self.config.max_segment_docs;
        if max_docs > 0 && pending.active.doc_count() >= max_docs {
            let full = std::mem::take(&mut pending.active);
            pending.sealed.push(full);
        }
        drop(pending);

        if let Some(metrics) = &self.metrics {
            metrics.record_insert(field_count);
        }
        field_count
    }

    fn allocate_segment_id(&self) -> SegmentId {
        SegmentId::new(self.next_segment_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Apply queued changes and publish a new snapshot
    ///
    /// Returns `None` when nothing was queued.
    pub fn commit(&self) -> Result<Option<CommitStats>> {
        self.commit_bounded(u32::MAX as usize)
    }

    /// Commit unless a segment would exceed `max_docs`; on error the queued
    /// changes stay pending
    fn commit_bounded(&self, max_docs: usize) -> Result<Option<CommitStats>> {
        let _commit = self.commit_lock.lock();
        let changes = {
            let mut pending = self.pending.lock();
            let largest = pending.largest_buffer();
            if largest > max_docs {
                return Err(DoclinkError::IndexError(format!(
                    "segment would hold {} documents",
                    largest
                )));
            }
            std::mem::take(&mut *pending)
        };
        if changes.is_empty() {
            return Ok(None);
        }

        let started = Instant::now();
        let mode = self.recovery.mode();
        let previous = self.snapshot.load_full();
        let documents_inserted = changes.doc_count;
        let (buffers, removals) = changes.into_buffers();

        // freeze buffers, remembering the ordinal of each segment's first doc
        let mut created = Vec::with_capacity(buffers.len());
        let mut base = 0usize;
        for buffer in buffers {
            let doc_count = buffer.doc_count();
            let segment = Arc::new(buffer.into_segment(self.allocate_segment_id()));
            created.push((base, segment));
            base += doc_count;
        }

        let mut container = PrimaryKeyFilterContainer::new();
        for removal in &removals {
            container.emplace(removal.key);
        }

        let mut documents_removed = 0usize;
        for (filter, removal) in container.iter().zip(&removals) {
            let prepared = filter.prepare(&previous, mode);
            for segment in previous.segments() {
                documents_removed += delete_all(segment, prepared.execute(segment, mode));
            }
            for (base, segment) in &created {
                let earlier = prepared
                    .execute(segment, mode)
                    .filter(|docno| base + docno.as_usize() < removal.watermark);
                documents_removed += delete_all(segment, earlier);
            }
        }

        let mut segments = previous.segments().to_vec();
        segments.extend(created.iter().map(|(_, segment)| segment.clone()));
        segments.retain(|segment| segment.live_doc_count() > 0);

        let generation = previous.generation() + 1;
        let snapshot = IndexSnapshot::new(generation, segments);
        let live_documents = snapshot.live_doc_count();
        let segment_count = snapshot.segment_count();
        self.snapshot.store(Arc::new(snapshot));

        if let Some(metrics) = &self.metrics {
            metrics.record_removed(documents_removed);
            metrics.record_commit(started.elapsed().as_secs_f64(), segment_count, live_documents);
        }

        debug!(
            generation,
            inserted = documents_inserted,
            removed = documents_removed,
            replay = mode.is_replay(),
            "Published commit"
        );
        if mode.is_replay() {
            info!(generation, removals = removals.len(), "Replayed removals");
        }

        Ok(Some(CommitStats {
            generation,
            documents_inserted,
            documents_removed,
            segments_created: created.len(),
        }))
    }
}

impl Default for IndexWriter {
    fn default() -> Self {
        Self::new(WriterConfig::default())
    }
}

fn delete_all(segment: &SegmentReader, docs: impl Iterator<Item = DocNo>) -> usize {
    docs.filter(|docno| segment.delete(*docno)).count()
}

/// Batch handle for queuing inserts and removals
///
/// Operations are applied in the order they were queued at the next
/// [`IndexWriter::commit`].
pub struct DocumentsContext<'w> {
    writer: &'w IndexWriter,
    inserted: usize,
    removed: usize,
}

impl DocumentsContext<'_> {
    /// Queue removal of the document holding `key`
    pub fn remove(&mut self, key: PrimaryKey) {
        self.writer.queue_removal(key);
        self.removed += 1;
    }

    /// Buffer a document from a field iterator; returns the fields indexed
    pub fn insert(&mut self, key: PrimaryKey, fields: &mut FieldIterator<'_>) -> usize {
        self.inserted += 1;
        self.writer.buffer_document(key, fields)
    }

    /// Flatten `document` under `config` and buffer it
    pub fn insert_document(&mut self, key: PrimaryKey, document: &Value, config: &LinkConfig) -> usize {
        let mut fields = FieldIterator::new();
        fields.reset(document, config);
        self.insert(key, &mut fields)
    }

    /// Remove then insert `key` in one step
    pub fn replace_document(&mut self, key: PrimaryKey, document: &Value, config: &LinkConfig) -> usize {
        self.remove(key);
        self.insert_document(key, document, config)
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn removed(&self) -> usize {
        self.removed
    }
}
