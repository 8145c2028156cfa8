//! Immutable in-memory segment
//!
//! A segment holds per-field term postings and the primary key column.
//! Only its delete bitset changes after creation; deletes are shared by
//! every snapshot holding the segment.

use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::collections::HashMap;

use super::docno_map::DocNoMap;
use super::types::{DocNo, SegmentId};
use crate::error::CorruptKeyError;
use crate::pk;

/// Term bytes -> docnos containing the term
pub type TermPostings = HashMap<Vec<u8>, RoaringBitmap>;

/// Metadata of a segment
#[derive(Clone, Debug)]
pub struct SegmentMeta {
    /// Unique segment identifier
    pub id: SegmentId,
    /// Number of documents in the segment
    pub doc_count: u32,
    /// Number of indexed fields
    pub field_count: usize,
    /// Approximate size in bytes
    pub size_bytes: u64,
    /// CRC32 of the primary key column at creation
    pub checksum: u32,
}

/// Immutable segment reader
#[derive(Debug)]
pub struct SegmentReader {
    meta: SegmentMeta,
    fields: HashMap<String, TermPostings>,
    docno_map: RwLock<DocNoMap>,
}

impl SegmentReader {
    /// Create a segment from in-memory data
    pub fn from_memory(
        id: SegmentId,
        fields: HashMap<String, TermPostings>,
        docno_map: DocNoMap,
    ) -> Self {
        let size_bytes = fields
            .iter()
            .map(|(name, terms)| {
                name.len()
                    + terms
                        .iter()
                        .map(|(term, docs)| term.len() + docs.serialized_size())
                        .sum::<usize>()
            })
            .sum::<usize>()
            + docno_map.size_bytes();

        let meta = SegmentMeta {
            id,
            doc_count: docno_map.len() as u32,
            field_count: fields.len(),
            size_bytes: size_bytes as u64,
            checksum: docno_map.checksum(),
        };
        Self {
            meta,
            fields,
            docno_map: RwLock::new(docno_map),
        }
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    pub fn live_doc_count(&self) -> u32 {
        self.docno_map.read().live_count() as u32
    }

    pub fn is_deleted(&self, docno: DocNo) -> bool {
        self.docno_map.read().is_deleted(docno)
    }

    pub fn is_live(&self, docno: DocNo) -> bool {
        self.docno_map.read().is_live(docno)
    }

    /// Mark a document deleted; returns `true` if it was live
    pub fn delete(&self, docno: DocNo) -> bool {
        self.docno_map.write().delete(docno)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All docnos (live or not) containing `term` in `field`
    pub fn postings(&self, field: &str, term: &[u8]) -> Option<&RoaringBitmap> {
        self.fields.get(field)?.get(term)
    }

    /// Number of live documents containing `term` in `field`
    pub fn doc_frequency(&self, field: &str, term: &[u8]) -> u64 {
        let Some(postings) = self.postings(field, term) else {
            return 0;
        };
        postings.len() - (postings & self.docno_map.read().deleted_bitset()).len()
    }

    /// Live docnos containing `term` in `field`, in ascending order
    pub fn live_docs_with_term(&self, field: &str, term: &[u8]) -> Vec<DocNo> {
        let Some(postings) = self.postings(field, term) else {
            return Vec::new();
        };
        let docno_map = self.docno_map.read();
        postings
            .iter()
            .map(DocNo::new)
            .filter(|docno| !docno_map.is_deleted(*docno))
            .collect()
    }

    /// Decoded primary key of a document
    pub fn primary_key(&self, docno: DocNo) -> Result<Option<u64>, CorruptKeyError> {
        self.docno_map.read().key(docno).map(pk::decode).transpose()
    }

    /// Whether the key column still matches the checksum taken at creation
    pub fn verify_checksum(&self) -> bool {
        self.docno_map.read().checksum() == self.meta.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pk::{encode, PK_COLUMN};

    fn segment() -> SegmentReader {
        let mut docno_map = DocNoMap::new();
        let mut pk_terms = TermPostings::new();
        let mut words = TermPostings::new();
        for (i, id) in [10u64, 20, 30].iter().enumerate() {
            let docno = docno_map.add(encode(*id));
            pk_terms
                .entry(encode(*id).to_vec())
                .or_default()
                .insert(docno.as_u32());
            words
                .entry(b"shared".to_vec())
                .or_default()
                .insert(i as u32);
        }
        let mut fields = HashMap::new();
        fields.insert(PK_COLUMN.to_string(), pk_terms);
        fields.insert("body\u{1}identity".to_string(), words);
        SegmentReader::from_memory(SegmentId(1), fields, docno_map)
    }

    #[test]
    fn test_meta() {
        let segment = segment();
        assert_eq!(segment.id(), SegmentId(1));
        assert_eq!(segment.doc_count(), 3);
        assert_eq!(segment.meta().field_count, 2);
        assert!(segment.verify_checksum());
    }

    #[test]
    fn test_postings_and_deletes() {
        let segment = segment();
        assert_eq!(segment.doc_frequency("body\u{1}identity", b"shared"), 3);

        assert!(segment.delete(DocNo(1)));
        assert!(!segment.delete(DocNo(1)));
        assert_eq!(segment.live_doc_count(), 2);
        assert_eq!(segment.doc_frequency("body\u{1}identity", b"shared"), 2);
        assert_eq!(
            segment.live_docs_with_term("body\u{1}identity", b"shared"),
            vec![DocNo(0), DocNo(2)]
        );
        assert!(segment.live_docs_with_term("missing", b"shared").is_empty());
    }

    #[test]
    fn test_primary_key_column() {
        let segment = segment();
        assert_eq!(segment.primary_key(DocNo(2)).unwrap(), Some(30));
        assert_eq!(segment.primary_key(DocNo(9)).unwrap(), None);
    }
}
