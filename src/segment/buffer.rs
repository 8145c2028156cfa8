//! Mutable buffer for uncommitted documents
//!
//! Documents are indexed into in-memory postings as they are inserted. A
//! commit turns each buffer into an immutable segment.

use std::collections::HashMap;

use super::docno_map::DocNoMap;
use super::reader::{SegmentReader, TermPostings};
use super::types::{DocNo, SegmentId};
use crate::document::FieldIterator;
use crate::pk::{PrimaryKey, PK_COLUMN};

/// In-memory buffer of documents awaiting commit
#[derive(Debug, Default)]
pub struct MutableBuffer {
    /// Field name -> term -> docnos
    fields: HashMap<String, TermPostings>,
    docno_map: DocNoMap,
    /// Approximate size in bytes
    size_bytes: usize,
}

impl MutableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document: its primary key plus every field the iterator yields
    ///
    /// Returns the assigned docno and the number of fields indexed.
    pub fn index_document(&mut self, key: PrimaryKey, fields: &mut FieldIterator<'_>) -> (DocNo, usize) {
        let encoded = key.encode();
        let docno = self.docno_map.add(encoded);
        self.add_term(PK_COLUMN, encoded.to_vec(), docno);

        let mut field_count = 0;
        while fields.valid() {
            if let Some(field) = fields.field_mut() {
                let name = field.name().to_string();
                while let Some(token) = field.next_token() {
                    self.add_term(&name, token.term, docno);
                }
                field_count += 1;
            }
            fields.advance();
        }
        (docno, field_count)
    }

    fn add_term(&mut self, field: &str, term: Vec<u8>, docno: DocNo) {
        if !self.fields.contains_key(field) {
            self.size_bytes += field.len();
            self.fields.insert(field.to_string(), TermPostings::new());
        }
        self.size_bytes += term.len() + std::mem::size_of::<u32>();
        if let Some(terms) = self.fields.get_mut(field) {
            terms.entry(term).or_default().insert(docno.as_u32());
        }
    }

    pub fn doc_count(&self) -> usize {
        self.docno_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docno_map.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Freeze the buffer into a segment
    pub fn into_segment(self, id: SegmentId) -> SegmentReader {
        SegmentReader::from_memory(id, self.fields, self.docno_map)
    }
}
