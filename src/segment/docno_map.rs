//! Dense document number mapping
//!
//! Each segment allocates a dense `docno: u32` in `[0..doc_count)` space and
//! keeps the encoded primary key of every document in that order, plus the
//! delete bitset.

use roaring::RoaringBitmap;

use super::types::DocNo;
use crate::pk::{EncodedKey, PK_WIDTH};

/// Primary key column and delete bitset of a segment
#[derive(Clone, Debug, Default)]
pub struct DocNoMap {
    /// Dense array: docno -> encoded primary key
    keys: Vec<EncodedKey>,
    /// Delete bitset: which docnos are deleted
    deleted: RoaringBitmap,
}

impl DocNoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document and return its docno
    pub fn add(&mut self, key: EncodedKey) -> DocNo {
        let docno = DocNo::new(self.keys.len() as u32);
        self.keys.push(key);
        docno
    }

    /// Raw primary key bytes stored for a docno
    pub fn key(&self, docno: DocNo) -> Option<&[u8]> {
        self.keys.get(docno.as_usize()).map(|k| k.as_slice())
    }

    /// Mark a docno as deleted; returns `false` if it was already deleted or
    /// does not exist
    pub fn delete(&mut self, docno: DocNo) -> bool {
        docno.as_usize() < self.keys.len() && self.deleted.insert(docno.as_u32())
    }

    pub fn is_deleted(&self, docno: DocNo) -> bool {
        self.deleted.contains(docno.as_u32())
    }

    /// Check if a docno is live (exists and not deleted)
    pub fn is_live(&self, docno: DocNo) -> bool {
        docno.as_usize() < self.keys.len() && !self.deleted.contains(docno.as_u32())
    }

    /// Number of documents (including deleted)
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of live documents (excluding deleted)
    pub fn live_count(&self) -> usize {
        self.keys.len() - self.deleted.len() as usize
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len() as usize
    }

    pub fn deleted_bitset(&self) -> &RoaringBitmap {
        &self.deleted
    }

    /// CRC32 over the key column
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for key in &self.keys {
            hasher.update(key);
        }
        hasher.finalize()
    }

    /// Byte size of the key column
    pub fn size_bytes(&self) -> usize {
        self.keys.len() * PK_WIDTH
    }
}
