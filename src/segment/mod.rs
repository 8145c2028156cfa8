//! In-memory segment store
//!
//! # Architecture
//!
//! - `MutableBuffer`: in-memory buffer for uncommitted documents
//! - `SegmentReader`: immutable segment with postings, primary key column and deletes
//! - `IndexSnapshot`: ordered set of segments published by one commit
//! - `IndexWriter`: queues inserts and removals, publishes snapshots

mod buffer;
mod docno_map;
mod reader;
mod snapshot;
mod types;
mod writer;

pub use buffer::*;
pub use docno_map::*;
pub use reader::*;
pub use snapshot::*;
pub use types::*;
pub use writer::*;
