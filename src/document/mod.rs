//! Flattening of documents into named, tokenized fields

pub mod field;
pub mod iterator;
pub mod mangle;

pub use field::{Field, FieldTokens};
pub use iterator::{FieldIterator, IteratorState};
pub use mangle::ValueKind;
