use std::fmt;

use crate::analysis::{
    BooleanTokenStream, Features, NullTokenStream, NumericTokenStream, PooledTokenStream, Token,
    TokenStream,
};
use crate::document::mangle::ValueKind;
use crate::link::ValueStorage;

/// Token source of a field, one variant per leaf kind
pub enum FieldTokens {
    Analyzer(PooledTokenStream),
    Null(NullTokenStream),
    Boolean(BooleanTokenStream),
    Numeric(NumericTokenStream),
}

impl FieldTokens {
    pub fn next_token(&mut self) -> Option<Token> {
        match self {
            FieldTokens::Analyzer(stream) => stream.next_token(),
            FieldTokens::Null(stream) => stream.next_token(),
            FieldTokens::Boolean(stream) => stream.next_token(),
            FieldTokens::Numeric(stream) => stream.next_token(),
        }
    }
}

impl fmt::Debug for FieldTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTokens::Analyzer(stream) => f.debug_tuple("Analyzer").field(stream).finish(),
            FieldTokens::Null(_) => f.write_str("Null"),
            FieldTokens::Boolean(_) => f.write_str("Boolean"),
            FieldTokens::Numeric(_) => f.write_str("Numeric"),
        }
    }
}

/// One indexable unit produced by a [`FieldIterator`](crate::document::FieldIterator)
#[derive(Debug)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    pub(crate) tokens: FieldTokens,
    pub(crate) features: Features,
    pub(crate) boost: f32,
    pub(crate) store_values: ValueStorage,
}

impl Field {
    /// Mangled field name (path, kind and analyzer)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Analyzer that produced a string field; `None` for other kinds
    pub fn analyzer(&self) -> Option<&str> {
        match &self.tokens {
            FieldTokens::Analyzer(stream) => Some(stream.pool().name()),
            _ => None,
        }
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    pub fn store_values(&self) -> ValueStorage {
        self.store_values
    }

    pub fn tokens(&mut self) -> &mut FieldTokens {
        &mut self.tokens
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.tokens.next_token()
    }

    /// Drain the remaining tokens
    pub fn drain_tokens(&mut self) -> Vec<Token> {
        std::iter::from_fn(|| self.tokens.next_token()).collect()
    }
}
