//! Token stream abstraction shared by analyzers and primitive value encoders

use std::fmt;
use std::ops::BitOr;

/// A single indexable token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Raw term bytes (UTF-8 for text analyzers, binary for numeric/boolean encodings)
    pub term: Vec<u8>,
    /// Token position within the value
    pub position: u32,
}

impl Token {
    pub fn new(term: impl Into<Vec<u8>>, position: u32) -> Self {
        Self {
            term: term.into(),
            position,
        }
    }

    /// Term as UTF-8, if it is valid text
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.term).ok()
    }
}

/// Analyzer instance producing tokens from one string value at a time
pub trait TokenStream: Send {
    /// Bind the stream to a new input value, discarding unread tokens.
    ///
    /// Returns `false` if the value cannot be tokenized by this analyzer.
    fn reset(&mut self, value: &str) -> bool;

    /// Next token for the current value
    fn next_token(&mut self) -> Option<Token>;
}

/// Index features a token stream supports
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Features(u8);

impl Features {
    pub const EMPTY: Features = Features(0);
    pub const FREQUENCY: Features = Features(1);
    pub const POSITION: Features = Features(1 << 1);
    pub const OFFSET: Features = Features(1 << 2);
    pub const NORM: Features = Features(1 << 3);

    const NAMED: [(Features, &'static str); 4] = [
        (Features::FREQUENCY, "frequency"),
        (Features::POSITION, "position"),
        (Features::OFFSET, "offset"),
        (Features::NORM, "norm"),
    ];

    pub const fn union(self, other: Features) -> Features {
        Features(self.0 | other.0)
    }

    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Catalog names of the contained features
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(feature, _)| self.contains(*feature))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        self.union(rhs)
    }
}

impl fmt::Debug for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
