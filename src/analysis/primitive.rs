//! Token encoders for non-string leaf values

use crate::analysis::token::Token;

/// Single term every null value indexes as
pub const NULL_TERM: &[u8] = &[0x00];
pub const TRUE_TERM: &[u8] = &[0xff];
pub const FALSE_TERM: &[u8] = &[0x00];

/// Bit shifts of the numeric trie terms, finest first
pub const NUMERIC_SHIFTS: [u8; 4] = [0, 16, 32, 48];

/// Emits the null marker once
#[derive(Debug, Default)]
pub struct NullTokenStream {
    emitted: bool,
}

impl NullTokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.emitted {
            return None;
        }
        self.emitted = true;
        Some(Token::new(NULL_TERM, 0))
    }
}

/// Emits a fixed marker for `true` or `false` once
#[derive(Debug)]
pub struct BooleanTokenStream {
    value: bool,
    emitted: bool,
}

impl BooleanTokenStream {
    pub fn new(value: bool) -> Self {
        Self {
            value,
            emitted: false,
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.emitted {
            return None;
        }
        self.emitted = true;
        let term = if self.value { TRUE_TERM } else { FALSE_TERM };
        Some(Token::new(term, 0))
    }
}

/// Order-preserving mapping of an `f64` onto `u64`
///
/// Byte-wise comparison of the big-endian result matches numeric order,
/// with negative values sorting before positive ones.
pub fn sortable_bits(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits ^ (1 << 63)
    }
}

/// Emits the trie-encoded terms of a number
///
/// One term per entry of [`NUMERIC_SHIFTS`]: the shift byte followed by the
/// big-endian sortable value with the low `shift` bits cut off.
#[derive(Debug)]
pub struct NumericTokenStream {
    bits: u64,
    next: usize,
}

impl NumericTokenStream {
    pub fn new(value: f64) -> Self {
        Self {
            bits: sortable_bits(value),
            next: 0,
        }
    }

    /// Term for a given shift
    pub fn term(value: f64, shift: u8) -> Vec<u8> {
        encode_term(sortable_bits(value), shift)
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let shift = *NUMERIC_SHIFTS.get(self.next)?;
        self.next += 1;
        Some(Token::new(encode_term(self.bits, shift), 0))
    }
}

fn encode_term(bits: u64, shift: u8) -> Vec<u8> {
    let mut term = Vec::with_capacity(9);
    term.push(shift);
    term.extend_from_slice(&(bits >> shift).to_be_bytes());
    term
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_stream() {
        let mut stream = NullTokenStream::new();
        assert_eq!(stream.next_token().unwrap().term, NULL_TERM);
        assert!(stream.next_token().is_none());
    }

    #[test]
    fn test_boolean_stream() {
        let mut stream = BooleanTokenStream::new(true);
        assert_eq!(stream.next_token().unwrap().term, TRUE_TERM);
        assert!(stream.next_token().is_none());

        let mut stream = BooleanTokenStream::new(false);
        assert_eq!(stream.next_token().unwrap().term, FALSE_TERM);
    }

    #[test]
    fn test_numeric_stream_terms() {
        let mut stream = NumericTokenStream::new(42.0);
        let terms: Vec<Vec<u8>> = std::iter::from_fn(|| stream.next_token())
            .map(|t| t.term)
            .collect();
        assert_eq!(terms.len(), NUMERIC_SHIFTS.len());
        for (term, shift) in terms.iter().zip(NUMERIC_SHIFTS) {
            assert_eq!(term[0], shift);
            assert_eq!(term.len(), 9);
        }
        assert_eq!(terms[0], NumericTokenStream::term(42.0, 0));
    }

    #[test]
    fn test_sortable_bits_order() {
        let values = [f64::NEG_INFINITY, -1e10, -1.5, -0.0, 0.0, 1.0, 2.5, 1e300, f64::INFINITY];
        for pair in values.windows(2) {
            assert!(sortable_bits(pair[0]) <= sortable_bits(pair[1]));
        }
    }
}
