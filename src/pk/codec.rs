use std::fmt;

use crate::error::CorruptKeyError;

/// Field and column name holding the primary key of every document
pub const PK_COLUMN: &str = "@_PK";

/// Encoded key width in bytes
pub const PK_WIDTH: usize = 8;

pub type EncodedKey = [u8; PK_WIDTH];

/// Encode a key as fixed-width little-endian bytes
pub fn encode(id: u64) -> EncodedKey {
    id.to_le_bytes()
}

/// Decode key bytes, rejecting any length other than [`PK_WIDTH`]
pub fn decode(bytes: &[u8]) -> Result<u64, CorruptKeyError> {
    let bytes: EncodedKey = bytes.try_into().map_err(|_| CorruptKeyError {
        expected: PK_WIDTH,
        actual: bytes.len(),
    })?;
    Ok(u64::from_le_bytes(bytes))
}

/// Internal document identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey(pub u64);

impl PrimaryKey {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }

    pub fn encode(self) -> EncodedKey {
        encode(self.0)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CorruptKeyError> {
        decode(bytes).map(Self)
    }
}

impl From<u64> for PrimaryKey {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
