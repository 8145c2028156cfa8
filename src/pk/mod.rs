//! Primary keys: fixed-width encoding and removal filters

pub mod codec;
pub mod filter;
pub mod recovery;

pub use codec::{decode, encode, EncodedKey, PrimaryKey, PK_COLUMN, PK_WIDTH};
pub use filter::{FilterState, PreparedFilter, PrimaryKeyFilter, PrimaryKeyFilterContainer};
pub use recovery::{RecoveryFlag, RecoveryMode};
