pub mod analysis;
pub mod config;
pub mod document;
pub mod error;
pub mod link;
pub mod metrics;
pub mod pk;
pub mod segment;

pub use analysis::{AnalyzerPool, AnalyzerRegistry, AnalyzerResolver, Features, Token, TokenStream};
pub use config::{AnalyzerPoolConfig, TokenizerConfig, WriterConfig};
pub use document::{Field, FieldIterator, ValueKind};
pub use error::{DoclinkError, Result};
pub use link::{LinkConfig, LinkMeta, ValueStorage};
pub use metrics::IndexMetrics;
pub use pk::{PrimaryKey, PrimaryKeyFilter, PrimaryKeyFilterContainer, RecoveryFlag, RecoveryMode};
pub use segment::{IndexSnapshot, IndexWriter, SegmentReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
