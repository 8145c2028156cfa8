pub mod analyzers;
pub mod pool;
pub mod primitive;
pub mod text;
pub mod token;

pub use analyzers::{AnalyzerRegistry, AnalyzerType, DelimiterAnalyzer, IdentityAnalyzer};
pub use pool::{AnalyzerPool, AnalyzerResolver, PooledTokenStream, IDENTITY_ANALYZER};
pub use primitive::{BooleanTokenStream, NullTokenStream, NumericTokenStream};
pub use text::TextAnalyzer;
pub use token::{Features, Token, TokenStream};
