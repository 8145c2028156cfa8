use serde::{Deserialize, Serialize};

/// Text analyzer configuration
///
/// Passed as the JSON `properties` of a `text` analyzer definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub language: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 2,
            max_token_length: 50,
            language: "english".to_string(),
        }
    }
}

/// Analyzer pool configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzerPoolConfig {
    /// Idle token stream instances kept per analyzer
    pub max_pooled_instances: usize,
}

impl Default for AnalyzerPoolConfig {
    fn default() -> Self {
        Self {
            max_pooled_instances: 64,
        }
    }
}

impl AnalyzerPoolConfig {
    pub fn with_max_pooled_instances(mut self, max: usize) -> Self {
        self.max_pooled_instances = max;
        self
    }
}

/// Index writer configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Flush buffered documents into a segment once this many are pending (0 = only on commit)
    pub max_segment_docs: usize,
}

impl WriterConfig {
    pub fn with_max_segment_docs(mut self, max: usize) -> Self {
        self.max_segment_docs = max;
        self
    }
}
