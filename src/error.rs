use thiserror::Error;

/// Link configuration could not be parsed or validated.
///
/// `path` names the offending key in catalog notation, e.g. `fields.a.analyzers[1]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid link configuration at '{path}': {reason}")]
pub struct ConfigError {
    pub path: String,
    pub reason: String,
}

impl ConfigError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the error path with the enclosing key
    pub fn nested(self, parent: &str) -> Self {
        let path = if self.path.is_empty() {
            parent.to_string()
        } else if self.path.starts_with('[') {
            format!("{}{}", parent, self.path)
        } else {
            format!("{}.{}", parent, self.path)
        };
        Self {
            path,
            reason: self.reason,
        }
    }
}

/// An analyzer factory could not produce a token stream instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to create analyzer '{name}' of type '{kind}': {reason}")]
pub struct AnalyzerCreationError {
    pub name: String,
    pub kind: String,
    pub reason: String,
}

/// Stored primary key bytes do not have the fixed key width
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Corrupt primary key: expected {expected} bytes, got {actual}")]
pub struct CorruptKeyError {
    pub expected: usize,
    pub actual: usize,
}

/// Main error type for doclink operations
#[derive(Error, Debug)]
pub enum DoclinkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    AnalyzerCreation(#[from] AnalyzerCreationError),

    #[error(transparent)]
    CorruptKey(#[from] CorruptKeyError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Index error: {0}")]
    IndexError(String),
}

/// Result type alias for doclink operations
pub type Result<T> = std::result::Result<T, DoclinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CorruptKeyError {
            expected: 8,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Corrupt primary key: expected 8 bytes, got 3");

        let err = ConfigError::new("analyzers[0]", "unknown analyzer 'nope'");
        assert_eq!(
            err.to_string(),
            "Invalid link configuration at 'analyzers[0]': unknown analyzer 'nope'"
        );
    }

    #[test]
    fn test_nested_config_path() {
        let err = ConfigError::new("analyzers[1]", "bad").nested("a").nested("fields");
        assert_eq!(err.path, "fields.a.analyzers[1]");

        let err = ConfigError::new("", "bad").nested("includeAllFields");
        assert_eq!(err.path, "includeAllFields");

        let err = ConfigError::new("[2]", "bad").nested("analyzers");
        assert_eq!(err.path, "analyzers[2]");
    }
}
