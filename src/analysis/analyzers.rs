//! Built-in analyzer types and the type registry

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::analysis::text::TextAnalyzer;
use crate::analysis::token::{Features, Token, TokenStream};

/// Constructs a fresh token stream from canonical analyzer properties
pub type AnalyzerFactory =
    Arc<dyn Fn(&str) -> Result<Box<dyn TokenStream>, String> + Send + Sync>;

pub const IDENTITY_TYPE: &str = "identity";
pub const DELIMITER_TYPE: &str = "delimiter";
pub const TEXT_TYPE: &str = "text";

/// Emits the whole value as a single token
#[derive(Debug, Default)]
pub struct IdentityAnalyzer {
    value: Option<String>,
}

impl TokenStream for IdentityAnalyzer {
    fn reset(&mut self, value: &str) -> bool {
        self.value = Some(value.to_string());
        true
    }

    fn next_token(&mut self) -> Option<Token> {
        self.value.take().map(|value| Token::new(value, 0))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DelimiterProperties {
    delimiter: String,
}

/// Splits the value on a fixed delimiter
#[derive(Debug)]
pub struct DelimiterAnalyzer {
    delimiter: String,
    parts: Vec<String>,
    next: usize,
}

impl DelimiterAnalyzer {
    pub fn new(delimiter: impl Into<String>) -> Result<Self, String> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err("delimiter must not be empty".to_string());
        }
        Ok(Self {
            delimiter,
            parts: Vec::new(),
            next: 0,
        })
    }

    /// Accepts `{"delimiter": ","}`
    pub fn from_properties(properties: &str) -> Result<Self, String> {
        let props: DelimiterProperties =
            serde_json::from_str(properties).map_err(|e| e.to_string())?;
        Self::new(props.delimiter)
    }
}

impl TokenStream for DelimiterAnalyzer {
    fn reset(&mut self, value: &str) -> bool {
        self.parts = value
            .split(self.delimiter.as_str())
            .map(str::to_string)
            .collect();
        self.next = 0;
        true
    }

    fn next_token(&mut self) -> Option<Token> {
        let part = self.parts.get(self.next)?;
        let token = Token::new(part.clone(), self.next as u32);
        self.next += 1;
        Some(token)
    }
}

/// A registered analyzer type
#[derive(Clone)]
pub struct AnalyzerType {
    pub features: Features,
    pub factory: AnalyzerFactory,
}

impl fmt::Debug for AnalyzerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerType")
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

/// Analyzer types known to a resolver, keyed by type name
#[derive(Clone, Debug, Default)]
pub struct AnalyzerRegistry {
    types: HashMap<String, AnalyzerType>,
}

impl AnalyzerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `identity`, `delimiter` and `text` types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            IDENTITY_TYPE,
            Features::FREQUENCY | Features::NORM,
            |_: &str| Ok(Box::new(IdentityAnalyzer::default()) as Box<dyn TokenStream>),
        );
        registry.register(
            DELIMITER_TYPE,
            Features::FREQUENCY | Features::POSITION,
            |props: &str| {
                DelimiterAnalyzer::from_properties(props)
                    .map(|a| Box::new(a) as Box<dyn TokenStream>)
            },
        );
        registry.register(
            TEXT_TYPE,
            Features::FREQUENCY | Features::POSITION,
            |props: &str| {
                TextAnalyzer::from_properties(props).map(|a| Box::new(a) as Box<dyn TokenStream>)
            },
        );
        registry
    }

    /// Register (or replace) an analyzer type
    pub fn register<F>(&mut self, kind: impl Into<String>, features: Features, factory: F)
    where
        F: Fn(&str) -> Result<Box<dyn TokenStream>, String> + Send + Sync + 'static,
    {
        self.types.insert(
            kind.into(),
            AnalyzerType {
                features,
                factory: Arc::new(factory),
            },
        );
    }

    pub fn get(&self, kind: &str) -> Option<&AnalyzerType> {
        self.types.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.types.contains_key(kind)
    }
}
