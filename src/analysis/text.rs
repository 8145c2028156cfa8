use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashSet, VecDeque};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::config::TokenizerConfig;

/// Map a catalog language name to its stemming algorithm and stopword list
fn language(name: &str) -> Option<(Algorithm, LANGUAGE)> {
    let pair = match name.to_lowercase().as_str() {
        "english" | "en" => (Algorithm::English, LANGUAGE::English),
        "german" | "de" => (Algorithm::German, LANGUAGE::German),
        "french" | "fr" => (Algorithm::French, LANGUAGE::French),
        "spanish" | "es" => (Algorithm::Spanish, LANGUAGE::Spanish),
        "italian" | "it" => (Algorithm::Italian, LANGUAGE::Italian),
        "portuguese" | "pt" => (Algorithm::Portuguese, LANGUAGE::Portuguese),
        "dutch" | "nl" => (Algorithm::Dutch, LANGUAGE::Dutch),
        "swedish" | "sv" => (Algorithm::Swedish, LANGUAGE::Swedish),
        "russian" | "ru" => (Algorithm::Russian, LANGUAGE::Russian),
        _ => return None,
    };
    Some(pair)
}

/// Word-segmenting analyzer with stemming and stopword removal
///
/// Words are split on Unicode word boundaries. Positions count every word,
/// so a removed stopword still leaves a gap.
pub struct TextAnalyzer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
    pending: VecDeque<(String, u32)>,
}

impl TextAnalyzer {
    /// Create an analyzer, failing for an unsupported language
    pub fn new(config: &TokenizerConfig) -> Result<Self, String> {
        let (algorithm, stopword_language) = language(&config.language)
            .ok_or_else(|| format!("unsupported language '{}'", config.language))?;

        if config.min_token_length > config.max_token_length {
            return Err(format!(
                "min_token_length {} exceeds max_token_length {}",
                config.min_token_length, config.max_token_length
            ));
        }

        let stemmer = if config.stem {
            Some(Stemmer::create(algorithm))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(stopword_language)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Ok(Self {
            config: config.clone(),
            stemmer,
            stopwords,
            pending: VecDeque::new(),
        })
    }

    /// Build from JSON properties; empty properties select the defaults
    pub fn from_properties(properties: &str) -> Result<Self, String> {
        let config = if properties.trim().is_empty() {
            TokenizerConfig::default()
        } else {
            serde_json::from_str(properties).map_err(|e| e.to_string())?
        };
        Self::new(&config)
    }

    /// Tokenize text into (term, position) pairs in order
    pub fn tokenize(&self, text: &str) -> Vec<(String, u32)> {
        let mut results = Vec::new();
        let mut pos = 0u32;

        for word in text.unicode_words() {
            let mut token = word.to_string();

            if self.config.lowercase {
                token = token.to_lowercase();
            }

            if token.len() < self.config.min_token_length
                || token.len() > self.config.max_token_length
                || self.stopwords.contains(&token)
            {
                pos += 1;
                continue;
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token).to_string();
            }

            results.push((token, pos));
            pos += 1;
        }

        results
    }
}

impl TokenStream for TextAnalyzer {
    fn reset(&mut self, value: &str) -> bool {
        self.pending = self.tokenize(value).into();
        true
    }

    fn next_token(&mut self) -> Option<Token> {
        self.pending
            .pop_front()
            .map(|(term, position)| Token::new(term, position))
    }
}
