//! Text analysis for the in-memory index.
//!
//! The reference index needs exactly one analyzer: Unicode word segmentation
//! (UAX #29) followed by lowercasing. Custom analyzers plug in through the
//! [`Analyzer`] trait.
//!
//! # Examples
//!
//! ```
//! use relata::index::analyzer::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new();
//! let tokens = analyzer.analyze("Hello, World! café");
//!
//! assert_eq!(tokens, vec!["hello", "world", "café"]);
//! ```

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

/// Trait for analyzers that convert text into index terms.
pub trait Analyzer: Send + Sync + fmt::Debug {
    /// Split text into terms, in text order. Repeated terms are kept.
    fn analyze(&self, text: &str) -> Vec<String>;

    /// Get the name of this analyzer.
    fn name(&self) -> &'static str;
}

/// Unicode word tokenizer with a lowercase filter.
///
/// Punctuation and whitespace segments are dropped by the segmenter.
#[derive(Clone, Debug, Default)]
pub struct StandardAnalyzer {
    /// Tokens longer than this many chars are skipped (0 = unlimited).
    max_token_len: usize,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        Self { max_token_len: 255 }
    }

    /// Set the maximum token length.
    pub fn with_max_token_len(mut self, max_token_len: usize) -> Self {
        self.max_token_len = max_token_len;
        self
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter(|word| self.max_token_len == 0 || word.chars().count() <= self.max_token_len)
            .map(|word| {
                if word.is_ascii() {
                    word.to_ascii_lowercase()
                } else {
                    word.to_lowercase()
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}
