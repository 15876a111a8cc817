//! Query and document text normalization.
//!
//! Terms are produced by the same tantivy analysis chain for queries and for
//! corpus documents, so both sides land in one vocabulary:
//!
//! ```text
//! strip quotes/periods/question marks → split word and punctuation runs → lowercase → English stem
//! ```

use tantivy::tokenizer::{
    Language, LowerCaser, RegexTokenizer, Stemmer, TextAnalyzer, TokenStream,
};

/// Word runs and punctuation runs become separate tokens; whitespace is dropped.
const TOKEN_PATTERN: &str = r"\w+|[^\w\s]+";

/// Characters removed before tokenization.
const STRIPPED_CHARS: [char; 4] = ['"', '\'', '.', '?'];

/// A normalized, stemmed token.
pub type Term = String;

/// Canonicalizes raw text into normalized terms.
///
/// Cloning is cheap; each call to [`TextNormalizer::normalize`] works on its own
/// copy of the analyzer so a shared normalizer can be used from many threads.
#[derive(Clone)]
pub struct TextNormalizer {
    analyzer: TextAnalyzer,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("pattern", &TOKEN_PATTERN)
            .finish()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        let tokenizer =
            RegexTokenizer::new(TOKEN_PATTERN).expect("token pattern is a valid regex");
        let analyzer = TextAnalyzer::builder(tokenizer)
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build();
        Self { analyzer }
    }

    /// Normalize `text` into an ordered sequence of terms.
    ///
    /// Pure and deterministic; empty or whitespace-only input yields no terms.
    pub fn normalize(&self, text: &str) -> Vec<Term> {
        let cleaned: String = text.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
        if cleaned.trim().is_empty() {
            return Vec::new();
        }

        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(&cleaned);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        terms
    }
}
