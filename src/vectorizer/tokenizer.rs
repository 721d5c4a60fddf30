use std::hash::Hasher;
use std::sync::Arc;

use ahash::AHashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};
use twox_hash::XxHash64;

use crate::collocation::PhraseSet;
use crate::error::{Error, Result};

/// Default token pattern: words of two or more word characters
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Which stopword list to filter with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopWords {
    #[default]
    None,
    /// bundled English list from the `stop-words` crate
    English,
    Custom(Vec<String>),
}

impl StopWords {
    fn resolve(&self) -> Option<AHashSet<String>> {
        match self {
            StopWords::None => None,
            StopWords::English => {
                let words: Vec<String> = get(LANGUAGE::English).iter().map(|w| w.to_string()).collect();
                Some(words.into_iter().map(|w| w.to_lowercase()).collect())
            }
            StopWords::Custom(words) => Some(words.iter().map(|w| w.to_lowercase()).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub token_pattern: String,
    pub stop_words: StopWords,
    /// inclusive (min_n, max_n)
    pub ngram_range: (usize, usize),
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            stop_words: StopWords::None,
            ngram_range: (1, 1),
        }
    }
}

/// Tokenizer
/// Turns raw text into terms:
/// lower-case → regex word extraction → collocation merge → stopword
/// removal → n-gram expansion.
///
/// Cheap to clone; stopwords and phrases are shared.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
    lowercase: bool,
    stop_words: Option<Arc<AHashSet<String>>>,
    ngram_range: (usize, usize),
    phrases: Option<Arc<PhraseSet>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TOKEN_PATTERN).expect("default token pattern is valid"),
            lowercase: true,
            stop_words: None,
            ngram_range: (1, 1),
            phrases: None,
        }
    }
}

impl Tokenizer {
    pub fn from_config(config: &TokenizerConfig) -> Result<Self> {
        let pattern = Regex::new(&config.token_pattern)
            .map_err(|e| Error::InvalidConfig(format!("token pattern: {e}")))?;
        let tokenizer = Self {
            pattern,
            lowercase: config.lowercase,
            stop_words: config.stop_words.resolve().map(Arc::new),
            ngram_range: (1, 1),
            phrases: None,
        };
        tokenizer.with_ngram_range(config.ngram_range.0, config.ngram_range.1)
    }

    /// Set the inclusive n-gram range
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Result<Self> {
        if min_n == 0 || max_n < min_n {
            return Err(Error::InvalidConfig(format!(
                "ngram range ({min_n}, {max_n}) must satisfy 1 <= min <= max"
            )));
        }
        self.ngram_range = (min_n, max_n);
        Ok(self)
    }

    pub fn with_stop_words(mut self, stop_words: &StopWords) -> Self {
        self.stop_words = stop_words.resolve().map(Arc::new);
        self
    }

    /// Merge adjacent words found in `phrases` into compound tokens
    pub fn with_phrases(mut self, phrases: PhraseSet) -> Self {
        self.phrases = Some(Arc::new(phrases));
        self
    }

    #[inline]
    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    /// Words of `text`, before n-gram expansion
    ///
    /// # Arguments
    /// * `text` - raw document text
    ///
    /// # Returns
    /// * `Vec<String>` - words in document order
    pub fn words(&self, text: &str) -> Vec<String> {
        let lowered;
        let text = if self.lowercase {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };
        let mut words: Vec<String> = self
            .pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        if let Some(phrases) = &self.phrases {
            words = phrases.merge(words);
        }
        if let Some(stop_words) = &self.stop_words {
            words.retain(|w| !stop_words.contains(w.as_str()));
        }
        words
    }

    /// Terms of `text`: every n-gram in the configured range,
    /// n-grams joined by a single space
    pub fn terms(&self, text: &str) -> Vec<String> {
        let words = self.words(text);
        let (min_n, max_n) = self.ngram_range;
        if min_n == 1 && max_n == 1 {
            return words;
        }
        let mut terms = Vec::with_capacity(words.len() * (max_n - min_n + 1));
        for n in min_n..=max_n {
            if n == 1 {
                terms.extend(words.iter().cloned());
                continue;
            }
            terms.extend(words.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Feed everything that changes the term stream into `hasher`
    pub(crate) fn fingerprint(&self, hasher: &mut XxHash64) {
        hasher.write(self.pattern.as_str().as_bytes());
        hasher.write_u8(self.lowercase as u8);
        hasher.write_usize(self.ngram_range.0);
        hasher.write_usize(self.ngram_range.1);
        if let Some(stop_words) = &self.stop_words {
            let mut sorted: Vec<&String> = stop_words.iter().collect();
            sorted.sort();
            for w in sorted {
                hasher.write(w.as_bytes());
                hasher.write_u8(0);
            }
        }
        if let Some(phrases) = &self.phrases {
            phrases.fingerprint(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_single_characters() {
        let tok = Tokenizer::default();
        assert_eq!(
            tok.words("It is a Truth, universally acknowledged!"),
            vec!["it", "is", "truth", "universally", "acknowledged"]
        );
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let tok = Tokenizer::default().with_ngram_range(1, 2).unwrap();
        assert_eq!(
            tok.terms("the old man"),
            vec!["the", "old", "man", "the old", "old man"]
        );
    }

    #[test]
    fn stop_words_are_removed_before_ngrams() {
        let tok = Tokenizer::default()
            .with_stop_words(&StopWords::Custom(vec!["The".into()]))
            .with_ngram_range(2, 2)
            .unwrap();
        assert_eq!(tok.terms("the old the man"), vec!["old man"]);
    }

    #[test]
    fn english_list_filters_common_words() {
        let tok = Tokenizer::default().with_stop_words(&StopWords::English);
        let words = tok.words("the monster and the creator");
        assert!(!words.contains(&"the".to_string()));
        assert!(words.contains(&"monster".to_string()));
    }

    #[test]
    fn invalid_ngram_range_is_rejected() {
        assert!(Tokenizer::default().with_ngram_range(0, 1).is_err());
        assert!(Tokenizer::default().with_ngram_range(3, 2).is_err());
        let bad = TokenizerConfig {
            token_pattern: "(".into(),
            ..Default::default()
        };
        assert!(Tokenizer::from_config(&bad).is_err());
    }
}
