use std::hash::Hasher;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{Error, Result};
use crate::utils::math::matrix::FeatureSpace;
use crate::vectorizer::term::TermFrequency;

/// Document-frequency bound, either an absolute document count
/// or a fraction of the training documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocFrequency {
    Count(u64),
    Fraction(f64),
}

impl DocFrequency {
    /// Resolve to an absolute document count for `n_docs` documents
    fn resolve(&self, n_docs: usize) -> f64 {
        match *self {
            DocFrequency::Count(c) => c as f64,
            DocFrequency::Fraction(f) => f * n_docs as f64,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match *self {
            DocFrequency::Fraction(f) if !(0.0..=1.0).contains(&f) => Err(Error::InvalidConfig(
                format!("{name} fraction {f} must lie in [0, 1]"),
            )),
            _ => Ok(()),
        }
    }
}

/// One vocabulary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    /// column index
    pub id: u32,
    /// raw occurrences over the training documents
    pub frequency: u64,
    /// number of training documents containing the term
    pub doc_frequency: u64,
}

/// Limits applied while building a vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyLimits {
    pub min_df: DocFrequency,
    pub max_df: DocFrequency,
    pub max_features: Option<usize>,
}

impl Default for VocabularyLimits {
    fn default() -> Self {
        Self {
            min_df: DocFrequency::Count(1),
            max_df: DocFrequency::Fraction(1.0),
            max_features: None,
        }
    }
}

impl VocabularyLimits {
    pub fn validate(&self) -> Result<()> {
        self.min_df.validate("min_df")?;
        self.max_df.validate("max_df")?;
        if self.max_features == Some(0) {
            return Err(Error::InvalidConfig("max_features must be positive".into()));
        }
        Ok(())
    }
}

/// Vocabulary
/// Term → column mapping built once from training documents.
/// Terms are stored in lexical order, so column `i` is the `i`-th term.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: IndexMap<Box<str>, TermEntry>,
    space: FeatureSpace,
}

impl Vocabulary {
    /// Build from per-document term counts
    ///
    /// # Arguments
    /// * `docs` - one `TermFrequency` per training document
    /// * `limits` - document-frequency and size limits
    /// * `salt` - extra bytes mixed into the feature-space fingerprint
    ///
    /// # Returns
    /// * `Vocabulary` - fails when no term survives the limits
    pub fn build(docs: &[TermFrequency], limits: &VocabularyLimits, salt: u64) -> Result<Self> {
        limits.validate()?;
        let n_docs = docs.len();
        let mut totals = TermFrequency::new();
        let mut doc_freq = TermFrequency::new();
        for doc in docs {
            totals.add_terms_from_freq(doc);
            for (term, _) in doc.iter() {
                doc_freq.add_term(term);
            }
        }

        let min_df = limits.min_df.resolve(n_docs);
        let max_df = limits.max_df.resolve(n_docs);
        let mut kept: Vec<(&str, u64, u64)> = totals
            .iter()
            .map(|(term, freq)| (term, freq, doc_freq.term_count(term)))
            .filter(|&(_, _, df)| df as f64 >= min_df && df as f64 <= max_df)
            .collect();

        if let Some(max_features) = limits.max_features {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(max_features);
        }
        kept.sort_by(|a, b| a.0.cmp(b.0));

        if kept.is_empty() {
            return Err(Error::InvalidConfig(
                "empty vocabulary; no term survives min_df/max_df".into(),
            ));
        }

        let mut hasher = XxHash64::with_seed(salt);
        let mut terms = IndexMap::with_capacity(kept.len());
        for (id, (term, frequency, doc_frequency)) in kept.into_iter().enumerate() {
            hasher.write(term.as_bytes());
            hasher.write_u8(0);
            terms.insert(
                Box::from(term),
                TermEntry {
                    id: id as u32,
                    frequency,
                    doc_frequency,
                },
            );
        }
        let space = FeatureSpace::new(hasher.finish(), terms.len());
        Ok(Self { terms, space })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn space(&self) -> FeatureSpace {
        self.space
    }

    #[inline]
    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    #[inline]
    pub fn id(&self, term: &str) -> Option<u32> {
        self.terms.get(term).map(|e| e.id)
    }

    /// Term stored in column `id`
    #[inline]
    pub fn term(&self, id: usize) -> Option<&str> {
        self.terms.get_index(id).map(|(t, _)| t.as_ref())
    }

    /// All terms in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(t, e)| (t.as_ref(), e))
    }

    /// The `n` most frequent terms, frequency descending then term ascending
    pub fn most_frequent(&self, n: usize) -> Vec<(&str, u64)> {
        let mut all: Vec<(&str, u64)> = self.iter().map(|(t, e)| (t, e.frequency)).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        all.truncate(n);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<TermFrequency> {
        vec![
            TermFrequency::from(&["whale", "sea", "sea"][..]),
            TermFrequency::from(&["sea", "ship"][..]),
            TermFrequency::from(&["captain", "sea"][..]),
        ]
    }

    #[test]
    fn terms_are_sorted_and_counted() {
        let vocab = Vocabulary::build(&docs(), &VocabularyLimits::default(), 0).unwrap();
        let terms: Vec<&str> = vocab.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["captain", "sea", "ship", "whale"]);
        let sea = vocab.get("sea").unwrap();
        assert_eq!(sea.id, 1);
        assert_eq!(sea.frequency, 4);
        assert_eq!(sea.doc_frequency, 3);
        assert_eq!(vocab.term(3), Some("whale"));
        assert_eq!(vocab.space().dim, 4);
    }

    #[test]
    fn document_frequency_limits() {
        let limits = VocabularyLimits {
            min_df: DocFrequency::Count(2),
            ..Default::default()
        };
        let vocab = Vocabulary::build(&docs(), &limits, 0).unwrap();
        assert_eq!(vocab.len(), 1);
        assert!(vocab.get("sea").is_some());

        let limits = VocabularyLimits {
            max_df: DocFrequency::Fraction(0.5),
            ..Default::default()
        };
        let vocab = Vocabulary::build(&docs(), &limits, 0).unwrap();
        assert!(vocab.get("sea").is_none());
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn max_features_keeps_most_frequent() {
        let limits = VocabularyLimits {
            max_features: Some(2),
            ..Default::default()
        };
        let vocab = Vocabulary::build(&docs(), &limits, 0).unwrap();
        let terms: Vec<&str> = vocab.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["captain", "sea"]);
    }

    #[test]
    fn empty_vocabulary_is_an_error() {
        let limits = VocabularyLimits {
            min_df: DocFrequency::Count(10),
            ..Default::default()
        };
        assert!(Vocabulary::build(&docs(), &limits, 0).is_err());
    }

    #[test]
    fn fingerprint_depends_on_terms_and_salt() {
        let a = Vocabulary::build(&docs(), &VocabularyLimits::default(), 0).unwrap();
        let b = Vocabulary::build(&docs()[..2], &VocabularyLimits::default(), 0).unwrap();
        let c = Vocabulary::build(&docs(), &VocabularyLimits::default(), 1).unwrap();
        assert_ne!(a.space().id, b.space().id);
        assert_ne!(a.space().id, c.space().id);
        assert_eq!(a.space(), Vocabulary::build(&docs(), &VocabularyLimits::default(), 0).unwrap().space());
    }
}
