use std::hash::Hasher;

use rayon::prelude::*;
use twox_hash::XxHash64;

use crate::error::Result;
use crate::utils::math::matrix::{FeatureSpace, SparseMatrix};
use crate::utils::math::vector::SparseVec;
use crate::vectorizer::term::TermFrequency;
use crate::vectorizer::tokenizer::Tokenizer;
use crate::vectorizer::vocabulary::{Vocabulary, VocabularyLimits};
use crate::vectorizer::{FittedVectorizer, TextVectorizer};

const COUNT_SALT: u64 = 0xC0;

/// Raw term counts against a vocabulary learned from the training documents.
#[derive(Debug, Clone, Default)]
pub struct CountVectorizer {
    tokenizer: Tokenizer,
    limits: VocabularyLimits,
}

impl CountVectorizer {
    pub fn new(tokenizer: Tokenizer, limits: VocabularyLimits) -> Self {
        Self { tokenizer, limits }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

impl TextVectorizer for CountVectorizer {
    type Fitted = FittedCountVectorizer;

    fn fit<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<FittedCountVectorizer> {
        let freqs: Vec<TermFrequency> = docs
            .par_iter()
            .map(|doc| TermFrequency::from(&self.tokenizer.terms(doc.as_ref())[..]))
            .collect();
        let mut salt = XxHash64::with_seed(COUNT_SALT);
        self.tokenizer.fingerprint(&mut salt);
        let vocabulary = Vocabulary::build(&freqs, &self.limits, salt.finish())?;
        tracing::debug!(docs = docs.len(), terms = vocabulary.len(), "count vocabulary built");
        Ok(FittedCountVectorizer {
            tokenizer: self.tokenizer.clone(),
            vocabulary,
        })
    }
}

/// Count vectorizer with a frozen vocabulary.
/// Transforming never touches the vocabulary; unseen terms are dropped.
#[derive(Debug, Clone)]
pub struct FittedCountVectorizer {
    tokenizer: Tokenizer,
    vocabulary: Vocabulary,
}

impl FittedCountVectorizer {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Count row of one document
    fn row(&self, text: &str) -> SparseVec<u32> {
        let terms = self.tokenizer.terms(text);
        let mut pairs: Vec<(u32, u32)> = Vec::with_capacity(terms.len());
        for (term, count) in TermFrequency::from(&terms[..]).iter() {
            if let Some(id) = self.vocabulary.id(term) {
                pairs.push((id, count as u32));
            }
        }
        pairs.sort_unstable_by_key(|&(id, _)| id);
        let (indices, values) = pairs.into_iter().unzip();
        SparseVec::from_sorted_parts(self.vocabulary.len(), indices, values)
    }
}

impl FittedVectorizer for FittedCountVectorizer {
    type Value = u32;

    fn transform<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<SparseMatrix<u32>> {
        let rows = docs.par_iter().map(|doc| self.row(doc.as_ref())).collect();
        SparseMatrix::from_rows(rows, self.vocabulary.space())
    }

    fn feature_space(&self) -> FeatureSpace {
        self.vocabulary.space()
    }

    fn feature_name(&self, col: usize) -> Option<String> {
        self.vocabulary.term(col).map(str::to_string)
    }
}
