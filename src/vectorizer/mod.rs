pub mod count;
pub mod hashing;
pub mod term;
pub mod tfidf;
pub mod tokenizer;
pub mod vocabulary;

use num::Num;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::math::matrix::{FeatureSpace, SparseMatrix};

use self::count::CountVectorizer;
use self::hashing::{HashingConfig, HashingVectorizer};
use self::tfidf::{TfidfConfig, TfidfVectorizer};
use self::tokenizer::{Tokenizer, TokenizerConfig};
use self::vocabulary::VocabularyLimits;

/// Something that learns a column space from training documents.
///
/// Fitting never mutates `self`; the learned state lives in `Self::Fitted`,
/// so the same unfitted vectorizer can be fitted on several document sets.
pub trait TextVectorizer {
    type Fitted: FittedVectorizer;

    /// Learn the column space from training documents only
    fn fit<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<Self::Fitted>;
}

/// A frozen column space.
///
/// `transform` is read-only: transforming the same documents twice gives
/// identical matrices, and terms never seen at fit time are dropped.
pub trait FittedVectorizer: Send + Sync {
    type Value: Num + Copy + Into<f64> + Send + Sync;

    /// Document-term matrix of `docs`, one row per document,
    /// stamped with `feature_space()`
    fn transform<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<SparseMatrix<Self::Value>>;

    fn feature_space(&self) -> FeatureSpace;

    /// Human-readable name of column `col`
    fn feature_name(&self, col: usize) -> Option<String>;
}

/// Settings shared by the three vectorization strategies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub tokenizer: TokenizerConfig,
    pub limits: VocabularyLimits,
    pub hashing: HashingConfig,
    pub tfidf: TfidfConfig,
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        Tokenizer::from_config(&self.tokenizer)?;
        Ok(())
    }

    pub fn count(&self) -> Result<CountVectorizer> {
        Ok(CountVectorizer::new(
            Tokenizer::from_config(&self.tokenizer)?,
            self.limits,
        ))
    }

    pub fn hashing(&self) -> Result<HashingVectorizer> {
        HashingVectorizer::new(Tokenizer::from_config(&self.tokenizer)?, &self.hashing)
    }

    pub fn tfidf(&self) -> Result<TfidfVectorizer> {
        Ok(TfidfVectorizer::new(self.count()?, self.tfidf.clone()))
    }
}
