use std::hash::Hasher;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{Error, Result};
use crate::utils::math::matrix::{FeatureSpace, SparseMatrix};
use crate::utils::math::vector::SparseVec;
use crate::utils::sort::sort_coalesce_u32_soa;
use crate::vectorizer::tfidf::Norm;
use crate::vectorizer::tokenizer::Tokenizer;
use crate::vectorizer::{FittedVectorizer, TextVectorizer};

const HASHING_SALT: u64 = 0x4A5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// number of hash buckets (columns)
    pub n_features: usize,
    /// inclusive n-gram range, overrides the tokenizer's
    pub ngram_range: (usize, usize),
    /// flip the sign of terms whose hash has the top bit set,
    /// so colliding terms tend to cancel instead of pile up
    pub alternate_sign: bool,
    pub norm: Option<Norm>,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            n_features: 1 << 14,
            ngram_range: (1, 2),
            alternate_sign: false,
            norm: None,
        }
    }
}

/// Stateless vectorizer mapping terms into a fixed number of hash buckets.
///
/// There is no vocabulary: any text, including never-seen terms, can be
/// transformed without fitting. `fit` exists only to share the
/// fit-then-transform interface and returns a clone.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    tokenizer: Tokenizer,
    n_features: u32,
    alternate_sign: bool,
    norm: Option<Norm>,
    space: FeatureSpace,
}

impl HashingVectorizer {
    pub fn new(tokenizer: Tokenizer, config: &HashingConfig) -> Result<Self> {
        if config.n_features == 0 || config.n_features > u32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "hashing n_features {} out of range",
                config.n_features
            )));
        }
        let tokenizer = tokenizer.with_ngram_range(config.ngram_range.0, config.ngram_range.1)?;

        let mut fp = XxHash64::with_seed(HASHING_SALT);
        tokenizer.fingerprint(&mut fp);
        fp.write_usize(config.n_features);
        fp.write_u8(config.alternate_sign as u8);
        fp.write_u8(match config.norm {
            None => 0,
            Some(Norm::L1) => 1,
            Some(Norm::L2) => 2,
        });
        let space = FeatureSpace::new(fp.finish(), config.n_features);

        Ok(Self {
            tokenizer,
            n_features: config.n_features as u32,
            alternate_sign: config.alternate_sign,
            norm: config.norm,
            space,
        })
    }

    /// Bucket and sign of one term
    #[inline]
    pub fn bucket(&self, term: &str) -> (u32, f64) {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(term.as_bytes());
        let h = hasher.finish();
        let index = (h % self.n_features as u64) as u32;
        let sign = if self.alternate_sign && (h >> 63) == 1 { -1.0 } else { 1.0 };
        (index, sign)
    }

    fn row(&self, text: &str) -> SparseVec<f64> {
        let terms = self.tokenizer.terms(text);
        let mut inds = Vec::with_capacity(terms.len());
        let mut vals = Vec::with_capacity(terms.len());
        for term in &terms {
            let (index, sign) = self.bucket(term);
            inds.push(index);
            vals.push(sign);
        }
        sort_coalesce_u32_soa(&mut inds, &mut vals);
        let row = SparseVec::from_sorted_parts(self.n_features as usize, inds, vals);
        match self.norm {
            Some(norm) => norm.apply(&row),
            None => row,
        }
    }
}

impl TextVectorizer for HashingVectorizer {
    type Fitted = HashingVectorizer;

    fn fit<S: AsRef<str> + Sync>(&self, _docs: &[S]) -> Result<HashingVectorizer> {
        Ok(self.clone())
    }
}

impl FittedVectorizer for HashingVectorizer {
    type Value = f64;

    fn transform<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<SparseMatrix<f64>> {
        let rows = docs.par_iter().map(|doc| self.row(doc.as_ref())).collect();
        SparseMatrix::from_rows(rows, self.space)
    }

    fn feature_space(&self) -> FeatureSpace {
        self.space
    }

    fn feature_name(&self, col: usize) -> Option<String> {
        (col < self.n_features as usize).then(|| format!("bucket_{col}"))
    }
}
