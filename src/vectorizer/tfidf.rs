use std::hash::Hasher;

use num::Num;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{Error, Result};
use crate::utils::math::matrix::{FeatureSpace, SparseMatrix};
use crate::utils::math::vector::SparseVec;
use crate::vectorizer::count::{CountVectorizer, FittedCountVectorizer};
use crate::vectorizer::vocabulary::Vocabulary;
use crate::vectorizer::{FittedVectorizer, TextVectorizer};

const TFIDF_SALT: u64 = 0x7F1DF;

/// Row normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

impl Norm {
    /// Normalise `row`; an all-zero row comes back unchanged
    #[inline]
    pub fn apply<N>(&self, row: &SparseVec<N>) -> SparseVec<f64>
    where
        N: Num + Copy + Into<f64>,
    {
        let norm = match self {
            Norm::L1 => row.norm_l1(),
            Norm::L2 => row.norm_sq().sqrt(),
        };
        if norm == 0.0 {
            return row.scale(1.0);
        }
        row.scale(1.0 / norm)
    }
}

/// How document frequency turns into a column weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfWeighting {
    /// `ln(n / df)`; a term in every document weighs zero
    Log,
    /// `ln(n / df) + 1`
    LogPlusOne,
    /// `ln((1 + n) / (1 + df)) + 1`
    Smooth,
}

impl IdfWeighting {
    #[inline]
    fn weight(&self, n: f64, df: u64) -> f64 {
        match self {
            IdfWeighting::Log => (n / df.max(1) as f64).ln(),
            IdfWeighting::LogPlusOne => (n / df.max(1) as f64).ln() + 1.0,
            IdfWeighting::Smooth => ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            IdfWeighting::Log => 0,
            IdfWeighting::LogPlusOne => 1,
            IdfWeighting::Smooth => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    pub idf: IdfWeighting,
    /// replace `tf` with `1 + ln(tf)`
    pub sublinear_tf: bool,
    pub norm: Option<Norm>,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            idf: IdfWeighting::Log,
            sublinear_tf: false,
            norm: None,
        }
    }
}

/// IDF vector; dense because every vocabulary column has a weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdfVector {
    pub idf_vec: Vec<f64>,
    /// number of documents the weights were fitted on
    pub doc_num: u64,
}

impl IdfVector {
    /// Compute IDF weights from document frequencies
    ///
    /// # Arguments
    /// * `doc_num` - number of documents
    /// * `doc_freq` - per-column document frequency
    /// * `weighting` - idf formula
    pub fn from_doc_freq(doc_num: u64, doc_freq: &[u64], weighting: IdfWeighting) -> Self {
        let n = doc_num as f64;
        let idf_vec = doc_freq.iter().map(|&df| weighting.weight(n, df)).collect();
        Self { idf_vec, doc_num }
    }
}

/// Fits IDF weights on a count matrix
#[derive(Debug, Clone, Default)]
pub struct TfidfTransformer {
    config: TfidfConfig,
}

impl TfidfTransformer {
    pub fn new(config: TfidfConfig) -> Self {
        Self { config }
    }

    /// Learn IDF weights from a training count matrix
    pub fn fit<N>(&self, counts: &SparseMatrix<N>) -> Result<FittedTfidfTransformer>
    where
        N: Num + Copy,
    {
        if counts.n_rows() == 0 {
            return Err(Error::EmptyCorpus);
        }
        let idf = IdfVector::from_doc_freq(counts.n_rows() as u64, &counts.column_nnz(), self.config.idf);
        let input_space = counts.space();
        let mut fp = XxHash64::with_seed(TFIDF_SALT);
        fp.write_u64(input_space.id);
        fp.write_u8(self.config.idf.tag());
        fp.write_u8(self.config.sublinear_tf as u8);
        fp.write_u8(match self.config.norm {
            None => 0,
            Some(Norm::L1) => 1,
            Some(Norm::L2) => 2,
        });
        Ok(FittedTfidfTransformer {
            idf,
            sublinear_tf: self.config.sublinear_tf,
            norm: self.config.norm,
            input_space,
            output_space: FeatureSpace::new(fp.finish(), input_space.dim),
        })
    }
}

/// Frozen IDF weights, reapplied unchanged to every matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTfidfTransformer {
    idf: IdfVector,
    sublinear_tf: bool,
    norm: Option<Norm>,
    input_space: FeatureSpace,
    output_space: FeatureSpace,
}

/// TF-IDF matrix with the raw counts it was built from kept alongside
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    matrix: SparseMatrix<f64>,
    counts: SparseMatrix<f64>,
}

impl TfidfMatrix {
    pub fn matrix(&self) -> &SparseMatrix<f64> {
        &self.matrix
    }

    /// Raw counts the matrix was built from, in the count space of
    /// `transformer`
    pub fn to_counts(&self, transformer: &FittedTfidfTransformer) -> Result<SparseMatrix<f64>> {
        transformer.output_space.ensure_same(&self.matrix.space())?;
        transformer.input_space.ensure_same(&self.counts.space())?;
        Ok(self.counts.clone())
    }
}

impl FittedTfidfTransformer {
    #[inline]
    pub fn idf(&self) -> &IdfVector {
        &self.idf
    }

    #[inline]
    pub fn output_space(&self) -> FeatureSpace {
        self.output_space
    }

    /// Reweighted rows of `counts`
    fn weigh<N>(&self, counts: &SparseMatrix<N>) -> Result<SparseMatrix<f64>>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        self.input_space.ensure_same(&counts.space())?;
        let idf = &self.idf.idf_vec;
        let sublinear = self.sublinear_tf;
        let norm = self.norm;
        let weighted = counts.map_rows(|_, row| {
            let row = row.map_values(|idx, v| {
                let tf: f64 = v.into();
                let tf = if sublinear { 1.0 + tf.ln() } else { tf };
                tf * idf[idx as usize]
            });
            match norm {
                Some(norm) => norm.apply(&row),
                None => row,
            }
        });
        SparseMatrix::from_rows(weighted.into_rows(), self.output_space)
    }

    /// Reweight a count matrix built in the space the weights were fitted on
    pub fn transform<N>(&self, counts: &SparseMatrix<N>) -> Result<TfidfMatrix>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        Ok(TfidfMatrix {
            matrix: self.weigh(counts)?,
            counts: counts.to_f64(),
        })
    }
}

/// Count vectorizer followed by TF-IDF reweighting
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    count: CountVectorizer,
    transformer: TfidfTransformer,
}

impl TfidfVectorizer {
    pub fn new(count: CountVectorizer, config: TfidfConfig) -> Self {
        Self {
            count,
            transformer: TfidfTransformer::new(config),
        }
    }
}

impl TextVectorizer for TfidfVectorizer {
    type Fitted = FittedTfidfVectorizer;

    fn fit<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<FittedTfidfVectorizer> {
        let count = self.count.fit(docs)?;
        let counts = count.transform(docs)?;
        let tfidf = self.transformer.fit(&counts)?;
        Ok(FittedTfidfVectorizer { count, tfidf })
    }
}

#[derive(Debug, Clone)]
pub struct FittedTfidfVectorizer {
    count: FittedCountVectorizer,
    tfidf: FittedTfidfTransformer,
}

impl FittedTfidfVectorizer {
    pub fn vocabulary(&self) -> &Vocabulary {
        self.count.vocabulary()
    }

    pub fn count_vectorizer(&self) -> &FittedCountVectorizer {
        &self.count
    }

    pub fn transformer(&self) -> &FittedTfidfTransformer {
        &self.tfidf
    }

    /// Transform, keeping the raw counts next to the weights
    pub fn transform_with_counts<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<TfidfMatrix> {
        let counts = self.count.transform(docs)?;
        self.tfidf.transform(&counts)
    }
}

impl FittedVectorizer for FittedTfidfVectorizer {
    type Value = f64;

    fn transform<S: AsRef<str> + Sync>(&self, docs: &[S]) -> Result<SparseMatrix<f64>> {
        let counts = self.count.transform(docs)?;
        self.tfidf.weigh(&counts)
    }

    fn feature_space(&self) -> FeatureSpace {
        self.tfidf.output_space()
    }

    fn feature_name(&self, col: usize) -> Option<String> {
        self.count.feature_name(col)
    }
}
