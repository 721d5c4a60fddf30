//! This crate is an authorship analysis engine: it turns two public-domain
//! books into document-term matrices, learns which author wrote each line,
//! mines collocations and fits a topic model.

pub mod classifier;
pub mod collocation;
pub mod config;
pub mod corpus;
pub mod error;
pub mod pipeline;
pub mod topic;
pub mod utils;
pub mod vectorizer;

/// Crate error type
/// Every fallible operation returns `authorship_analyzer::Result<T>`.
pub use error::{Error, Result};

/// Pipeline
/// Runs the whole analysis in one call:
/// - load and clean the two corpora
/// - seeded train/test split
/// - count, hashing and TF-IDF vectorization, each scored with a
///   cross-validated L1 logistic regression
/// - collocation mining with iterative prune
/// - LDA over the collocation-aware counts
///
/// The returned `PipelineReport` implements `Display` and `Serialize`.
pub use pipeline::{Pipeline, PipelineReport};

/// Pipeline configuration
/// Loaded from JSON; every field has a default.
pub use config::PipelineConfig;

/// Corpus sources
/// `GutenbergSource` downloads books, `DirectorySource` reads them from disk
/// and `MemorySource` serves in-memory lines.
pub use corpus::{CorpusSource, DirectorySource, GutenbergSource, MemorySource};

/// Vectorizers
/// Each is fitted once on training text and then transforms any number of
/// document sets into the same frozen feature space.
///
/// - `CountVectorizer`: raw term counts against a training vocabulary
/// - `HashingVectorizer`: hashed n-grams, no vocabulary
/// - `TfidfVectorizer`: counts reweighted by frozen IDF weights
pub use vectorizer::count::CountVectorizer;
pub use vectorizer::hashing::HashingVectorizer;
pub use vectorizer::tfidf::TfidfVectorizer;
pub use vectorizer::{FittedVectorizer, TextVectorizer};

/// Sparse document-term matrix
/// Stamped with the `FeatureSpace` of the vectorizer that built it; models
/// refuse matrices from any other space.
pub use utils::math::matrix::{FeatureSpace, SparseMatrix};

/// Cross-validated L1 logistic regression
pub use classifier::{LogisticModel, LogisticRegression, LogisticRegressionCv};

/// Collocation miner
/// Explicit accumulator of adjacent-pair statistics with `partial_fit`,
/// `prune` and `transform`.
pub use collocation::CollocationMiner;

/// Latent Dirichlet Allocation
pub use topic::{FittedLda, Lda};
