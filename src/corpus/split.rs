use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::corpus::{Document, DocumentTable, SplitRole};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// share of the shuffled rows held out for testing
    Fraction { test_fraction: f64 },
    /// fixed number of training rows, the rest are test rows
    Counts { train: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub strategy: SplitStrategy,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::Fraction { test_fraction: 0.2 },
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if let SplitStrategy::Fraction { test_fraction } = self.strategy {
            if !(test_fraction > 0.0 && test_fraction < 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "test_fraction {test_fraction} must lie in (0, 1)"
                )));
            }
        }
        Ok(())
    }

    /// Training rows for a corpus of `n` documents
    fn train_size(&self, n: usize) -> Result<usize> {
        self.validate()?;
        let train = match self.strategy {
            SplitStrategy::Fraction { test_fraction } => {
                n - ((n as f64 * test_fraction).round() as usize).min(n)
            }
            SplitStrategy::Counts { train } => train,
        };
        if train == 0 || train >= n {
            return Err(Error::InvalidConfig(format!(
                "split of {n} documents into {train} train rows leaves a side empty"
            )));
        }
        Ok(train)
    }
}

/// Disjoint train and test tables
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTest {
    pub train: DocumentTable,
    pub test: DocumentTable,
}

/// Shuffle with the configured seed, then cut into train and test
pub fn split(table: DocumentTable, config: &SplitConfig) -> Result<TrainTest> {
    if table.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    let n_train = config.train_size(table.len())?;

    let mut documents = table.into_documents();
    let mut rng = StdRng::seed_from_u64(config.seed);
    documents.shuffle(&mut rng);

    let test: Vec<Document> = documents
        .split_off(n_train)
        .into_iter()
        .map(|d| Document {
            split: Some(SplitRole::Test),
            ..d
        })
        .collect();
    let train: Vec<Document> = documents
        .into_iter()
        .map(|d| Document {
            split: Some(SplitRole::Train),
            ..d
        })
        .collect();
    tracing::info!(train = train.len(), test = test.len(), seed = config.seed, "corpus split");
    Ok(TrainTest {
        train: DocumentTable::new(train),
        test: DocumentTable::new(test),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::corpus::Label;

    fn table(n: usize) -> DocumentTable {
        let title: Arc<str> = Arc::from("t");
        DocumentTable::new(
            (0..n)
                .map(|id| Document {
                    id,
                    text: Some(format!("doc {id}")),
                    label: Label((id % 2) as u8),
                    title: title.clone(),
                    split: None,
                })
                .collect(),
        )
    }

    #[test]
    fn sets_are_disjoint_and_cover_the_corpus() {
        let tt = split(table(50), &SplitConfig::default()).unwrap();
        assert_eq!(tt.train.len(), 40);
        assert_eq!(tt.test.len(), 10);
        let mut ids: Vec<usize> = tt.train.iter().chain(tt.test.iter()).map(|d| d.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..50).collect::<Vec<_>>());
        assert!(tt.train.iter().all(|d| d.split == Some(SplitRole::Train)));
        assert!(tt.test.iter().all(|d| d.split == Some(SplitRole::Test)));
    }

    #[test]
    fn seed_makes_the_split_reproducible() {
        let config = SplitConfig::default();
        assert_eq!(split(table(30), &config).unwrap(), split(table(30), &config).unwrap());
        let other = SplitConfig { seed: 7, ..config };
        assert_ne!(split(table(30), &config).unwrap(), split(table(30), &other).unwrap());
    }

    #[test]
    fn fixed_counts() {
        let config = SplitConfig {
            strategy: SplitStrategy::Counts { train: 12 },
            seed: 1,
        };
        let tt = split(table(20), &config).unwrap();
        assert_eq!((tt.train.len(), tt.test.len()), (12, 8));

        let too_big = SplitConfig {
            strategy: SplitStrategy::Counts { train: 20 },
            seed: 1,
        };
        assert!(matches!(split(table(20), &too_big), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn bad_fraction_is_rejected() {
        let config = SplitConfig {
            strategy: SplitStrategy::Fraction { test_fraction: 1.5 },
            seed: 0,
        };
        assert!(config.validate().is_err());
        assert!(matches!(split(DocumentTable::default(), &SplitConfig::default()), Err(Error::EmptyCorpus)));
    }
}
