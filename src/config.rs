use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierConfig;
use crate::collocation::CollocationConfig;
use crate::corpus::{CorpusConfig, SplitConfig};
use crate::error::{Error, Result};
use crate::topic::TopicConfig;
use crate::vectorizer::VectorizerConfig;

/// Every knob of one pipeline run.
///
/// Missing sections and fields fall back to their defaults, so an empty
/// JSON object is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub corpus: CorpusConfig,
    pub split: SplitConfig,
    pub vectorizer: VectorizerConfig,
    pub classifier: ClassifierConfig,
    pub collocation: CollocationConfig,
    pub topic: TopicConfig,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.corpus.validate()?;
        self.split.validate()?;
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        self.collocation.validate()?;
        self.topic.validate()?;
        if self.collocation.label as usize >= self.corpus.ids.len() {
            return Err(Error::InvalidConfig(format!(
                "collocation label {} has no corpus",
                self.collocation.label
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SplitStrategy;

    #[test]
    fn empty_json_gives_defaults() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.vectorizer.hashing.n_features, 1 << 14);
        assert_eq!(config.topic.lda.n_topics, 20);
        assert_eq!(config.classifier.folds, 5);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let json = r#"{
            "split": { "strategy": { "kind": "counts", "train": 100 }, "seed": 3 },
            "classifier": { "folds": 4, "solver": { "max_iter": 50 } },
            "vectorizer": { "limits": { "min_df": 2, "max_df": 0.9 } }
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.split.strategy, SplitStrategy::Counts { train: 100 });
        assert_eq!(config.classifier.folds, 4);
        assert_eq!(config.classifier.solver.max_iter, 50);
        assert!(config.classifier.solver.fit_intercept);
        assert_eq!(config.topic, TopicConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn round_trips_through_json() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = PipelineConfig::default();
        config.classifier.folds = 1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.collocation.label = 2;
        assert!(config.validate().is_err());
        assert!(PipelineConfig::from_json_str("{ not json").is_err());
    }
}
