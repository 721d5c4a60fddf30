pub mod lda;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use self::lda::{FittedLda, Lda, LdaConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub lda: LdaConfig,
    /// terms listed per topic in the report
    pub top_terms: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            lda: LdaConfig::default(),
            top_terms: 8,
        }
    }
}

impl TopicConfig {
    pub fn validate(&self) -> Result<()> {
        self.lda.validate()
    }
}
