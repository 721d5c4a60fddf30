pub mod cv;
pub mod folds;
pub mod logistic;
pub mod metrics;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use self::cv::{CvResult, LogisticRegressionCv, PathPoint};
pub use self::folds::{Fold, StratifiedKFold};
pub use self::logistic::{Convergence, LogisticModel, LogisticRegression, SolverConfig};

/// `n` values log-spaced between `10^lo` and `10^hi`, ascending
pub fn log_space(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(lo)],
        _ => (0..n)
            .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / (n - 1) as f64))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// inverse regularisation strengths to search
    pub cs: Vec<f64>,
    /// stratified folds
    pub folds: usize,
    pub solver: SolverConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cs: log_space(-4.0, 4.0, 10),
            folds: 5,
            solver: SolverConfig::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.folds < 2 {
            return Err(Error::InvalidConfig(format!("folds must be at least 2, got {}", self.folds)));
        }
        LogisticRegressionCv::from_config(self).map(|_| ())
    }
}
