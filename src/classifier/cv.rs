use ndarray::{Array2, Axis};
use num::Num;
use rayon::prelude::*;
use serde::Serialize;

use crate::classifier::folds::StratifiedKFold;
use crate::classifier::logistic::{LogisticModel, LogisticRegression, SolverConfig};
use crate::classifier::metrics::roc_auc;
use crate::classifier::ClassifierConfig;
use crate::error::{Error, Result};
use crate::utils::math::matrix::SparseMatrix;

/// One point of the regularisation path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathPoint {
    pub c: f64,
    /// non-zero coefficients when fitted on every training row
    pub nnz: usize,
    pub mean_auc: f64,
    pub converged: bool,
}

/// Outcome of the cross-validated search
#[derive(Debug, Clone)]
pub struct CvResult {
    /// ascending
    pub cs: Vec<f64>,
    /// `[n_cs, k]` held-out AUC
    pub fold_auc: Array2<f64>,
    pub mean_auc: Vec<f64>,
    pub best_c: f64,
    pub best_auc: f64,
    pub path: Vec<PathPoint>,
    /// refitted on every row with `best_c`
    pub model: LogisticModel,
}

/// L1 logistic regression with the regularisation strength chosen by
/// stratified k-fold cross-validated AUC.
#[derive(Debug, Clone)]
pub struct LogisticRegressionCv {
    cs: Vec<f64>,
    folds: StratifiedKFold,
    solver: SolverConfig,
}

impl LogisticRegressionCv {
    pub fn new(mut cs: Vec<f64>, folds: usize, solver: SolverConfig) -> Result<Self> {
        if cs.is_empty() {
            return Err(Error::InvalidConfig("Cs grid is empty".into()));
        }
        if let Some(bad) = cs.iter().find(|c| !(**c > 0.0 && c.is_finite())) {
            return Err(Error::InvalidConfig(format!("C {bad} must be positive and finite")));
        }
        solver.validate()?;
        cs.sort_by(f64::total_cmp);
        cs.dedup();
        Ok(Self {
            cs,
            folds: StratifiedKFold::new(folds)?,
            solver,
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        Self::new(config.cs.clone(), config.folds, config.solver)
    }

    #[inline]
    pub fn cs(&self) -> &[f64] {
        &self.cs
    }

    /// Fit the whole path of Cs on `x`, each fit warm-started from the
    /// previous (smaller) C
    fn fit_path<N>(&self, x: &SparseMatrix<N>, y: &[u8]) -> Result<Vec<LogisticModel>>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        let mut models: Vec<LogisticModel> = Vec::with_capacity(self.cs.len());
        for &c in &self.cs {
            let model = LogisticRegression::new(c, self.solver)?.fit_warm(x, y, models.last())?;
            tracing::debug!(c, nnz = model.nnz(), iterations = model.convergence().iterations, "path point");
            models.push(model);
        }
        Ok(models)
    }

    /// Cross-validate every C, pick the best mean AUC (ties go to the
    /// smaller C) and refit on all rows
    ///
    /// # Arguments
    /// * `x` - training document-term matrix
    /// * `y` - binary labels, one per row
    pub fn fit<N>(&self, x: &SparseMatrix<N>, y: &[u8]) -> Result<CvResult>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        if y.len() != x.n_rows() {
            return Err(Error::DimensionMismatch {
                expected: x.n_rows(),
                got: y.len(),
            });
        }
        let folds = self.folds.split(y)?;

        let (fold_scores, full_path) = rayon::join(
            || {
                folds
                    .par_iter()
                    .map(|fold| {
                        let x_train = x.select_rows(&fold.train);
                        let y_train: Vec<u8> = fold.train.iter().map(|&i| y[i]).collect();
                        let x_test = x.select_rows(&fold.test);
                        let y_test: Vec<u8> = fold.test.iter().map(|&i| y[i]).collect();
                        self.fit_path(&x_train, &y_train)?
                            .iter()
                            .map(|model| roc_auc(&y_test, &model.decision_function(&x_test)?))
                            .collect::<Result<Vec<f64>>>()
                    })
                    .collect::<Result<Vec<Vec<f64>>>>()
            },
            || self.fit_path(x, y),
        );
        let fold_scores = fold_scores?;
        let mut full_path = full_path?;

        let k = folds.len();
        let mut fold_auc = Array2::<f64>::zeros((self.cs.len(), k));
        for (f, scores) in fold_scores.iter().enumerate() {
            for (ci, &auc) in scores.iter().enumerate() {
                fold_auc[[ci, f]] = auc;
            }
        }
        let mean_auc: Vec<f64> = fold_auc
            .mean_axis(Axis(1))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; self.cs.len()]);

        let mut best = 0;
        for (i, &auc) in mean_auc.iter().enumerate() {
            if auc > mean_auc[best] {
                best = i;
            }
        }

        let path = self
            .cs
            .iter()
            .zip(&full_path)
            .zip(&mean_auc)
            .map(|((&c, model), &mean_auc)| PathPoint {
                c,
                nnz: model.nnz(),
                mean_auc,
                converged: model.convergence().converged,
            })
            .collect();
        let model = full_path.swap_remove(best);

        tracing::info!(
            best_c = self.cs[best],
            best_auc = mean_auc[best],
            nnz = model.nnz(),
            folds = k,
            "cross-validation done"
        );
        Ok(CvResult {
            cs: self.cs.clone(),
            fold_auc,
            best_c: self.cs[best],
            best_auc: mean_auc[best],
            mean_auc,
            path,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::matrix::FeatureSpace;
    use crate::utils::math::vector::SparseVec;

    fn two_clusters(n: usize) -> (SparseMatrix<u32>, Vec<u8>) {
        let space = FeatureSpace::new(9, 4);
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let label = (i % 2) as u8;
            let base = if label == 1 { 0 } else { 2 };
            let mut row = SparseVec::new(4);
            row.push(base, 1 + (i % 3) as u32);
            row.push(base + 1, 1 + (i % 2) as u32);
            rows.push(row);
            y.push(label);
        }
        (SparseMatrix::from_rows(rows, space).unwrap(), y)
    }

    #[test]
    fn perfect_separator_scores_one() {
        let (x, y) = two_clusters(40);
        let cv = LogisticRegressionCv::new(vec![0.01, 1.0, 100.0], 4, SolverConfig::default()).unwrap();
        let result = cv.fit(&x, &y).unwrap();
        assert_eq!(result.fold_auc.dim(), (3, 4));
        assert_eq!(result.best_auc, 1.0);
        assert!(result.mean_auc.iter().all(|a| (0.0..=1.0).contains(a)));
        assert_eq!(result.model.c(), result.best_c);
        let scores = result.model.decision_function(&x).unwrap();
        assert_eq!(roc_auc(&y, &scores).unwrap(), 1.0);
    }

    #[test]
    fn ties_pick_the_smaller_c() {
        let (x, y) = two_clusters(40);
        let cv = LogisticRegressionCv::new(vec![100.0, 1.0, 10.0], 4, SolverConfig::default()).unwrap();
        assert_eq!(cv.cs(), &[1.0, 10.0, 100.0]);
        let result = cv.fit(&x, &y).unwrap();
        // every C separates the clusters perfectly
        assert_eq!(result.best_c, 1.0);
        assert_eq!(result.path.len(), 3);
        assert!(result.path.windows(2).all(|w| w[0].c < w[1].c));
    }

    #[test]
    fn invalid_grids_are_rejected() {
        assert!(LogisticRegressionCv::new(vec![], 5, SolverConfig::default()).is_err());
        assert!(LogisticRegressionCv::new(vec![-1.0], 5, SolverConfig::default()).is_err());
        assert!(LogisticRegressionCv::new(vec![1.0], 1, SolverConfig::default()).is_err());
    }
}
