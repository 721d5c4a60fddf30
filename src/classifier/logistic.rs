use num::Num;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::math::matrix::{FeatureSpace, SparseMatrix};

/// Proximal-gradient solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iter: usize,
    /// stop when no coefficient moves by more than
    /// `tol * max(1, largest coefficient)` in one step
    pub tol: f64,
    pub fit_intercept: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-4,
            fit_intercept: true,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::InvalidConfig("solver max_iter must be positive".into()));
        }
        if !(self.tol > 0.0) {
            return Err(Error::InvalidConfig(format!("solver tol {} must be positive", self.tol)));
        }
        Ok(())
    }
}

/// Iteration budget actually used by one fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convergence {
    pub iterations: usize,
    pub max_iter: usize,
    pub converged: bool,
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
#[inline]
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

#[inline]
fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

/// L1-penalised logistic regression for one regularisation strength.
///
/// Minimises `||w||_1 + C * Σ logloss(y_i, x_i·w + b)` with FISTA
/// (monotone variant) and backtracking line search. The intercept `b` is
/// not penalised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticRegression {
    c: f64,
    solver: SolverConfig,
}

struct Problem<'a, N>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    x: &'a SparseMatrix<N>,
    y: Vec<f64>,
    c: f64,
}

impl<N> Problem<'_, N>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    fn margins(&self, w: &[f64], b: f64) -> Result<Vec<f64>> {
        let mut z = self.x.mul_vec(w)?;
        z.iter_mut().for_each(|zi| *zi += b);
        Ok(z)
    }

    /// Smooth part of the objective
    fn loss(&self, w: &[f64], b: f64) -> Result<f64> {
        let z = self.margins(w, b)?;
        let sum: f64 = z
            .iter()
            .zip(&self.y)
            .map(|(&zi, &yi)| softplus(zi) - yi * zi)
            .sum();
        Ok(self.c * sum)
    }

    /// Smooth loss with its gradient in `w` and `b`
    fn loss_grad(&self, w: &[f64], b: f64) -> Result<(f64, Vec<f64>, f64)> {
        let z = self.margins(w, b)?;
        let mut loss = 0.0;
        let residual: Vec<f64> = z
            .iter()
            .zip(&self.y)
            .map(|(&zi, &yi)| {
                loss += softplus(zi) - yi * zi;
                self.c * (sigmoid(zi) - yi)
            })
            .collect();
        let grad_w = self.x.t_mul_vec(&residual)?;
        let grad_b = residual.iter().sum();
        Ok((self.c * loss, grad_w, grad_b))
    }
}

#[inline]
fn l1(w: &[f64]) -> f64 {
    w.iter().map(|v| v.abs()).sum()
}

impl LogisticRegression {
    pub fn new(c: f64, solver: SolverConfig) -> Result<Self> {
        if !(c > 0.0 && c.is_finite()) {
            return Err(Error::InvalidConfig(format!("C must be positive and finite, got {c}")));
        }
        solver.validate()?;
        Ok(Self { c, solver })
    }

    #[inline]
    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn fit<N>(&self, x: &SparseMatrix<N>, y: &[u8]) -> Result<LogisticModel>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        self.fit_warm(x, y, None)
    }

    /// Fit starting from the coefficients of `warm` when given
    ///
    /// # Arguments
    /// * `x` - document-term matrix
    /// * `y` - binary labels, one per row
    /// * `warm` - model fitted on the same feature space, e.g. for a nearby C
    pub fn fit_warm<N>(
        &self,
        x: &SparseMatrix<N>,
        y: &[u8],
        warm: Option<&LogisticModel>,
    ) -> Result<LogisticModel>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        if y.len() != x.n_rows() {
            return Err(Error::DimensionMismatch {
                expected: x.n_rows(),
                got: y.len(),
            });
        }
        if let Some(bad) = y.iter().find(|&&l| l > 1) {
            return Err(Error::InvalidLabels(format!("label {bad} is not binary")));
        }
        if x.n_rows() == 0 {
            return Err(Error::EmptyCorpus);
        }
        let n_features = x.n_cols();
        let problem = Problem {
            x,
            y: y.iter().map(|&l| l as f64).collect(),
            c: self.c,
        };

        let (mut w, mut b) = match warm {
            Some(model) => {
                model.feature_space.ensure_same(&x.space())?;
                (model.coef.clone(), model.intercept)
            }
            None => (vec![0.0; n_features], 0.0),
        };
        let mut obj = problem.loss(&w, b)? + l1(&w);
        let (mut v, mut vb) = (w.clone(), b);
        let mut t = 1.0f64;
        // Lipschitz estimate, only ever increased by backtracking
        let mut lipschitz = self.c * (x.frobenius_sq() + x.n_rows() as f64) / (4.0 * x.n_rows() as f64);
        lipschitz = lipschitz.max(1e-8);

        let max_iter = self.solver.max_iter;
        let mut iterations = 0;
        let mut converged = false;
        while iterations < max_iter {
            iterations += 1;
            let (fv, gw, gb) = problem.loss_grad(&v, vb)?;

            // proximal step from the extrapolated point with backtracking
            let (z, zb, fz) = loop {
                let step = 1.0 / lipschitz;
                let z: Vec<f64> = v
                    .iter()
                    .zip(&gw)
                    .map(|(&vi, &gi)| soft_threshold(vi - step * gi, step))
                    .collect();
                let zb = if self.solver.fit_intercept { vb - step * gb } else { vb };
                let fz = problem.loss(&z, zb)?;

                let mut lin = gb * (zb - vb);
                let mut sq = (zb - vb) * (zb - vb);
                for ((&zi, &vi), &gi) in z.iter().zip(&v).zip(&gw) {
                    let d = zi - vi;
                    lin += gi * d;
                    sq += d * d;
                }
                let bound = fv + lin + 0.5 * lipschitz * sq;
                if fz <= bound + 1e-12 * bound.abs().max(1.0) || !lipschitz.is_finite() {
                    break (z, zb, fz);
                }
                lipschitz *= 2.0;
            };

            let step_size = z
                .iter()
                .zip(&v)
                .map(|(a, b)| (a - b).abs())
                .fold((zb - vb).abs(), f64::max);
            let scale = z.iter().fold(zb.abs(), |m, a| m.max(a.abs())).max(1.0);

            // monotone FISTA: keep the better of the prox point and the last iterate
            let obj_z = fz + l1(&z);
            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let (w_next, b_next, obj_next) = if obj_z <= obj {
                (z.clone(), zb, obj_z)
            } else {
                (w.clone(), b, obj)
            };
            for i in 0..n_features {
                v[i] = w_next[i] + (t / t_next) * (z[i] - w_next[i]) + ((t - 1.0) / t_next) * (w_next[i] - w[i]);
            }
            vb = b_next + (t / t_next) * (zb - b_next) + ((t - 1.0) / t_next) * (b_next - b);
            w = w_next;
            b = b_next;
            obj = obj_next;
            t = t_next;

            if step_size <= self.solver.tol * scale {
                converged = true;
                break;
            }
        }

        let convergence = Convergence {
            iterations,
            max_iter,
            converged,
        };
        if !converged {
            tracing::warn!(
                c = self.c,
                iterations,
                max_iter,
                "logistic regression did not converge; keeping last iterate"
            );
        }
        Ok(LogisticModel {
            coef: w,
            intercept: if self.solver.fit_intercept { b } else { 0.0 },
            c: self.c,
            feature_space: x.space(),
            convergence,
        })
    }
}

/// Fitted logistic model, bound to the feature space it was trained in
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    coef: Vec<f64>,
    intercept: f64,
    c: f64,
    feature_space: FeatureSpace,
    convergence: Convergence,
}

impl LogisticModel {
    #[inline]
    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[inline]
    pub fn c(&self) -> f64 {
        self.c
    }

    #[inline]
    pub fn feature_space(&self) -> FeatureSpace {
        self.feature_space
    }

    #[inline]
    pub fn convergence(&self) -> Convergence {
        self.convergence
    }

    /// Number of non-zero coefficients
    pub fn nnz(&self) -> usize {
        self.coef.iter().filter(|w| **w != 0.0).count()
    }

    /// `x·w + b` per row.
    /// Fails when `x` was not built in this model's feature space.
    pub fn decision_function<N>(&self, x: &SparseMatrix<N>) -> Result<Vec<f64>>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        self.feature_space.ensure_same(&x.space())?;
        let mut z = x.mul_vec(&self.coef)?;
        z.iter_mut().for_each(|zi| *zi += self.intercept);
        Ok(z)
    }

    /// Probability of label 1 per row
    pub fn predict_proba<N>(&self, x: &SparseMatrix<N>) -> Result<Vec<f64>>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        Ok(self.decision_function(x)?.into_iter().map(sigmoid).collect())
    }

    pub fn predict<N>(&self, x: &SparseMatrix<N>) -> Result<Vec<u8>>
    where
        N: Num + Copy + Into<f64> + Send + Sync,
    {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|z| (z > 0.0) as u8)
            .collect())
    }

    /// Non-zero coefficients as `(column, weight)`, largest magnitude first
    pub fn nonzero_terms(&self) -> Vec<(usize, f64)> {
        let mut terms: Vec<(usize, f64)> = self
            .coef
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0.0)
            .map(|(i, &w)| (i, w))
            .collect();
        terms.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then_with(|| a.0.cmp(&b.0)));
        terms
    }
}
