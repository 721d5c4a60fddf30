use num::Num;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::math::vector::SparseVec;

/// Fingerprint of the column space a matrix was built in.
///
/// Every fitted vectorizer stamps the matrices it produces with its
/// `FeatureSpace`. Two matrices can only be fed to the same model when both
/// the `id` and the `dim` agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureSpace {
    /// xxhash of whatever defines the columns (vocabulary terms, hash width...)
    pub id: u64,
    /// number of columns
    pub dim: usize,
}

impl FeatureSpace {
    pub fn new(id: u64, dim: usize) -> Self {
        Self { id, dim }
    }

    /// Fail unless `other` is exactly this space
    pub fn ensure_same(&self, other: &FeatureSpace) -> Result<()> {
        if self.id != other.id {
            return Err(Error::FeatureSpaceMismatch {
                expected: self.id,
                found: other.id,
            });
        }
        if self.dim != other.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                got: other.dim,
            });
        }
        Ok(())
    }
}

/// Row-major sparse matrix (documents × features).
/// Each row is a `SparseVec` of length `space.dim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix<N>
where
    N: Num + Copy,
{
    rows: Vec<SparseVec<N>>,
    space: FeatureSpace,
}

impl<N> SparseMatrix<N>
where
    N: Num + Copy,
{
    /// Create a matrix from rows
    ///
    /// # Arguments
    /// * `rows` - rows, each of length `space.dim`
    /// * `space` - column space the rows were built in
    pub fn from_rows(rows: Vec<SparseVec<N>>, space: FeatureSpace) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != space.dim) {
            return Err(Error::DimensionMismatch {
                expected: space.dim,
                got: bad.len(),
            });
        }
        Ok(Self { rows, space })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.space.dim
    }

    #[inline]
    pub fn space(&self) -> FeatureSpace {
        self.space
    }

    #[inline]
    pub fn row(&self, i: usize) -> &SparseVec<N> {
        &self.rows[i]
    }

    #[inline]
    pub fn rows(&self) -> &[SparseVec<N>] {
        &self.rows
    }

    /// Total stored elements
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.nnz()).sum()
    }

    /// New matrix made of the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            rows: rows.iter().map(|&i| self.rows[i].clone()).collect(),
            space: self.space,
        }
    }

    /// Number of rows in which each column is non-zero (document frequency)
    pub fn column_nnz(&self) -> Vec<u64> {
        let mut df = vec![0u64; self.n_cols()];
        for row in &self.rows {
            for &idx in row.indices() {
                df[idx as usize] += 1;
            }
        }
        df
    }
}

impl<N> SparseMatrix<N>
where
    N: Num + Copy + Into<f64> + Send + Sync,
{
    /// `X · w`, computed row-parallel
    pub fn mul_vec(&self, w: &[f64]) -> Result<Vec<f64>> {
        if w.len() != self.n_cols() {
            return Err(Error::DimensionMismatch {
                expected: self.n_cols(),
                got: w.len(),
            });
        }
        Ok(self.rows.par_iter().map(|row| row.dot_dense(w)).collect())
    }

    /// `Xᵀ · r`
    pub fn t_mul_vec(&self, r: &[f64]) -> Result<Vec<f64>> {
        if r.len() != self.n_rows() {
            return Err(Error::DimensionMismatch {
                expected: self.n_rows(),
                got: r.len(),
            });
        }
        let mut out = vec![0.0; self.n_cols()];
        for (row, &ri) in self.rows.iter().zip(r) {
            if ri == 0.0 {
                continue;
            }
            for (idx, val) in row.iter() {
                out[idx as usize] += val.into() * ri;
            }
        }
        Ok(out)
    }

    /// Squared Frobenius norm
    pub fn frobenius_sq(&self) -> f64 {
        self.rows.par_iter().map(|r| r.norm_sq()).sum()
    }

    /// Apply `f` to every row in parallel, keeping the column space
    pub fn map_rows<M, F>(&self, f: F) -> SparseMatrix<M>
    where
        M: Num + Copy + Send,
        F: Fn(usize, &SparseVec<N>) -> SparseVec<M> + Sync,
    {
        SparseMatrix {
            rows: self
                .rows
                .par_iter()
                .enumerate()
                .map(|(i, row)| f(i, row))
                .collect(),
            space: self.space,
        }
    }

    pub fn into_rows(self) -> Vec<SparseVec<N>> {
        self.rows
    }

    /// Convert values to `f64`
    pub fn to_f64(&self) -> SparseMatrix<f64> {
        self.map_rows(|_, row| row.map_values(|_, v| v.into()))
    }
}
