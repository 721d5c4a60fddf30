pub mod math;

use std::fmt::Debug;

use num::Num;
use serde::{Deserialize, Serialize};

/// SparseVec stores only the non-zero elements of a vector.
/// It holds `indices` and `values`:
/// `indices` are the logical positions of the stored elements and
/// `values` their values.
///
/// Elements are guaranteed to be sorted by ascending index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVec<N>
where
    N: Num + Copy,
{
    indices: Vec<u32>,
    values: Vec<N>,
    len: usize,
}

impl<N> SparseVec<N>
where
    N: Num + Copy,
{
    #[inline]
    pub fn new(len: usize) -> Self {
        SparseVec {
            indices: Vec::new(),
            values: Vec::new(),
            len,
        }
    }

    #[inline]
    pub fn with_capacity(len: usize, cap: usize) -> Self {
        SparseVec {
            indices: Vec::with_capacity(cap),
            values: Vec::with_capacity(cap),
            len,
        }
    }

    /// Build from already sorted, de-duplicated parts.
    /// Zero values are dropped.
    ///
    /// # Arguments
    /// * `len` - logical length
    /// * `indices` - ascending indices, all `< len`
    /// * `values` - values paired with `indices`
    pub fn from_sorted_parts(len: usize, indices: Vec<u32>, values: Vec<N>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]), "indices must be strictly ascending");
        debug_assert!(indices.last().map_or(true, |&i| (i as usize) < len), "index out of bounds");
        if values.iter().any(|v| v.is_zero()) {
            let (indices, values) = indices
                .into_iter()
                .zip(values)
                .filter(|(_, v)| !v.is_zero())
                .unzip();
            return SparseVec { indices, values, len };
        }
        SparseVec { indices, values, len }
    }

    /// Append an element past the current last index.
    /// Zeros are not stored.
    #[inline]
    pub fn push(&mut self, index: u32, value: N) {
        debug_assert!(self.indices.last().map_or(true, |&last| last < index), "push must keep indices ascending");
        debug_assert!((index as usize) < self.len, "index out of bounds");
        if !value.is_zero() {
            self.indices.push(index);
            self.values.push(value);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.values
    }

    /// Logical element access; missing elements read as zero.
    #[inline]
    pub fn get(&self, index: usize) -> Option<N> {
        if index >= self.len {
            return None;
        }
        match self.indices.binary_search(&(index as u32)) {
            Ok(pos) => Some(self.values[pos]),
            Err(_) => Some(N::zero()),
        }
    }

    /// Iterate over stored `(index, value)` pairs
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Map every stored value, dropping results that become zero.
    pub fn map_values<M, F>(&self, mut f: F) -> SparseVec<M>
    where
        M: Num + Copy,
        F: FnMut(u32, N) -> M,
    {
        let mut out = SparseVec::with_capacity(self.len, self.nnz());
        for (idx, val) in self.iter() {
            out.push(idx, f(idx, val));
        }
        out
    }
}

impl<N> SparseVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Dense copy of this row as `f64`
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.len];
        for (idx, val) in self.iter() {
            dense[idx as usize] = val.into();
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_skips_zeros_and_keeps_len() {
        let mut v = SparseVec::<u32>::new(5);
        v.push(0, 3);
        v.push(2, 0);
        v.push(4, 1);
        assert_eq!(v.len(), 5);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(0), Some(3));
        assert_eq!(v.get(2), Some(0));
        assert_eq!(v.get(4), Some(1));
        assert_eq!(v.get(5), None);
    }

    #[test]
    fn from_sorted_parts_drops_zero_values() {
        let v = SparseVec::from_sorted_parts(4, vec![0, 1, 3], vec![1.5f64, 0.0, 2.0]);
        assert_eq!(v.indices(), &[0, 3]);
        assert_eq!(v.values(), &[1.5, 2.0]);
        assert_eq!(v.to_dense(), vec![1.5, 0.0, 0.0, 2.0]);
    }
}
