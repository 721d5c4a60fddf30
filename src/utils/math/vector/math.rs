use std::cmp::Ordering;

use num::Num;

use super::SparseVec;

impl<N> SparseVec<N>
where
    N: Num + Copy + Into<f64>,
{
    /// Dot product with another sparse vector
    ///
    /// # Arguments
    /// * `other` - other vector of the same length
    ///
    /// # Returns
    /// * `f64` - dot product
    #[inline]
    pub fn dot<M>(&self, other: &SparseVec<M>) -> f64
    where
        M: Num + Copy + Into<f64>,
    {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "Vectors must be of the same length to compute dot product."
        );

        let mut result = 0.0;
        if self.nnz() == 0 || other.nnz() == 0 {
            return result;
        }

        let (s_inds, s_vals) = (self.indices(), self.values());
        let (o_inds, o_vals) = (other.indices(), other.values());
        let mut i = 0;
        let mut j = 0;
        while i < s_inds.len() && j < o_inds.len() {
            match s_inds[i].cmp(&o_inds[j]) {
                Ordering::Equal => {
                    result += s_vals[i].into() * o_vals[j].into();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        result
    }

    /// Dot product with a dense vector
    #[inline]
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        debug_assert_eq!(self.len(), dense.len());
        self.iter()
            .map(|(idx, val)| val.into() * dense[idx as usize])
            .sum()
    }

    /// Squared L2 norm
    #[inline]
    pub fn norm_sq(&self) -> f64 {
        self.values()
            .iter()
            .map(|&v| {
                let v: f64 = v.into();
                v * v
            })
            .sum()
    }

    /// L1 norm
    #[inline]
    pub fn norm_l1(&self) -> f64 {
        self.values().iter().map(|&v| v.into().abs()).sum()
    }

    /// Sum of stored values
    #[inline]
    pub fn sum(&self) -> f64 {
        self.values().iter().map(|&v| v.into()).sum()
    }

    /// Scale every value by `factor`
    #[inline]
    pub fn scale(&self, factor: f64) -> SparseVec<f64> {
        self.map_values(|_, val| val.into() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_matches_dense_dot() {
        let a = SparseVec::from_sorted_parts(6, vec![0, 2, 5], vec![1u32, 2, 3]);
        let b = SparseVec::from_sorted_parts(6, vec![2, 3, 5], vec![0.5f64, 4.0, 2.0]);
        let dense: f64 = a
            .to_dense()
            .iter()
            .zip(b.to_dense())
            .map(|(x, y)| x * y)
            .sum();
        assert!((a.dot(&b) - dense).abs() < 1e-12);
        assert!((a.dot(&b) - 7.0).abs() < 1e-12);
        assert!((a.dot_dense(&b.to_dense()) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn norms_and_hadamard() {
        let a = SparseVec::from_sorted_parts(3, vec![0, 2], vec![3u32, 4]);
        assert_eq!(a.norm_sq(), 25.0);
        assert_eq!(a.norm_l1(), 7.0);
        let h = a.scale(0.5);
        assert_eq!(h.values(), &[1.5, 2.0]);
        assert_eq!(h.indices(), a.indices());
    }
}
