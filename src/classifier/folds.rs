use crate::error::{Error, Result};

/// Row indices of one cross-validation split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold without shuffling.
///
/// The i-th row of each class goes to fold `i % k`, so every fold keeps
/// the class ratio and the split depends only on row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    k: usize,
}

impl StratifiedKFold {
    pub fn new(k: usize) -> Result<Self> {
        if k < 2 {
            return Err(Error::InvalidConfig(format!("need at least 2 folds, got {k}")));
        }
        Ok(Self { k })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Build the folds for labels `y`
    ///
    /// Fails when a class has fewer rows than folds.
    pub fn split(&self, y: &[u8]) -> Result<Vec<Fold>> {
        if let Some(bad) = y.iter().find(|&&l| l > 1) {
            return Err(Error::InvalidLabels(format!("label {bad} is not binary")));
        }
        let mut assignment = vec![0usize; y.len()];
        for class in [0u8, 1] {
            let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
            if members.len() < self.k {
                return Err(Error::InvalidLabels(format!(
                    "class {class} has {} rows, fewer than {} folds",
                    members.len(),
                    self.k
                )));
            }
            for (pos, &row) in members.iter().enumerate() {
                assignment[row] = pos % self.k;
            }
        }

        Ok((0..self.k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| assignment[i] == fold);
                Fold { train, test }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_partition_rows_and_keep_both_classes() {
        let y: Vec<u8> = (0..23).map(|i| (i % 3 == 0) as u8).collect();
        let folds = StratifiedKFold::new(4).unwrap().split(&y).unwrap();
        assert_eq!(folds.len(), 4);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 23);
            assert!(fold.test.iter().all(|i| !fold.train.contains(i)));
            assert!(fold.test.iter().any(|&i| y[i] == 1));
            assert!(fold.test.iter().any(|&i| y[i] == 0));
        }
    }

    #[test]
    fn split_is_deterministic() {
        let y = [0, 1, 0, 1, 0, 1, 1, 0];
        let kf = StratifiedKFold::new(2).unwrap();
        assert_eq!(kf.split(&y).unwrap(), kf.split(&y).unwrap());
    }

    #[test]
    fn too_few_rows_per_class() {
        assert!(StratifiedKFold::new(3).unwrap().split(&[0, 0, 0, 1, 1]).is_err());
        assert!(StratifiedKFold::new(1).is_err());
    }
}
