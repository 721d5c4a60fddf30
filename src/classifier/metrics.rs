use serde::Serialize;

use crate::error::{Error, Result};

fn check_inputs(y: &[u8], scores: &[f64]) -> Result<(usize, usize)> {
    if y.len() != scores.len() {
        return Err(Error::DimensionMismatch {
            expected: y.len(),
            got: scores.len(),
        });
    }
    if let Some(bad) = y.iter().find(|&&l| l > 1) {
        return Err(Error::InvalidLabels(format!("label {bad} is not binary")));
    }
    let n_pos = y.iter().filter(|&&l| l == 1).count();
    let n_neg = y.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(Error::InvalidLabels(
            "AUC needs both classes present".into(),
        ));
    }
    Ok((n_pos, n_neg))
}

/// Area under the ROC curve.
///
/// Computed as the Mann-Whitney U statistic over average ranks, so tied
/// scores count one half. Always in `[0, 1]`.
///
/// # Arguments
/// * `y` - binary labels (0 or 1)
/// * `scores` - higher means more likely label 1
pub fn roc_auc(y: &[u8], scores: &[f64]) -> Result<f64> {
    let (n_pos, n_neg) = check_inputs(y, scores)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; a tie group shares the mean of i+1..=j
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let pos_in_group = order[i..j].iter().filter(|&&k| y[k] == 1).count();
        rank_sum_pos += avg_rank * pos_in_group as f64;
        i = j;
    }

    let n_pos_f = n_pos as f64;
    let u = rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Ok((u / (n_pos_f * n_neg as f64)).clamp(0.0, 1.0))
}

/// ROC curve points, one per distinct threshold, starting at (0, 0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Trapezoidal area; equals `roc_auc` on the same inputs
    pub fn area(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(f, t)| (f[1] - f[0]) * (t[1] + t[0]) / 2.0)
            .sum()
    }
}

pub fn roc_curve(y: &[u8], scores: &[f64]) -> Result<RocCurve> {
    let (n_pos, n_neg) = check_inputs(y, scores)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        curve.fpr.push(fp as f64 / n_neg as f64);
        curve.tpr.push(tp as f64 / n_pos as f64);
        curve.thresholds.push(threshold);
    }
    Ok(curve)
}

/// Fraction of predictions equal to the labels
pub fn accuracy(y: &[u8], predicted: &[u8]) -> Result<f64> {
    if y.len() != predicted.len() {
        return Err(Error::DimensionMismatch {
            expected: y.len(),
            got: predicted.len(),
        });
    }
    if y.is_empty() {
        return Ok(0.0);
    }
    let hits = y.iter().zip(predicted).filter(|(a, b)| a == b).count();
    Ok(hits as f64 / y.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_and_inverted_separators() {
        let y = [0, 0, 1, 1];
        assert_eq!(roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0);
        assert_eq!(roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]).unwrap(), 0.0);
    }

    #[test]
    fn ties_count_half() {
        let y = [0, 1];
        assert_eq!(roc_auc(&y, &[0.5, 0.5]).unwrap(), 0.5);
        let y = [0, 0, 1, 1];
        // one of four pos/neg pairs tied, the rest ordered
        assert_eq!(roc_auc(&y, &[0.1, 0.5, 0.5, 0.9]).unwrap(), 0.875);
    }

    #[test]
    fn curve_area_matches_rank_statistic() {
        let y = [0, 1, 0, 1, 1, 0, 1, 0];
        let s = [0.3, 0.7, 0.5, 0.5, 0.9, 0.1, 0.2, 0.6];
        let auc = roc_auc(&y, &s).unwrap();
        let curve = roc_curve(&y, &s).unwrap();
        assert!((curve.area() - auc).abs() < 1e-12);
        assert_eq!(*curve.fpr.last().unwrap(), 1.0);
        assert_eq!(*curve.tpr.last().unwrap(), 1.0);
    }

    #[test]
    fn single_class_is_an_error() {
        assert!(matches!(roc_auc(&[1, 1], &[0.2, 0.3]), Err(Error::InvalidLabels(_))));
        assert!(roc_auc(&[0, 1], &[0.2]).is_err());
        assert!(roc_auc(&[0, 2], &[0.2, 0.3]).is_err());
    }

    #[test]
    fn accuracy_counts_hits() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap(), 0.75);
    }
}
