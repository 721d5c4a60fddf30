use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw counts behind one candidate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCounts {
    /// occurrences of the adjacent pair
    pub pair: u64,
    pub left: u64,
    pub right: u64,
    /// tokens seen so far
    pub total: u64,
    /// distinct unigrams seen so far
    pub vocab_size: u64,
}

impl PairCounts {
    #[inline]
    fn probs(&self) -> (f64, f64, f64) {
        let n = self.total as f64;
        (
            self.pair as f64 / n,
            self.left as f64 / n,
            self.right as f64 / n,
        )
    }

    /// Pointwise mutual information, `log2(p_ab / (p_a p_b))`
    #[inline]
    pub fn pmi(&self) -> f64 {
        let (p_ab, p_a, p_b) = self.probs();
        (p_ab / (p_a * p_b)).log2()
    }

    /// Frequency-ratio score, `(c_ab - min_count) / (c_a c_b) * |V|`
    #[inline]
    pub fn gensim(&self, min_count: u64) -> f64 {
        (self.pair as f64 - min_count as f64) / (self.left as f64 * self.right as f64)
            * self.vocab_size as f64
    }

    /// Log-frequency biased mutual dependency,
    /// `log2(p_ab^2 / (p_a p_b)) + log2(p_ab)`
    #[inline]
    pub fn lfmd(&self) -> f64 {
        let (p_ab, p_a, p_b) = self.probs();
        (p_ab * p_ab / (p_a * p_b)).log2() + p_ab.log2()
    }
}

/// One row of the collocation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollocationStats {
    pub left: String,
    pub right: String,
    pub count: u64,
    pub pmi: f64,
    pub gensim: f64,
    pub lfmd: f64,
}

impl CollocationStats {
    pub fn new(left: &str, right: &str, counts: &PairCounts, min_count: u64) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
            count: counts.pair,
            pmi: counts.pmi(),
            gensim: counts.gensim(min_count),
            lfmd: counts.lfmd(),
        }
    }
}

impl fmt::Display for CollocationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pair = format!("{} {}", self.left, self.right);
        write!(
            f,
            "{:<32} {:>8.3} {:>10.3} {:>9.3} {:>7}",
            pair, self.pmi, self.gensim, self.lfmd, self.count
        )
    }
}

/// Lower bounds used by `CollocationMiner::prune`; `None` disables a bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneThresholds {
    pub pmi: Option<f64>,
    pub gensim: Option<f64>,
    pub lfmd: Option<f64>,
}

impl PruneThresholds {
    /// Whether a row meets every bound
    pub fn accepts(&self, row: &CollocationStats) -> bool {
        self.pmi.map_or(true, |t| row.pmi >= t)
            && self.gensim.map_or(true, |t| row.gensim >= t)
            && self.lfmd.map_or(true, |t| row.lfmd >= t)
    }
}

/// What a prune call removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneOutcome {
    pub before: usize,
    pub removed: usize,
    pub after: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> PairCounts {
        PairCounts {
            pair: 4,
            left: 8,
            right: 4,
            total: 64,
            vocab_size: 10,
        }
    }

    #[test]
    fn metrics_match_hand_computation() {
        let c = counts();
        // p_ab = 1/16, p_a = 1/8, p_b = 1/16
        assert!((c.pmi() - 3.0).abs() < 1e-12);
        assert!((c.lfmd() - (-1.0 - 4.0)).abs() < 1e-12);
        assert!((c.gensim(2) - 2.0 / 32.0 * 10.0).abs() < 1e-12);
    }

    #[test]
    fn thresholds_require_every_bound() {
        let row = CollocationStats::new("a", "b", &counts(), 2);
        assert!(PruneThresholds::default().accepts(&row));
        let t = PruneThresholds {
            pmi: Some(2.0),
            lfmd: Some(-6.0),
            ..Default::default()
        };
        assert!(t.accepts(&row));
        let t = PruneThresholds {
            gensim: Some(1.0),
            ..t
        };
        assert!(!t.accepts(&row));
    }
}
