//! Latent Dirichlet Allocation fitted by collapsed Gibbs sampling.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::math::matrix::{FeatureSpace, SparseMatrix};
use crate::vectorizer::vocabulary::Vocabulary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaConfig {
    pub n_topics: usize,
    /// document-topic prior
    pub alpha: f64,
    /// topic-term prior
    pub beta: f64,
    /// Gibbs sweeps over every token
    pub n_iterations: usize,
    /// sweeps before the log-likelihood is recorded
    pub burn_in: usize,
    pub seed: u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 20,
            alpha: 0.1,
            beta: 0.01,
            n_iterations: 200,
            burn_in: 50,
            seed: 42,
        }
    }
}

impl LdaConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn n_iterations(mut self, n: usize) -> Self {
        self.n_iterations = n;
        self
    }

    pub fn burn_in(mut self, n: usize) -> Self {
        self.burn_in = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_topics == 0 {
            return Err(Error::InvalidConfig("number of topics must be positive".into()));
        }
        if !(self.alpha > 0.0) || !(self.beta > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "alpha ({}) and beta ({}) must be positive",
                self.alpha, self.beta
            )));
        }
        if self.n_iterations == 0 {
            return Err(Error::InvalidConfig("LDA needs at least one iteration".into()));
        }
        Ok(())
    }
}

/// Topic model; one fit per call, no online update
#[derive(Debug, Clone)]
pub struct Lda {
    config: LdaConfig,
}

/// Sampler state: one topic per token plus the three count tables
struct GibbsState {
    /// (document, term) per token
    tokens: Vec<(u32, u32)>,
    assignment: Vec<u16>,
    doc_topic: Array2<u32>,
    topic_term: Array2<u32>,
    topic_total: Array1<u32>,
}

impl Lda {
    pub fn new(config: LdaConfig) -> Result<Self> {
        config.validate()?;
        if config.n_topics > u16::MAX as usize {
            return Err(Error::InvalidConfig(format!("{} topics is too many", config.n_topics)));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    fn init_state(&self, counts: &SparseMatrix<u32>, rng: &mut StdRng) -> GibbsState {
        let n_topics = self.config.n_topics;
        let n_tokens: usize = counts.rows().iter().map(|r| r.sum() as usize).sum();
        let mut state = GibbsState {
            tokens: Vec::with_capacity(n_tokens),
            assignment: Vec::with_capacity(n_tokens),
            doc_topic: Array2::zeros((counts.n_rows(), n_topics)),
            topic_term: Array2::zeros((n_topics, counts.n_cols())),
            topic_total: Array1::zeros(n_topics),
        };
        for (d, row) in counts.rows().iter().enumerate() {
            for (w, c) in row.iter() {
                for _ in 0..c {
                    let k = rng.gen_range(0..n_topics);
                    state.tokens.push((d as u32, w));
                    state.assignment.push(k as u16);
                    state.doc_topic[[d, k]] += 1;
                    state.topic_term[[k, w as usize]] += 1;
                    state.topic_total[k] += 1;
                }
            }
        }
        state
    }

    /// Fit on a count matrix
    ///
    /// # Arguments
    /// * `counts` - document-term counts
    ///
    /// # Returns
    /// * `FittedLda` - fails on a matrix with no tokens
    pub fn fit(&self, counts: &SparseMatrix<u32>) -> Result<FittedLda> {
        if counts.n_rows() == 0 || counts.n_cols() == 0 || counts.nnz() == 0 {
            return Err(Error::EmptyCorpus);
        }
        let LdaConfig {
            n_topics,
            alpha,
            beta,
            n_iterations,
            burn_in,
            seed,
        } = self.config;
        let n_terms = counts.n_cols();
        let beta_sum = beta * n_terms as f64;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = self.init_state(counts, &mut rng);
        let mut probs = vec![0.0f64; n_topics];
        let mut history = Vec::new();

        for iter in 0..n_iterations {
            for (i, &(d, w)) in state.tokens.iter().enumerate() {
                let (d, w) = (d as usize, w as usize);
                let old = state.assignment[i] as usize;
                state.doc_topic[[d, old]] -= 1;
                state.topic_term[[old, w]] -= 1;
                state.topic_total[old] -= 1;

                // the document-length denominator is constant across topics
                let mut total = 0.0;
                for (k, p) in probs.iter_mut().enumerate() {
                    *p = (state.doc_topic[[d, k]] as f64 + alpha)
                        * (state.topic_term[[k, w]] as f64 + beta)
                        / (state.topic_total[k] as f64 + beta_sum);
                    total += *p;
                }
                let threshold = rng.gen::<f64>() * total;
                let mut cumsum = 0.0;
                let mut new = n_topics - 1;
                for (k, &p) in probs.iter().enumerate() {
                    cumsum += p;
                    if cumsum >= threshold {
                        new = k;
                        break;
                    }
                }

                state.assignment[i] = new as u16;
                state.doc_topic[[d, new]] += 1;
                state.topic_term[[new, w]] += 1;
                state.topic_total[new] += 1;
            }

            if iter >= burn_in || iter + 1 == n_iterations {
                let ll = log_likelihood(&state, alpha, beta, beta_sum);
                history.push(ll);
                tracing::trace!(iter, ll, "gibbs sweep");
            }
        }

        let doc_topic = normalize_rows(&state.doc_topic, alpha);
        let topic_term = normalize_rows(&state.topic_term, beta);
        let perplexity = perplexity(counts, &doc_topic, &topic_term);
        tracing::info!(
            topics = n_topics,
            docs = counts.n_rows(),
            tokens = state.tokens.len(),
            log_likelihood = history.last().copied().unwrap_or(f64::NAN),
            perplexity,
            "LDA fitted"
        );
        Ok(FittedLda {
            doc_topic,
            topic_term,
            log_likelihood_history: history,
            perplexity,
            space: counts.space(),
        })
    }
}

/// Smoothed row distributions of a count table
fn normalize_rows(counts: &Array2<u32>, prior: f64) -> Array2<f64> {
    let mut out = counts.mapv(|c| c as f64 + prior);
    for mut row in out.axis_iter_mut(Axis(0)) {
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Log-likelihood of the current assignments under the smoothed estimates
fn log_likelihood(state: &GibbsState, alpha: f64, beta: f64, beta_sum: f64) -> f64 {
    let n_topics = state.topic_total.len() as f64;
    let mut ll = 0.0;
    for ((k, _), &count) in state.topic_term.indexed_iter() {
        if count > 0 {
            let p = (count as f64 + beta) / (state.topic_total[k] as f64 + beta_sum);
            ll += count as f64 * p.ln();
        }
    }
    for row in state.doc_topic.axis_iter(Axis(0)) {
        let doc_total = row.sum() as f64;
        for &count in row.iter() {
            if count > 0 {
                let p = (count as f64 + alpha) / (doc_total + n_topics * alpha);
                ll += count as f64 * p.ln();
            }
        }
    }
    ll
}

/// `exp(-Σ c_dw ln p(w|d) / N)` with `p(w|d) = Σ_k θ_dk φ_kw`
fn perplexity(counts: &SparseMatrix<u32>, doc_topic: &Array2<f64>, topic_term: &Array2<f64>) -> f64 {
    let mut ll = 0.0;
    let mut n = 0.0;
    for (d, row) in counts.rows().iter().enumerate() {
        let theta = doc_topic.row(d);
        for (w, c) in row.iter() {
            let p = theta.dot(&topic_term.column(w as usize));
            ll += c as f64 * p.ln();
            n += c as f64;
        }
    }
    (-ll / n).exp()
}

/// Fitted topic model
#[derive(Debug, Clone)]
pub struct FittedLda {
    doc_topic: Array2<f64>,
    topic_term: Array2<f64>,
    log_likelihood_history: Vec<f64>,
    perplexity: f64,
    space: FeatureSpace,
}

impl FittedLda {
    /// `[n_docs, n_topics]`, rows sum to one
    pub fn doc_topic(&self) -> &Array2<f64> {
        &self.doc_topic
    }

    /// `[n_topics, n_terms]`, rows sum to one
    pub fn topic_term(&self) -> &Array2<f64> {
        &self.topic_term
    }

    pub fn n_topics(&self) -> usize {
        self.topic_term.nrows()
    }

    pub fn log_likelihood_history(&self) -> &[f64] {
        &self.log_likelihood_history
    }

    /// Perplexity of the training matrix
    pub fn perplexity(&self) -> f64 {
        self.perplexity
    }

    /// Most probable topic of every document
    pub fn dominant_topics(&self) -> Vec<usize> {
        self.doc_topic
            .axis_iter(Axis(0))
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::MIN), |best, (k, &p)| if p > best.1 { (k, p) } else { best })
                    .0
            })
            .collect()
    }

    /// Mean document weight of each topic
    pub fn prevalence(&self) -> Vec<f64> {
        self.doc_topic
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_default()
    }

    /// `n` most probable terms of every topic
    ///
    /// # Arguments
    /// * `vocabulary` - the vocabulary that built the fitted matrix
    /// * `n` - terms per topic
    pub fn top_terms(&self, vocabulary: &Vocabulary, n: usize) -> Result<Vec<Vec<(String, f64)>>> {
        self.space.ensure_same(&vocabulary.space())?;
        Ok(self
            .topic_term
            .axis_iter(Axis(0))
            .map(|row| {
                let mut weights: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
                weights.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                weights
                    .into_iter()
                    .take(n)
                    .filter_map(|(w, p)| vocabulary.term(w).map(|t| (t.to_string(), p)))
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::count::CountVectorizer;
    use crate::vectorizer::{FittedVectorizer, TextVectorizer};

    fn docs() -> Vec<String> {
        let sea = ["whale", "ship", "harpoon", "ocean", "sail"];
        let ball = ["dance", "ball", "gown", "music", "waltz"];
        let mut docs = Vec::new();
        for i in 0..10 {
            let pick = |words: &[&str; 5]| {
                (0..20)
                    .map(|j| words[(i + j * 3) % 5])
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            docs.push(pick(&sea));
            docs.push(pick(&ball));
        }
        docs
    }

    #[test]
    fn separates_disjoint_vocabularies() {
        let docs = docs();
        let fitted = CountVectorizer::default().fit(&docs).unwrap();
        let counts = fitted.transform(&docs).unwrap();
        let lda = Lda::new(LdaConfig::new(2).n_iterations(100).burn_in(10).seed(7)).unwrap();
        let model = lda.fit(&counts).unwrap();

        let topics = model.dominant_topics();
        let sea_topic = topics[0];
        let ball_topic = topics[1];
        assert_ne!(sea_topic, ball_topic);
        for (i, &t) in topics.iter().enumerate() {
            assert_eq!(t, if i % 2 == 0 { sea_topic } else { ball_topic });
        }

        let top = model.top_terms(fitted.vocabulary(), 5).unwrap();
        assert!(top[sea_topic].iter().any(|(t, _)| t == "whale"));
        assert!(top[ball_topic].iter().any(|(t, _)| t == "waltz"));
    }

    #[test]
    fn distributions_are_normalised_and_fit_is_seeded() {
        let docs = docs();
        let counts = CountVectorizer::default().fit(&docs).unwrap().transform(&docs).unwrap();
        let lda = Lda::new(LdaConfig::new(3).n_iterations(20).burn_in(5)).unwrap();
        let a = lda.fit(&counts).unwrap();
        for row in a.doc_topic().axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        for row in a.topic_term().axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert_eq!(a.log_likelihood_history().len(), 15);
        assert!(a.perplexity() > 1.0);
        let b = lda.fit(&counts).unwrap();
        assert_eq!(a.doc_topic(), b.doc_topic());
    }

    #[test]
    fn rejects_empty_input_and_zero_topics() {
        assert!(Lda::new(LdaConfig::new(0)).is_err());
        let empty = SparseMatrix::<u32>::from_rows(vec![], FeatureSpace::new(0, 4)).unwrap();
        assert!(matches!(Lda::new(LdaConfig::new(2)).unwrap().fit(&empty), Err(Error::EmptyCorpus)));
    }
}
