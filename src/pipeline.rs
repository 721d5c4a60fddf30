use std::fmt;

use serde::Serialize;

use crate::classifier::metrics::{accuracy, roc_auc, roc_curve, RocCurve};
use crate::classifier::{LogisticRegressionCv, PathPoint};
use crate::collocation::{CollocationMiner, CollocationStats, PruneOutcome};
use crate::config::PipelineConfig;
use crate::corpus::{clean, load_corpus, split, CorpusSource, DocumentTable, Label, TrainTest};
use crate::error::{Error, Result};
use crate::topic::Lda;
use crate::vectorizer::count::CountVectorizer;
use crate::vectorizer::tokenizer::{StopWords, Tokenizer};
use crate::vectorizer::{FittedVectorizer, TextVectorizer};

/// Features listed per strategy in the report
const TOP_FEATURES: usize = 10;
/// Vocabulary terms listed in the report
const TOP_TERMS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Count,
    Hashing,
    Tfidf,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Count => "count",
            Strategy::Hashing => "hashing",
            Strategy::Tfidf => "tfidf",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub label: u8,
    pub title: String,
    pub documents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub sources: Vec<SourceSummary>,
    pub raw_documents: usize,
    pub cleaned_documents: usize,
    pub train: usize,
    pub test: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VocabularySummary {
    pub size: usize,
    pub top_terms: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub n_features: usize,
    pub best_c: f64,
    pub cv_auc: f64,
    pub test_auc: f64,
    pub test_accuracy: f64,
    pub nnz_coef: usize,
    pub converged: bool,
    pub iterations: usize,
    pub path: Vec<PathPoint>,
    /// ROC points of the test scores
    pub roc: RocCurve,
    /// heaviest coefficients; positive weights point to label 1
    pub top_features: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollocationReport {
    pub label: u8,
    pub documents: usize,
    pub tokens: u64,
    pub prune_rounds: Vec<PruneOutcome>,
    pub phrases: usize,
    pub table: Vec<CollocationStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub topic: usize,
    pub prevalence: f64,
    /// documents whose most probable topic this is
    pub documents: usize,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub n_topics: usize,
    pub vocabulary: usize,
    pub log_likelihood: f64,
    pub perplexity: f64,
    pub topics: Vec<TopicSummary>,
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub corpus: CorpusSummary,
    pub vocabulary: VocabularySummary,
    pub strategies: Vec<StrategyReport>,
    pub collocations: CollocationReport,
    pub topics: TopicReport,
}

/// Batch pipeline: load, clean, split, classify with each vectorization
/// strategy, mine collocations, then fit a topic model over the
/// collocation-aware counts.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, source: &dyn CorpusSource) -> Result<PipelineReport> {
        let config = &self.config;
        let raw = load_corpus(source, &config.corpus.ids)?;
        let raw_documents = raw.len();
        let cleaned = clean(raw);
        if cleaned.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let counts = cleaned.label_counts();
        let sources = cleaned
            .titles()
            .into_iter()
            .map(|(label, title)| SourceSummary {
                label: label.0,
                title: title.to_string(),
                documents: counts.get(label.0 as usize).copied().unwrap_or(0),
            })
            .collect();

        let TrainTest { train, test } = split(cleaned.clone(), &config.split)?;
        let train_texts = train.texts();
        let test_texts = test.texts();
        let y_train = train.labels();
        let y_test = test.labels();
        let cv = LogisticRegressionCv::from_config(&config.classifier)?;
        let data = Split {
            train: &train_texts,
            test: &test_texts,
            y_train: &y_train,
            y_test: &y_test,
        };

        let fitted_count = config.vectorizer.count()?.fit(&train_texts)?;
        let vocabulary = fitted_count.vocabulary();
        tracing::info!(terms = vocabulary.len(), "training vocabulary built");
        let vocabulary = VocabularySummary {
            size: vocabulary.len(),
            top_terms: vocabulary
                .most_frequent(TOP_TERMS)
                .into_iter()
                .map(|(t, f)| (t.to_string(), f))
                .collect(),
        };

        let strategies = vec![
            evaluate(Strategy::Count, &fitted_count, &cv, &data)?,
            evaluate(
                Strategy::Hashing,
                &config.vectorizer.hashing()?.fit(&train_texts)?,
                &cv,
                &data,
            )?,
            evaluate(
                Strategy::Tfidf,
                &config.vectorizer.tfidf()?.fit(&train_texts)?,
                &cv,
                &data,
            )?,
        ];

        let (collocations, miner) = self.mine_collocations(&cleaned)?;

        // topic model over the whole cleaned corpus, collocations merged
        let all_texts = cleaned.texts();
        let tokenizer = Tokenizer::from_config(&config.vectorizer.tokenizer)?.with_phrases(miner.phrases());
        let phrase_counts = CountVectorizer::new(tokenizer, config.vectorizer.limits).fit(&all_texts)?;
        let matrix = phrase_counts.transform(&all_texts)?;
        let lda = Lda::new(config.topic.lda.clone())?.fit(&matrix)?;
        let prevalence = lda.prevalence();
        let mut dominant = vec![0usize; lda.n_topics()];
        for topic in lda.dominant_topics() {
            dominant[topic] += 1;
        }
        let topics = lda
            .top_terms(phrase_counts.vocabulary(), config.topic.top_terms)?
            .into_iter()
            .enumerate()
            .map(|(topic, terms)| TopicSummary {
                topic,
                prevalence: prevalence.get(topic).copied().unwrap_or(0.0),
                documents: dominant.get(topic).copied().unwrap_or(0),
                terms: terms.into_iter().map(|(t, _)| t).collect(),
            })
            .collect();
        let topics = TopicReport {
            n_topics: lda.n_topics(),
            vocabulary: phrase_counts.vocabulary().len(),
            log_likelihood: lda.log_likelihood_history().last().copied().unwrap_or(f64::NAN),
            perplexity: lda.perplexity(),
            topics,
        };

        Ok(PipelineReport {
            corpus: CorpusSummary {
                sources,
                raw_documents,
                cleaned_documents: cleaned.len(),
                train: train.len(),
                test: test.len(),
            },
            vocabulary,
            strategies,
            collocations,
            topics,
        })
    }

    /// Mine one corpus: batched counting, one prune, then refit rounds.
    ///
    /// Stop words stay in the token stream so pairs never bridge a removed
    /// word; the miner decides which words may pair.
    fn mine_collocations(&self, cleaned: &DocumentTable) -> Result<(CollocationReport, CollocationMiner)> {
        let config = &self.config.collocation;
        let tokenizer =
            Tokenizer::from_config(&self.config.vectorizer.tokenizer)?.with_stop_words(&StopWords::None);
        let docs: Vec<Vec<String>> = cleaned
            .with_label(Label(config.label))
            .map(|d| tokenizer.words(d.text()))
            .collect();

        let (miner, prune_rounds) = CollocationMiner::mine(config, &docs)?;

        let mut table = miner.table();
        let phrases = miner.phrases().len();
        table.truncate(config.report_rows);
        tracing::info!(label = config.label, phrases, tokens = miner.total_tokens(), "collocations mined");
        Ok((
            CollocationReport {
                label: config.label,
                documents: docs.len(),
                tokens: miner.total_tokens(),
                prune_rounds,
                phrases,
                table,
            },
            miner,
        ))
    }
}

struct Split<'a> {
    train: &'a [&'a str],
    test: &'a [&'a str],
    y_train: &'a [u8],
    y_test: &'a [u8],
}

/// Transform both sets with one fitted vectorizer, cross-validate on train,
/// score on test
fn evaluate<F: FittedVectorizer>(
    strategy: Strategy,
    fitted: &F,
    cv: &LogisticRegressionCv,
    data: &Split<'_>,
) -> Result<StrategyReport> {
    let x_train = fitted.transform(data.train)?;
    let x_test = fitted.transform(data.test)?;
    let result = cv.fit(&x_train, data.y_train)?;
    let model = &result.model;

    let scores = model.decision_function(&x_test)?;
    let test_auc = roc_auc(data.y_test, &scores)?;
    let roc = roc_curve(data.y_test, &scores)?;
    let test_accuracy = accuracy(data.y_test, &model.predict(&x_test)?)?;
    let convergence = model.convergence();
    tracing::info!(
        %strategy,
        features = x_train.n_cols(),
        best_c = result.best_c,
        cv_auc = result.best_auc,
        test_auc,
        nnz = model.nnz(),
        "strategy evaluated"
    );

    Ok(StrategyReport {
        strategy,
        n_features: x_train.n_cols(),
        best_c: result.best_c,
        cv_auc: result.best_auc,
        test_auc,
        test_accuracy,
        nnz_coef: model.nnz(),
        converged: convergence.converged,
        iterations: convergence.iterations,
        top_features: model
            .nonzero_terms()
            .into_iter()
            .take(TOP_FEATURES)
            .map(|(col, w)| (fitted.feature_name(col).unwrap_or_default(), w))
            .collect(),
        path: result.path,
        roc,
    })
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== corpus ==")?;
        for s in &self.corpus.sources {
            writeln!(f, "  [{}] {} ({} documents)", s.label, s.title, s.documents)?;
        }
        writeln!(
            f,
            "  raw {} / cleaned {} / train {} / test {}",
            self.corpus.raw_documents, self.corpus.cleaned_documents, self.corpus.train, self.corpus.test
        )?;

        writeln!(f, "\n== vocabulary ({} terms) ==", self.vocabulary.size)?;
        let terms: Vec<String> = self
            .vocabulary
            .top_terms
            .iter()
            .map(|(t, c)| format!("{t}:{c}"))
            .collect();
        writeln!(f, "  {}", terms.join(" "))?;

        writeln!(f, "\n== classification ==")?;
        writeln!(
            f,
            "  {:<8} {:>8} {:>10} {:>7} {:>8} {:>8} {:>6} {:>9}",
            "strategy", "features", "best C", "cv AUC", "test AUC", "accuracy", "nnz", "converged"
        )?;
        for s in &self.strategies {
            writeln!(
                f,
                "  {:<8} {:>8} {:>10.3e} {:>7.4} {:>8.4} {:>8.4} {:>6} {:>9}",
                s.strategy, s.n_features, s.best_c, s.cv_auc, s.test_auc, s.test_accuracy, s.nnz_coef, s.converged
            )?;
        }
        for s in &self.strategies {
            writeln!(f, "  {} path:", s.strategy)?;
            for p in &s.path {
                writeln!(f, "    C={:<10.3e} AUC={:.4} nnz={}", p.c, p.mean_auc, p.nnz)?;
            }
        }

        let c = &self.collocations;
        writeln!(
            f,
            "\n== collocations (label {}, {} documents, {} tokens, {} phrases) ==",
            c.label, c.documents, c.tokens, c.phrases
        )?;
        writeln!(f, "  {:<32} {:>8} {:>10} {:>9} {:>7}", "pair", "pmi", "gensim", "lfmd", "count")?;
        for row in &c.table {
            writeln!(f, "  {row}")?;
        }

        let t = &self.topics;
        writeln!(
            f,
            "\n== topics ({} topics, {} terms, perplexity {:.1}) ==",
            t.n_topics, t.vocabulary, t.perplexity
        )?;
        for topic in &t.topics {
            writeln!(
                f,
                "  #{:<2} {:>5.3} {:>6} {}",
                topic.topic,
                topic.prevalence,
                topic.documents,
                topic.terms.join(", ")
            )?;
        }
        Ok(())
    }
}
