pub mod phrases;
pub mod stats;

use std::collections::{HashMap, HashSet};

use ahash::{AHashSet, RandomState};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vectorizer::tokenizer::StopWords;

pub use self::phrases::PhraseSet;
pub use self::stats::{CollocationStats, PairCounts, PruneOutcome, PruneThresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollocationConfig {
    /// pairs seen fewer times are not candidates yet
    pub min_count: u64,
    /// optional floor on PMI for a pair to appear in the table
    pub min_pmi: Option<f64>,
    /// when set, only pairs of these words are counted
    pub vocabulary: Option<Vec<String>>,
    /// pairs touching a stopword are never counted
    pub stop_words: StopWords,
    /// joins the two halves of a compound token
    pub delimiter: String,
    /// label of the corpus the collocations are mined from
    pub label: u8,
    /// the mined documents are streamed through `partial_fit` in this many
    /// batches; pruning waits until every batch is counted
    pub batches: usize,
    /// refit and prune rounds run after the first prune, each counting the
    /// documents again with the collocations found so far merged
    pub refit_rounds: usize,
    pub prune: PruneThresholds,
    /// table rows kept in the report
    pub report_rows: usize,
}

impl Default for CollocationConfig {
    fn default() -> Self {
        Self {
            min_count: 5,
            min_pmi: None,
            vocabulary: None,
            stop_words: StopWords::English,
            delimiter: "_".to_string(),
            label: 0,
            batches: 4,
            refit_rounds: 1,
            prune: PruneThresholds {
                pmi: Some(4.0),
                gensim: Some(0.0),
                lfmd: Some(-32.0),
            },
            report_rows: 20,
        }
    }
}

impl CollocationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_count == 0 {
            return Err(Error::InvalidConfig("collocation min_count must be positive".into()));
        }
        if self.delimiter.is_empty() {
            return Err(Error::InvalidConfig("collocation delimiter must not be empty".into()));
        }
        if self.batches == 0 {
            return Err(Error::InvalidConfig("collocation batches must be positive".into()));
        }
        Ok(())
    }
}

/// Running statistics over adjacent word pairs.
///
/// The miner is an explicit accumulator owned by the caller: every
/// `partial_fit` adds to the existing counts, and `prune` removes
/// candidates for good. Pairs are only counted within a document.
///
/// `refit` starts the counts over with the current collocations folded
/// into compound tokens, so a later round can find `new_york city`.
#[derive(Debug, Clone)]
pub struct CollocationMiner {
    min_count: u64,
    min_pmi: Option<f64>,
    stop_words: Option<AHashSet<String>>,
    vocabulary: Option<AHashSet<String>>,
    /// unigram → count; the index doubles as the word id and survives `refit`
    unigrams: IndexMap<Box<str>, u64, RandomState>,
    /// unigrams with a nonzero count
    distinct: u64,
    pairs: HashMap<(u32, u32), u64, RandomState>,
    pruned: HashSet<(u32, u32), RandomState>,
    total_tokens: u64,
    /// collocations accepted by earlier rounds, merged before counting
    learned: PhraseSet,
}

impl CollocationMiner {
    pub fn new(config: &CollocationConfig) -> Result<Self> {
        config.validate()?;
        let stop_words = match &config.stop_words {
            StopWords::None => None,
            StopWords::English => Some(
                stop_words::get(stop_words::LANGUAGE::English)
                    .into_iter()
                    .map(|w| w.to_lowercase())
                    .collect(),
            ),
            StopWords::Custom(words) => Some(words.iter().map(|w| w.to_lowercase()).collect()),
        };
        Ok(Self {
            min_count: config.min_count,
            min_pmi: config.min_pmi,
            stop_words,
            vocabulary: config
                .vocabulary
                .as_ref()
                .map(|v| v.iter().cloned().collect()),
            unigrams: IndexMap::default(),
            distinct: 0,
            pairs: HashMap::default(),
            pruned: HashSet::default(),
            total_tokens: 0,
            learned: PhraseSet::new(&config.delimiter),
        })
    }

    /// Fresh miner fitted on `docs`
    pub fn fit<D, S>(config: &CollocationConfig, docs: &[D]) -> Result<Self>
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut miner = Self::new(config)?;
        miner.partial_fit(docs);
        Ok(miner)
    }

    /// Mine `docs` end to end.
    ///
    /// The documents are streamed through `partial_fit` in `config.batches`
    /// chunks and pruned once all of them are counted. Each of the
    /// `config.refit_rounds` rounds then refits on the same documents and
    /// prunes again. The outcome of every prune is returned in order.
    pub fn mine<D, S>(config: &CollocationConfig, docs: &[D]) -> Result<(Self, Vec<PruneOutcome>)>
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut miner = Self::new(config)?;
        let batch = docs.len().div_ceil(config.batches).max(1);
        for chunk in docs.chunks(batch) {
            miner.partial_fit(chunk);
        }
        let mut rounds = Vec::with_capacity(config.refit_rounds + 1);
        rounds.push(miner.prune(&config.prune));
        for round in 0..config.refit_rounds {
            miner.refit(docs);
            rounds.push(miner.prune(&config.prune));
            tracing::debug!(round, pairs = miner.n_pairs(), learned = miner.learned.len(), "collocation refit");
        }
        Ok((miner, rounds))
    }

    /// Compounds are pairable whenever a vocabulary is set
    #[inline]
    fn pairable(&self, word: &str) -> bool {
        self.stop_words.as_ref().map_or(true, |s| !s.contains(word))
            && self
                .vocabulary
                .as_ref()
                .map_or(true, |v| v.contains(word) || self.learned.is_compound(word))
    }

    fn intern(&mut self, word: &str) -> u32 {
        if let Some((id, _, count)) = self.unigrams.get_full_mut(word) {
            if *count == 0 {
                self.distinct += 1;
            }
            *count += 1;
            return id as u32;
        }
        let (id, _) = self.unigrams.insert_full(Box::from(word), 1);
        self.distinct += 1;
        id as u32
    }

    /// Count one document; returns the number of pairs seen for the first time
    fn count_document<'a>(&mut self, words: impl IntoIterator<Item = &'a str>) -> usize {
        let mut new_pairs = 0;
        let mut prev: Option<u32> = None;
        for word in words {
            let pairable = self.pairable(word);
            let id = self.intern(word);
            self.total_tokens += 1;
            if let (Some(left), true) = (prev, pairable) {
                if !self.pruned.contains(&(left, id)) {
                    let count = self.pairs.entry((left, id)).or_insert(0);
                    if *count == 0 {
                        new_pairs += 1;
                    }
                    *count += 1;
                }
            }
            prev = pairable.then_some(id);
        }
        new_pairs
    }

    /// Add the unigram and adjacent-pair counts of `docs` to the running
    /// totals. Each inner slice is one tokenized document.
    ///
    /// Collocations accepted before the last `refit` are merged into
    /// compound tokens first; counting is otherwise order independent.
    pub fn partial_fit<D, S>(&mut self, docs: &[D])
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut new_pairs = 0usize;
        for doc in docs {
            let tokens = doc.as_ref();
            new_pairs += if self.learned.is_empty() {
                self.count_document(tokens.iter().map(|t| t.as_ref()))
            } else {
                let merged = self
                    .learned
                    .merge(tokens.iter().map(|t| t.as_ref().to_string()).collect());
                self.count_document(merged.iter().map(String::as_str))
            };
        }
        tracing::debug!(
            docs = docs.len(),
            new_pairs,
            pairs = self.pairs.len(),
            tokens = self.total_tokens,
            "collocation partial fit"
        );
    }

    /// Forget every count and count `docs` again with the current
    /// collocations merged into compound tokens. Pruned pairs stay excluded.
    pub fn refit<D, S>(&mut self, docs: &[D])
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.learned = self.phrases();
        self.unigrams.values_mut().for_each(|c| *c = 0);
        self.distinct = 0;
        self.pairs.clear();
        self.total_tokens = 0;
        self.partial_fit(docs);
    }

    fn counts(&self, left: u32, right: u32, pair: u64) -> PairCounts {
        let unigram = |id: u32| self.unigrams.get_index(id as usize).map_or(0, |(_, &c)| c);
        PairCounts {
            pair,
            left: unigram(left),
            right: unigram(right),
            total: self.total_tokens,
            vocab_size: self.distinct,
        }
    }

    #[inline]
    fn is_candidate(&self, counts: &PairCounts) -> bool {
        counts.pair >= self.min_count && self.min_pmi.map_or(true, |t| counts.pmi() >= t)
    }

    fn word(&self, id: u32) -> &str {
        self.unigrams
            .get_index(id as usize)
            .map_or("", |(w, _)| w.as_ref())
    }

    /// Candidate ids with their statistics, unordered
    fn candidates(&self) -> Vec<((u32, u32), CollocationStats)> {
        self.pairs
            .iter()
            .filter_map(|(&(l, r), &c)| {
                let counts = self.counts(l, r, c);
                self.is_candidate(&counts).then(|| {
                    (
                        (l, r),
                        CollocationStats::new(self.word(l), self.word(r), &counts, self.min_count),
                    )
                })
            })
            .collect()
    }

    /// Current collocation table.
    ///
    /// Rows are the pairs seen at least `min_count` times (and meeting
    /// `min_pmi` when set), ordered by PMI descending, then count
    /// descending, then the pair itself.
    pub fn table(&self) -> Vec<CollocationStats> {
        let mut rows: Vec<CollocationStats> =
            self.candidates().into_iter().map(|(_, row)| row).collect();
        rows.sort_by(|a, b| {
            b.pmi
                .total_cmp(&a.pmi)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.left.cmp(&b.left))
                .then_with(|| a.right.cmp(&b.right))
        });
        rows
    }

    /// Delete every table row failing any threshold.
    ///
    /// Deleted pairs are never counted again, even by later `partial_fit`
    /// calls. Pairs still below `min_count` are not candidates and are kept.
    pub fn prune(&mut self, thresholds: &PruneThresholds) -> PruneOutcome {
        let candidates = self.candidates();
        let before = candidates.len();
        let mut removed = 0;
        for (key, row) in candidates {
            if !thresholds.accepts(&row) {
                self.pairs.remove(&key);
                self.pruned.insert(key);
                removed += 1;
            }
        }
        let outcome = PruneOutcome {
            before,
            removed,
            after: before - removed,
        };
        tracing::info!(
            before = outcome.before,
            removed = outcome.removed,
            after = outcome.after,
            "collocation table pruned"
        );
        outcome
    }

    /// Frozen set of the collocations learned by earlier rounds plus the
    /// current table's pairs
    pub fn phrases(&self) -> PhraseSet {
        let mut set = self.learned.clone();
        for (_, row) in self.candidates() {
            set.insert(&row.left, &row.right);
        }
        set
    }

    /// Merge adjacent tokens forming a surviving collocation into one
    /// compound token
    pub fn transform<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        self.phrases()
            .merge(tokens.iter().map(|t| t.as_ref().to_string()).collect())
    }

    /// Occurrences of the adjacent pair; zero once pruned
    pub fn pair_count(&self, left: &str, right: &str) -> u64 {
        match (self.unigrams.get_index_of(left), self.unigrams.get_index_of(right)) {
            (Some(l), Some(r)) => self.pairs.get(&(l as u32, r as u32)).copied().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn is_pruned(&self, left: &str, right: &str) -> bool {
        match (self.unigrams.get_index_of(left), self.unigrams.get_index_of(right)) {
            (Some(l), Some(r)) => self.pruned.contains(&(l as u32, r as u32)),
            _ => false,
        }
    }

    pub fn unigram_count(&self, word: &str) -> u64 {
        self.unigrams.get(word).copied().unwrap_or(0)
    }

    #[inline]
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Distinct pairs counted so far, candidates or not
    #[inline]
    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(docs: &[&str]) -> Vec<Vec<String>> {
        docs.iter()
            .map(|d| d.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn config(min_count: u64) -> CollocationConfig {
        CollocationConfig {
            min_count,
            stop_words: StopWords::None,
            ..Default::default()
        }
    }

    const CHUNK_A: [&str; 3] = [
        "new york is big",
        "she moved to new york",
        "old york is small",
    ];
    const CHUNK_B: [&str; 3] = [
        "new york new york",
        "big apple in new york",
        "the big apple",
    ];

    #[test]
    fn partial_fit_accumulates_like_one_fit() {
        let mut chunked = CollocationMiner::new(&config(1)).unwrap();
        chunked.partial_fit(&tokens(&CHUNK_A));
        chunked.partial_fit(&tokens(&CHUNK_B));

        let all: Vec<&str> = CHUNK_A.iter().chain(CHUNK_B.iter()).copied().collect();
        let once = CollocationMiner::fit(&config(1), &tokens(&all)).unwrap();

        assert_eq!(chunked.pair_count("new", "york"), 5);
        assert_eq!(chunked.total_tokens(), once.total_tokens());
        assert_eq!(chunked.table(), once.table());
        assert_eq!(chunked.n_pairs(), once.n_pairs());
    }

    #[test]
    fn pairs_do_not_cross_documents() {
        let miner = CollocationMiner::fit(&config(1), &tokens(&["a b", "c d"])).unwrap();
        assert_eq!(miner.pair_count("b", "c"), 0);
        assert_eq!(miner.pair_count("a", "b"), 1);
    }

    #[test]
    fn table_respects_min_count_and_order() {
        let all: Vec<&str> = CHUNK_A.iter().chain(CHUNK_B.iter()).copied().collect();
        let miner = CollocationMiner::fit(&config(2), &tokens(&all)).unwrap();
        let table = miner.table();
        assert!(table.iter().all(|r| r.count >= 2));
        assert!(table.windows(2).all(|w| w[0].pmi >= w[1].pmi));
        assert!(table.iter().any(|r| r.left == "new" && r.right == "york"));
    }

    #[test]
    fn prune_is_monotonic_and_idempotent() {
        let all: Vec<&str> = CHUNK_A.iter().chain(CHUNK_B.iter()).copied().collect();
        let mut miner = CollocationMiner::fit(&config(1), &tokens(&all)).unwrap();
        let thresholds = PruneThresholds {
            pmi: Some(2.0),
            gensim: Some(0.0),
            lfmd: Some(-20.0),
        };
        let first = miner.prune(&thresholds);
        assert!(first.removed > 0);
        assert!(miner.table().iter().all(|r| thresholds.accepts(r)));

        let table = miner.table();
        let second = miner.prune(&thresholds);
        assert_eq!(second.removed, 0);
        assert_eq!(second.before, first.after);
        assert_eq!(miner.table(), table);
    }

    #[test]
    fn pruned_pairs_stay_excluded() {
        let mut miner = CollocationMiner::fit(&config(1), &tokens(&["york is", "york is"])).unwrap();
        miner.prune(&PruneThresholds {
            pmi: Some(100.0),
            ..Default::default()
        });
        assert!(miner.is_pruned("york", "is"));
        miner.partial_fit(&tokens(&["york is", "york is"]));
        assert_eq!(miner.pair_count("york", "is"), 0);
        assert_eq!(miner.unigram_count("york"), 4);
    }

    #[test]
    fn stop_words_never_pair() {
        let cfg = CollocationConfig {
            min_count: 1,
            stop_words: StopWords::Custom(vec!["the".into()]),
            ..Default::default()
        };
        let miner = CollocationMiner::fit(&cfg, &tokens(&["the big apple", "the big apple"])).unwrap();
        assert_eq!(miner.pair_count("the", "big"), 0);
        assert_eq!(miner.pair_count("big", "apple"), 2);
        assert_eq!(miner.unigram_count("the"), 2);
    }

    /// `red fox` looks weak in the first batch alone and strong overall
    fn red_fox_batches() -> (Vec<Vec<String>>, Vec<Vec<String>>) {
        let first = tokens(&["red fox red fox red red red fox fox fox", "red fox"]);
        let mut second = tokens(&["red fox"; 20]);
        for i in 0..16 {
            second.push((0..10).map(|j| format!("w{}", i * 10 + j)).collect());
        }
        (first, second)
    }

    fn red_fox_config(batches: usize) -> CollocationConfig {
        CollocationConfig {
            min_count: 2,
            stop_words: StopWords::None,
            batches,
            prune: PruneThresholds {
                pmi: Some(1.0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn batched_mining_prunes_only_after_every_batch() {
        let (first, second) = red_fox_batches();
        let mut early = CollocationMiner::fit(&red_fox_config(1), &first).unwrap();
        early.prune(&red_fox_config(1).prune);
        assert!(early.is_pruned("red", "fox"));

        let all: Vec<Vec<String>> = first.into_iter().chain(second).collect();
        let (batched, batched_rounds) = CollocationMiner::mine(&red_fox_config(2), &all).unwrap();
        let (single, single_rounds) = CollocationMiner::mine(&red_fox_config(1), &all).unwrap();

        assert!(!batched.is_pruned("red", "fox"));
        assert_eq!(batched.table(), single.table());
        assert_eq!(batched_rounds, single_rounds);
        assert_eq!(batched.phrases().sorted_pairs(), single.phrases().sorted_pairs());
        assert!(batched.phrases().contains("red", "fox"));
    }

    #[test]
    fn refit_counts_merged_compounds() {
        let mut docs = tokens(&["new york"; 4]);
        docs.extend(tokens(&["new york city"; 4]));
        docs.extend(tokens(&["city hall"; 6]));
        let thresholds = PruneThresholds {
            pmi: Some(1.8),
            ..Default::default()
        };

        let mut miner = CollocationMiner::fit(&config(2), &docs).unwrap();
        let outcome = miner.prune(&thresholds);
        assert_eq!(outcome.after, 1);
        assert!(miner.is_pruned("york", "city"));
        assert!(miner.is_pruned("city", "hall"));

        miner.refit(&docs);
        assert_eq!(miner.total_tokens(), 24);
        assert_eq!(miner.unigram_count("new_york"), 8);
        assert_eq!(miner.unigram_count("new"), 0);
        assert_eq!(miner.pair_count("new_york", "city"), 4);
        assert_eq!(miner.pair_count("new", "york"), 0);
        assert_eq!(miner.pair_count("city", "hall"), 0);
        assert!(miner.phrases().contains("new", "york"));
        assert!(miner.phrases().contains("new_york", "city"));
        assert_eq!(miner.transform(&["new", "york", "city"]), vec!["new_york_city".to_string()]);
    }

    #[test]
    fn mine_reports_one_prune_per_round() {
        let (first, second) = red_fox_batches();
        let all: Vec<Vec<String>> = first.into_iter().chain(second).collect();
        let config = CollocationConfig {
            refit_rounds: 3,
            ..red_fox_config(4)
        };
        let (_, rounds) = CollocationMiner::mine(&config, &all).unwrap();
        assert_eq!(rounds.len(), 4);
    }

    #[test]
    fn transform_merges_only_surviving_pairs() {
        let all: Vec<&str> = CHUNK_A.iter().chain(CHUNK_B.iter()).copied().collect();
        let miner = CollocationMiner::fit(&config(3), &tokens(&all)).unwrap();
        let merged = miner.transform(&["i", "love", "new", "york", "and", "big", "apple"]);
        assert!(merged.contains(&"new_york".to_string()));
        // "big apple" occurs only twice
        assert!(merged.contains(&"big".to_string()));
        assert!(merged.contains(&"apple".to_string()));
    }
}
