use std::collections::{HashMap, HashSet};
use std::hash::Hasher;

use ahash::RandomState;
use twox_hash::XxHash64;

/// Frozen set of collocations used to merge adjacent words into compound
/// tokens. Stored as left word → right words.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhraseSet {
    pairs: HashMap<String, HashSet<String, RandomState>, RandomState>,
    /// every token `merge` can produce
    compounds: HashSet<String, RandomState>,
    delimiter: String,
    len: usize,
}

impl PhraseSet {
    pub fn new(delimiter: &str) -> Self {
        Self {
            pairs: HashMap::default(),
            compounds: HashSet::default(),
            delimiter: delimiter.to_string(),
            len: 0,
        }
    }

    pub fn insert(&mut self, left: &str, right: &str) -> bool {
        let added = self
            .pairs
            .entry(left.to_string())
            .or_default()
            .insert(right.to_string());
        if added {
            self.compounds.insert(format!("{left}{}{right}", self.delimiter));
            self.len += 1;
        }
        added
    }

    #[inline]
    pub fn contains(&self, left: &str, right: &str) -> bool {
        self.pairs
            .get(left)
            .map_or(false, |rights| rights.contains(right))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `token` is a compound `merge` can emit
    #[inline]
    pub fn is_compound(&self, token: &str) -> bool {
        self.compounds.contains(token)
    }

    /// Greedy left-to-right merge: whenever `words[i], words[i + 1]` is a
    /// known pair, emit `left{delimiter}right` and skip both words.
    ///
    /// A merged token keeps absorbing the next word while the pair is known,
    /// so `new_york` + `city` becomes `new_york_city` when both
    /// `(new, york)` and `(new_york, city)` are in the set.
    pub fn merge(&self, words: Vec<String>) -> Vec<String> {
        if self.is_empty() || words.len() < 2 {
            return words;
        }
        let mut out = Vec::with_capacity(words.len());
        let mut iter = words.into_iter().peekable();
        while let Some(mut current) = iter.next() {
            while let Some(next) = iter.next_if(|next| self.contains(&current, next)) {
                current.push_str(&self.delimiter);
                current.push_str(&next);
            }
            out.push(current);
        }
        out
    }

    /// Sorted `(left, right)` pairs
    pub fn sorted_pairs(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .pairs
            .iter()
            .flat_map(|(l, rs)| rs.iter().map(move |r| (l.as_str(), r.as_str())))
            .collect();
        out.sort_unstable();
        out
    }

    pub(crate) fn fingerprint(&self, hasher: &mut XxHash64) {
        hasher.write(self.delimiter.as_bytes());
        hasher.write_u8(0);
        for (left, right) in self.sorted_pairs() {
            hasher.write(left.as_bytes());
            hasher.write_u8(0);
            hasher.write(right.as_bytes());
            hasher.write_u8(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn merges_greedily_left_to_right() {
        let mut set = PhraseSet::new("_");
        set.insert("new", "york");
        set.insert("york", "city");
        assert_eq!(
            set.merge(words("in new york city today")),
            words("in new_york city today")
        );
        assert_eq!(set.merge(words("york city")), words("york_city"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn compounds_keep_growing() {
        let mut set = PhraseSet::new("_");
        set.insert("new", "york");
        set.insert("new_york", "city");
        assert_eq!(
            set.merge(words("we saw new york city lights")),
            words("we saw new_york_city lights")
        );
        assert!(set.is_compound("new_york"));
        assert!(set.is_compound("new_york_city"));
        assert!(!set.is_compound("york_city"));
    }

    #[test]
    fn unknown_pairs_and_order_are_left_alone() {
        let mut set = PhraseSet::new("_");
        set.insert("new", "york");
        assert_eq!(set.merge(words("york new")), words("york new"));
        assert!(!set.insert("new", "york"));
    }
}
