use std::collections::HashMap;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

/// TermFrequency struct
/// Counts how many times each term occurs in one document
/// (or, merged, in a whole document set).
///
/// # Examples
/// ```
/// use authorship_analyzer::vectorizer::term::TermFrequency;
/// let mut term_freq = TermFrequency::new();
/// term_freq.add_term("term1");
/// term_freq.add_term("term2");
/// term_freq.add_term("term1");
///
/// assert_eq!(term_freq.term_count("term1"), 2);
/// assert_eq!(term_freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    term_count: HashMap<String, u64, RandomState>,
    total_term_count: u64,
}

/// Adding terms
impl TermFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += 1;
        } else {
            self.term_count.insert(term.to_string(), 1);
        }
        self.total_term_count += 1;
        self
    }

    /// Add multiple terms
    ///
    /// # Arguments
    /// * `terms` - Slice of terms to add
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    /// Merge with another TermFrequency
    ///
    /// # Arguments
    /// * `other` - Another TermFrequency to merge with
    pub fn add_terms_from_freq(&mut self, other: &TermFrequency) -> &mut Self {
        for (term, &count) in &other.term_count {
            *self.term_count.entry(term.clone()).or_insert(0) += count;
            self.total_term_count += count;
        }
        self
    }
}

impl<T> From<&[T]> for TermFrequency
where
    T: AsRef<str>,
{
    fn from(terms: &[T]) -> Self {
        let mut tf = TermFrequency::new();
        tf.add_terms(terms);
        tf
    }
}

/// Retrieving information
impl TermFrequency {
    /// Iterator over all terms and their counts, in no particular order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count
            .iter()
            .map(|(term, &count)| (term.as_str(), count))
    }

    /// Total count of all terms
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Occurrence count for a specific term
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_counts() {
        let mut a = TermFrequency::from(&["x", "y", "x"][..]);
        let b = TermFrequency::from(&["x", "z"][..]);
        a.add_terms_from_freq(&b);
        assert_eq!(a.term_count("x"), 3);
        assert_eq!(a.term_count("z"), 1);
        assert_eq!(a.term_sum(), 5);
        assert_eq!(a.iter().count(), 3);
    }
}
