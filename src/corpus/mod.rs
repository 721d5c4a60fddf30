pub mod source;
pub mod split;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use self::source::{CorpusSource, DirectorySource, GutenbergSource, MemorySource, RawText};
pub use self::split::{split, SplitConfig, SplitStrategy, TrainTest};

/// Source label: position of the corpus id in the configured id list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitRole {
    Train,
    Test,
}

/// One row of source text
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// row position in the combined table
    pub id: usize,
    pub text: Option<String>,
    pub label: Label,
    pub title: Arc<str>,
    /// set by `split`
    pub split: Option<SplitRole>,
}

impl Document {
    /// Text, or `""` when missing
    #[inline]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTable {
    documents: Vec<Document>,
}

impl DocumentTable {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(Document::text).collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.documents.iter().map(|d| d.label.0).collect()
    }

    /// Documents carrying `label`
    pub fn with_label(&self, label: Label) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(move |d| d.label == label)
    }

    /// Distinct `(label, title)` pairs in label order
    pub fn titles(&self) -> Vec<(Label, Arc<str>)> {
        let mut titles: Vec<(Label, Arc<str>)> = Vec::new();
        for doc in &self.documents {
            if !titles.iter().any(|(l, _)| *l == doc.label) {
                titles.push((doc.label, doc.title.clone()));
            }
        }
        titles.sort_by_key(|(l, _)| *l);
        titles
    }

    /// Documents per label, indexed by label
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        for doc in &self.documents {
            let l = doc.label.0 as usize;
            if counts.len() <= l {
                counts.resize(l + 1, 0);
            }
            counts[l] += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// corpus ids; the first gets label 0, the second label 1
    pub ids: Vec<u32>,
    /// download url, `{id}` is replaced by the corpus id
    pub url_template: String,
    /// read `<dir>/<id>.txt` instead of downloading
    pub dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            // Pride and Prejudice, Frankenstein
            ids: vec![1342, 84],
            url_template: "https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt".to_string(),
            dir: None,
            timeout_secs: 60,
        }
    }
}

impl CorpusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ids.len() != 2 || self.ids[0] == self.ids[1] {
            return Err(Error::InvalidConfig(format!(
                "exactly two distinct corpus ids are needed, got {:?}",
                self.ids
            )));
        }
        if !self.url_template.contains("{id}") {
            return Err(Error::InvalidConfig("url_template must contain {id}".into()));
        }
        Ok(())
    }
}

/// Fetch every id in order and combine them into one table.
///
/// Each body line becomes one document labelled with the position of its
/// id. Any source failure aborts the whole load.
pub fn load_corpus(source: &dyn CorpusSource, ids: &[u32]) -> Result<DocumentTable> {
    if ids.len() > u8::MAX as usize + 1 {
        return Err(Error::InvalidConfig(format!("too many corpus ids: {}", ids.len())));
    }
    let mut documents = Vec::new();
    for (label, &id) in ids.iter().enumerate() {
        let raw = source.fetch(id)?;
        tracing::info!(id, title = %raw.title, lines = raw.lines.len(), "corpus fetched");
        let title: Arc<str> = Arc::from(raw.title.as_str());
        for line in raw.lines {
            documents.push(Document {
                id: documents.len(),
                text: Some(line),
                label: Label(label as u8),
                title: title.clone(),
                split: None,
            });
        }
    }
    Ok(DocumentTable::new(documents))
}

/// Drop documents whose text is missing or only whitespace
pub fn clean(table: DocumentTable) -> DocumentTable {
    let before = table.len();
    let documents: Vec<Document> = table
        .into_documents()
        .into_iter()
        .filter(|d| d.text.as_deref().map_or(false, |t| !t.trim().is_empty()))
        .collect();
    tracing::debug!(before, after = documents.len(), "empty documents removed");
    DocumentTable::new(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source
            .insert(1342, "Pride and Prejudice", ["It is a truth", "", "   ", "universally acknowledged"])
            .insert(84, "Frankenstein", ["You will rejoice", "to hear"]);
        source
    }

    #[test]
    fn load_labels_by_id_position() {
        let table = load_corpus(&source(), &[1342, 84]).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.label_counts(), vec![4, 2]);
        assert_eq!(table.documents()[5].id, 5);
        assert_eq!(&*table.documents()[5].title, "Frankenstein");
        assert_eq!(
            table.titles(),
            vec![
                (Label(0), Arc::from("Pride and Prejudice")),
                (Label(1), Arc::from("Frankenstein"))
            ]
        );
    }

    #[test]
    fn clean_drops_missing_and_blank_text() {
        let mut table = load_corpus(&source(), &[1342, 84]).unwrap().into_documents();
        table[0].text = None;
        let cleaned = clean(DocumentTable::new(table));
        assert_eq!(cleaned.len(), 3);
        assert!(cleaned.iter().all(|d| d.text.as_deref().map_or(false, |t| !t.trim().is_empty())));
    }

    #[test]
    fn unavailable_source_aborts() {
        assert!(matches!(
            load_corpus(&source(), &[1342, 11]),
            Err(Error::CorpusUnavailable { id: 11, .. })
        ));
    }

    #[test]
    fn config_needs_two_distinct_ids() {
        assert!(CorpusConfig::default().validate().is_ok());
        let config = CorpusConfig {
            ids: vec![84, 84],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
