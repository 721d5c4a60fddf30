use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::corpus::CorpusConfig;
use crate::error::{Error, Result};

const START_MARKER: &str = "*** START OF";
const END_MARKER: &str = "*** END OF";

/// One fetched book
#[derive(Debug, Clone, PartialEq)]
pub struct RawText {
    pub id: u32,
    pub title: String,
    /// body lines, one document each
    pub lines: Vec<String>,
}

/// Lookup of a text collection by integer identifier
pub trait CorpusSource {
    fn fetch(&self, id: u32) -> Result<RawText>;
}

/// Split a Project Gutenberg plain-text file into title and body lines.
///
/// The title comes from the first `Title:` header line. The body is the
/// lines strictly between the `*** START OF` and `*** END OF` markers;
/// without markers the whole file is the body.
pub fn parse_gutenberg(id: u32, text: &str) -> RawText {
    let lines: Vec<&str> = text.lines().collect();
    let title = lines
        .iter()
        .find_map(|l| l.trim_start_matches('\u{feff}').strip_prefix("Title:"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("#{id}"));

    let start = lines
        .iter()
        .position(|l| l.starts_with(START_MARKER))
        .map_or(0, |p| p + 1);
    let end = lines[start..]
        .iter()
        .position(|l| l.starts_with(END_MARKER))
        .map_or(lines.len(), |p| start + p);

    RawText {
        id,
        title,
        lines: lines[start..end].iter().map(|l| l.to_string()).collect(),
    }
}

/// Downloads plain-text books over HTTP
#[derive(Debug, Clone)]
pub struct GutenbergSource {
    client: reqwest::blocking::Client,
    url_template: String,
}

impl GutenbergSource {
    pub fn new(config: &CorpusConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("authorship-analyzer/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url_template: config.url_template.clone(),
        })
    }

    pub fn url(&self, id: u32) -> String {
        self.url_template.replace("{id}", &id.to_string())
    }
}

impl CorpusSource for GutenbergSource {
    fn fetch(&self, id: u32) -> Result<RawText> {
        let url = self.url(id);
        tracing::debug!(id, url = %url, "fetching corpus");
        let unavailable = |reason: String| Error::CorpusUnavailable { id, reason };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("{url} returned {}", response.status())));
        }
        let body = response.text().map_err(|e| unavailable(e.to_string()))?;
        Ok(parse_gutenberg(id, &body))
    }
}

/// Reads `<dir>/<id>.txt`, for offline runs
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CorpusSource for DirectorySource {
    fn fetch(&self, id: u32) -> Result<RawText> {
        let path = self.dir.join(format!("{id}.txt"));
        let body = std::fs::read_to_string(&path).map_err(|e| Error::CorpusUnavailable {
            id,
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(parse_gutenberg(id, &body))
    }
}

/// In-memory texts
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    texts: HashMap<u32, RawText>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, id: u32, title: &str, lines: impl IntoIterator<Item = S>) -> &mut Self {
        self.texts.insert(
            id,
            RawText {
                id,
                title: title.to_string(),
                lines: lines.into_iter().map(Into::into).collect(),
            },
        );
        self
    }
}

impl CorpusSource for MemorySource {
    fn fetch(&self, id: u32) -> Result<RawText> {
        self.texts.get(&id).cloned().ok_or_else(|| Error::CorpusUnavailable {
            id,
            reason: "not in memory source".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = "\u{feff}The Project Gutenberg eBook of Frankenstein\n\
        Title: Frankenstein; Or, The Modern Prometheus\n\
        Author: Mary Wollstonecraft Shelley\n\
        *** START OF THE PROJECT GUTENBERG EBOOK 84 ***\n\
        Letter 1\n\
        \n\
        You will rejoice to hear\n\
        *** END OF THE PROJECT GUTENBERG EBOOK 84 ***\n\
        license text\n";

    #[test]
    fn parses_title_and_body() {
        let raw = parse_gutenberg(84, BOOK);
        assert_eq!(raw.title, "Frankenstein; Or, The Modern Prometheus");
        assert_eq!(raw.lines, vec!["Letter 1", "", "You will rejoice to hear"]);
    }

    #[test]
    fn missing_markers_keep_everything() {
        let raw = parse_gutenberg(7, "one\ntwo");
        assert_eq!(raw.title, "#7");
        assert_eq!(raw.lines.len(), 2);
    }

    #[test]
    fn url_template_substitutes_id() {
        let source = GutenbergSource::new(&CorpusConfig::default()).unwrap();
        assert_eq!(source.url(84), "https://www.gutenberg.org/cache/epub/84/pg84.txt");
    }

    #[test]
    fn missing_texts_are_unavailable() {
        let err = MemorySource::new().fetch(1).unwrap_err();
        assert!(matches!(err, Error::CorpusUnavailable { id: 1, .. }));
        let err = DirectorySource::new("/nonexistent").fetch(2).unwrap_err();
        assert!(matches!(err, Error::CorpusUnavailable { id: 2, .. }));
    }
}
