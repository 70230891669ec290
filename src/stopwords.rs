//! Japanese stop-word list.
//!
//! Words are read from a newline-delimited file. When the file is missing, unreadable or
//! empty, a small built-in list of common function words is used instead and the reason is
//! kept in the [`StopWordSource`].

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Function words used when no stop-word file can be read.
pub const FALLBACK_STOPWORDS: [&str; 26] = [
    "これ", "それ", "あれ", "この", "その", "あの", "私", "あなた", "彼", "彼女", "です", "ます",
    "ました", "する", "いる", "ある", "の", "は", "が", "を", "に", "へ", "と", "も", "や", "で",
];

/// Where a [`StopWords`] set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopWordSource {
    /// Read from the given file.
    File(String),
    /// Built-in list, with the reason the file was not used.
    Fallback {
        /// Human-readable explanation.
        reason: String,
    },
}

impl fmt::Display for StopWordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopWordSource::File(path) => write!(f, "file '{path}'"),
            StopWordSource::Fallback { reason } => write!(f, "built-in list ({reason})"),
        }
    }
}

/// A deduplicated set of words to exclude from keyphrase candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The built-in fallback list.
    pub fn fallback() -> Self {
        FALLBACK_STOPWORDS.iter().copied().collect()
    }

    /// Load words from `path`, falling back to [`FALLBACK_STOPWORDS`] on any failure.
    ///
    /// Never fails; the returned source says which list is in effect.
    pub fn load(path: impl AsRef<Path>) -> (Self, StopWordSource) {
        let path = path.as_ref();

        let reason = match std::fs::read_to_string(path) {
            Ok(contents) => {
                let words = Self::parse(&contents);
                if !words.is_empty() {
                    tracing::info!(path = %path.display(), words = words.len(), "stop words loaded");
                    return (words, StopWordSource::File(path.display().to_string()));
                }
                format!("'{}' contains no words", path.display())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("'{}' not found", path.display())
            }
            Err(e) => format!("'{}' could not be read: {e}", path.display()),
        };

        tracing::warn!(%reason, "using built-in stop words");
        (Self::fallback(), StopWordSource::Fallback { reason })
    }

    /// Parse newline-delimited words, trimming each line and skipping blanks.
    pub fn parse(contents: &str) -> Self {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Whether `word` is a stop word.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}
