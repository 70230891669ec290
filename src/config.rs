//! Analysis defaults and the runtime [`AnalysisConfig`].
//!
//! Defaults are compile-time constants; a TOML file can override any of them and the
//! `ja-annotate` binary applies its command-line flags on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::pipelines::pos_tagging::{CoarseCategory, PosScheme};

/// Default number of keywords returned by both keyword panels.
pub const DEFAULT_TOP_N: usize = 10;

/// Default n-gram range for keyphrase candidates (inclusive).
pub const DEFAULT_NGRAM_RANGE: (usize, usize) = (1, 2);

/// Default MMR diversity. 0.0 ranks purely by relevance, 1.0 purely by novelty.
pub const DEFAULT_DIVERSITY: f32 = 0.7;

/// Default stop-word file, one word per line.
pub const DEFAULT_STOPWORDS_PATH: &str = "stopwords-ja.txt";

/// Default coarse categories counted by the frequency keyword extractor.
pub const DEFAULT_ALLOWED_CATEGORIES: [CoarseCategory; 3] = [
    CoarseCategory::Noun,
    CoarseCategory::ProperNoun,
    CoarseCategory::Adjective,
];

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_ngram_range() -> (usize, usize) {
    DEFAULT_NGRAM_RANGE
}

fn default_diversity() -> f32 {
    DEFAULT_DIVERSITY
}

fn default_stopwords_path() -> PathBuf {
    PathBuf::from(DEFAULT_STOPWORDS_PATH)
}

fn default_allowed_categories() -> Vec<CoarseCategory> {
    DEFAULT_ALLOWED_CATEGORIES.to_vec()
}

/// Settings shared by every analysis run.
///
/// ```rust
/// use ja_text_pipelines::config::AnalysisConfig;
///
/// let config: AnalysisConfig = toml::from_str("top_n = 5\ndiversity = 0.3").unwrap();
/// assert_eq!(config.top_n, 5);
/// assert_eq!(config.ngram_range, (1, 2));
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Maximum number of keywords per panel.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Inclusive `(min, max)` n-gram lengths for keyphrase candidates.
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    /// MMR diversity in `[0, 1]`.
    #[serde(default = "default_diversity")]
    pub diversity: f32,
    /// Newline-delimited stop-word list.
    #[serde(default = "default_stopwords_path")]
    pub stopwords_path: PathBuf,
    /// Coarse categories counted by the frequency keyword extractor.
    #[serde(default = "default_allowed_categories")]
    pub allowed_categories: Vec<CoarseCategory>,
    /// Label scheme override. `None` uses the scheme reported by the POS backend.
    #[serde(default)]
    pub pos_scheme: Option<PosScheme>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            ngram_range: DEFAULT_NGRAM_RANGE,
            diversity: DEFAULT_DIVERSITY,
            stopwords_path: default_stopwords_path(),
            allowed_categories: default_allowed_categories(),
            pos_scheme: None,
        }
    }
}

impl AnalysisConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: AnalysisConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no pipeline can run with.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(PipelineError::Config("top_n must be at least 1".into()));
        }
        let (min, max) = self.ngram_range;
        if min == 0 || min > max {
            return Err(PipelineError::Config(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min}, {max})"
            )));
        }
        if !(0.0..=1.0).contains(&self.diversity) {
            return Err(PipelineError::Config(format!(
                "diversity must be within [0, 1], got {}",
                self.diversity
            )));
        }
        if self.allowed_categories.is_empty() {
            return Err(PipelineError::Config(
                "allowed_categories must name at least one category".into(),
            ));
        }
        Ok(())
    }
}
