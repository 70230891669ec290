use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::model::PosTaggingModel;
use super::scheme::{CoarseCategory, PosScheme};
use crate::error::Result;
use crate::pipelines::stats::PipelineStats;

// ============ Output types ============

/// One token produced by a morphological analyzer.
///
/// `pos` is a hierarchical path with `-` between levels, coarse category first
/// (e.g. `名詞-普通名詞-一般`). Records deserialized without `pos` get an empty path and
/// therefore no category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form as it appears in the input.
    pub text: String,
    /// Dictionary form.
    #[serde(default)]
    pub lemma: String,
    /// `-`-separated POS path.
    #[serde(default)]
    pub pos: String,
    /// Backend-specific detail tag.
    #[serde(default)]
    pub tag: String,
}

impl Token {
    /// Build a token whose lemma and tag mirror its surface and POS.
    pub fn new(text: impl Into<String>, pos: impl Into<String>) -> Self {
        let text = text.into();
        let pos = pos.into();
        Self {
            lemma: text.clone(),
            tag: pos.clone(),
            text,
            pos,
        }
    }

    /// Coarse category of this token under `scheme`.
    pub fn category(&self, scheme: PosScheme) -> Option<CoarseCategory> {
        scheme.coarse_category(&self.pos)
    }
}

/// Output from [`PosTaggingPipeline::run`].
#[derive(Debug)]
pub struct Output {
    /// Tokens in input order.
    pub tokens: Vec<Token>,
    /// Label vocabulary of `tokens[..].pos`.
    pub scheme: PosScheme,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ Pipeline ============

/// Splits Japanese text into tokens with part-of-speech annotations.
///
/// Construct with [`PosTaggingPipelineBuilder`](super::PosTaggingPipelineBuilder).
///
/// # Examples
///
/// ```rust,no_run
/// # use ja_text_pipelines::pos_tagging::{PosTaggingPipelineBuilder, BertPosSize};
/// # fn main() -> ja_text_pipelines::error::Result<()> {
/// let pipeline = PosTaggingPipelineBuilder::bert(BertPosSize::Base).build()?;
///
/// let output = pipeline.run("猫が走る。")?;
/// for token in &output.tokens {
///     println!("{}\t{}", token.text, token.pos);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PosTaggingPipeline<M: PosTaggingModel> {
    pub(crate) model: Arc<M>,
}

impl<M: PosTaggingModel> PosTaggingPipeline<M> {
    /// Tag `text`. Blank input yields no tokens.
    pub fn run(&self, text: &str) -> Result<Output> {
        let stats_builder = PipelineStats::start();

        let tokens = if text.trim().is_empty() {
            Vec::new()
        } else {
            self.model.tag(text)?
        };

        tracing::debug!(tokens = tokens.len(), "pos tagging finished");
        let count = tokens.len();
        Ok(Output {
            tokens,
            scheme: self.model.scheme(),
            stats: stats_builder.finish(count),
        })
    }

    /// Label vocabulary of this pipeline's backend.
    pub fn scheme(&self) -> PosScheme {
        self.model.scheme()
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}
