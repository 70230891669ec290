use std::sync::Arc;

use super::model::EmbeddingModel;
use super::pipeline::{KeyphraseParams, KeyphrasePipeline};
use crate::error::{PipelineError, Result};
use crate::pipelines::cache::{ModelCache, ModelOptions};
use crate::pipelines::utils::{BasePipelineBuilder, DeviceRequest, StandardPipelineBuilder};
use crate::stopwords::StopWords;

crate::pipelines::utils::impl_device_methods!(delegated: KeyphrasePipelineBuilder<M: EmbeddingModel>);

/// Builder for creating [`KeyphrasePipeline`] instances.
///
/// Use [`Self::bert`] as the entry point. Ranking settings default to
/// [`KeyphraseParams::default`] and stop words to the built-in list.
///
/// # Examples
///
/// ```rust,no_run
/// # use ja_text_pipelines::keyphrase::{BertEmbeddingSize, KeyphrasePipelineBuilder};
/// # use ja_text_pipelines::stopwords::StopWords;
/// # fn main() -> ja_text_pipelines::error::Result<()> {
/// let (stopwords, _) = StopWords::load("stopwords-ja.txt");
/// let pipeline = KeyphrasePipelineBuilder::bert(BertEmbeddingSize::Base)
///     .top_n(5)
///     .ngram_range(1, 3)
///     .diversity(0.5)
///     .stopwords(stopwords)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct KeyphrasePipelineBuilder<M: EmbeddingModel>(
    StandardPipelineBuilder<M::Options>,
    KeyphraseParams,
    StopWords,
);

impl<M: EmbeddingModel> KeyphrasePipelineBuilder<M> {
    pub(crate) fn new(options: M::Options) -> Self {
        Self(
            StandardPipelineBuilder::new(options),
            KeyphraseParams::default(),
            StopWords::fallback(),
        )
    }

    /// Maximum number of keyphrases returned.
    pub fn top_n(mut self, top_n: usize) -> Self {
        self.1.top_n = top_n;
        self
    }

    /// Inclusive range of words per candidate phrase.
    pub fn ngram_range(mut self, min: usize, max: usize) -> Self {
        self.1.ngram_range = (min, max);
        self
    }

    /// Relevance/variety trade-off in `[0, 1]`.
    pub fn diversity(mut self, diversity: f32) -> Self {
        self.1.diversity = diversity;
        self
    }

    /// Replace all ranking settings at once.
    pub fn params(mut self, params: KeyphraseParams) -> Self {
        self.1 = params;
        self
    }

    /// Words never used in candidates.
    pub fn stopwords(mut self, stopwords: StopWords) -> Self {
        self.2 = stopwords;
        self
    }

    fn checked_settings(&self) -> Result<(KeyphraseParams, StopWords)> {
        self.1
            .validate()
            .map_err(|e| PipelineError::Config(format!("Invalid keyphrase settings: {e}")))?;
        Ok((self.1, self.2.clone()))
    }

    /// Builds the pipeline with configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the ranking settings are invalid, or if model loading or device
    /// initialization fails.
    pub fn build(self) -> Result<KeyphrasePipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        let (params, stopwords) = self.checked_settings()?;
        let mut pipeline = BasePipelineBuilder::build(self)?;
        pipeline.params = params;
        pipeline.stopwords = stopwords;
        Ok(pipeline)
    }

    /// Builds the pipeline, sharing the model through `cache`.
    pub fn build_cached(self, cache: &ModelCache) -> Result<KeyphrasePipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        let (params, stopwords) = self.checked_settings()?;
        let mut pipeline = BasePipelineBuilder::build_cached(self, cache)?;
        pipeline.params = params;
        pipeline.stopwords = stopwords;
        Ok(pipeline)
    }
}

impl<M: EmbeddingModel> BasePipelineBuilder<M> for KeyphrasePipelineBuilder<M>
where
    M: Send + Sync + 'static,
    M::Options: ModelOptions + Clone,
{
    type Pipeline = KeyphrasePipeline<M>;
    type Options = M::Options;

    fn options(&self) -> &Self::Options {
        &self.0.options
    }

    fn device_request(&self) -> &DeviceRequest {
        &self.0.device_request
    }

    fn create_model(options: Self::Options, device: candle_core::Device) -> Result<M> {
        M::new(options, device)
    }

    fn construct_pipeline(model: Arc<M>) -> Result<Self::Pipeline> {
        Ok(KeyphrasePipeline {
            model,
            params: KeyphraseParams::default(),
            stopwords: StopWords::fallback(),
        })
    }
}

impl KeyphrasePipelineBuilder<super::BertEmbedder> {
    /// Creates a builder for a multilingual E5 sentence encoder.
    pub fn bert(size: crate::models::BertEmbeddingSize) -> Self {
        Self::new(size)
    }
}
