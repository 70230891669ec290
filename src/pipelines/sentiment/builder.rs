use std::sync::Arc;

use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::error::Result;
use crate::pipelines::cache::{ModelCache, ModelOptions};
use crate::pipelines::utils::{BasePipelineBuilder, DeviceRequest, StandardPipelineBuilder};

crate::pipelines::utils::impl_device_methods!(delegated: SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel>);

/// Builder for creating [`SentimentAnalysisPipeline`] instances.
///
/// Use [`Self::modernbert`] as the entry point.
///
/// # Examples
///
/// ```rust,no_run
/// # use ja_text_pipelines::sentiment::{SentimentAnalysisPipelineBuilder, ModernBertSize};
/// # fn main() -> ja_text_pipelines::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base)
///     .cpu()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel>(
    StandardPipelineBuilder<M::Options>,
);

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub(crate) fn new(options: M::Options) -> Self {
        Self(StandardPipelineBuilder::new(options))
    }

    /// Builds the pipeline with configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if model loading or device initialization fails.
    pub fn build(self) -> Result<SentimentAnalysisPipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        BasePipelineBuilder::build(self)
    }

    /// Builds the pipeline, sharing the model through `cache`.
    pub fn build_cached(self, cache: &ModelCache) -> Result<SentimentAnalysisPipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        BasePipelineBuilder::build_cached(self, cache)
    }
}

impl<M: SentimentAnalysisModel> BasePipelineBuilder<M> for SentimentAnalysisPipelineBuilder<M>
where
    M: Send + Sync + 'static,
    M::Options: ModelOptions + Clone,
{
    type Pipeline = SentimentAnalysisPipeline<M>;
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
        Ok(SentimentAnalysisPipeline { model })
    }
}

impl SentimentAnalysisPipelineBuilder<super::SentimentModernBert> {
    /// Creates a builder for a multilingual ModernBERT sentiment model.
    pub fn modernbert(size: crate::models::ModernBertSize) -> Self {
        Self::new(size)
    }
}
