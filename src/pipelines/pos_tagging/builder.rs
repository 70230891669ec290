use std::sync::Arc;

use super::model::PosTaggingModel;
use super::pipeline::PosTaggingPipeline;
use crate::error::Result;
use crate::pipelines::cache::{ModelCache, ModelOptions};
use crate::pipelines::utils::{BasePipelineBuilder, DeviceRequest, StandardPipelineBuilder};

crate::pipelines::utils::impl_device_methods!(delegated: PosTaggingPipelineBuilder<M: PosTaggingModel>);

/// Builder for creating [`PosTaggingPipeline`] instances.
///
/// Use [`Self::bert`] for the neural tagger or [`Self::dictionary`] for a MeCab-style
/// dictionary analyzer.
///
/// # Examples
///
/// ```rust,no_run
/// # use ja_text_pipelines::pos_tagging::{PosTaggingPipelineBuilder, DictionaryOptions, PosScheme};
/// # fn main() -> ja_text_pipelines::error::Result<()> {
/// let options = DictionaryOptions::new("ipadic-mecab-2_7_0/system.dic.zst", PosScheme::Ipadic);
/// let pipeline = PosTaggingPipelineBuilder::dictionary(options).build()?;
/// # Ok(())
/// # }
/// ```
pub struct PosTaggingPipelineBuilder<M: PosTaggingModel>(StandardPipelineBuilder<M::Options>);

impl<M: PosTaggingModel> PosTaggingPipelineBuilder<M> {
    pub(crate) fn new(options: M::Options) -> Self {
        Self(StandardPipelineBuilder::new(options))
    }

    /// Builds the pipeline with configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if model loading or device initialization fails.
    pub fn build(self) -> Result<PosTaggingPipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        BasePipelineBuilder::build(self)
    }

    /// Builds the pipeline, sharing the model through `cache`.
    pub fn build_cached(self, cache: &ModelCache) -> Result<PosTaggingPipeline<M>>
    where
        M: Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        BasePipelineBuilder::build_cached(self, cache)
    }
}

impl<M: PosTaggingModel> BasePipelineBuilder<M> for PosTaggingPipelineBuilder<M>
where
    M: Send + Sync + 'static,
    M::Options: ModelOptions + Clone,
{
    type Pipeline = PosTaggingPipeline<M>;
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
        Ok(PosTaggingPipeline { model })
    }
}

impl PosTaggingPipelineBuilder<super::BertPosTagger> {
    /// Creates a builder for a BERT token-classification tagger.
    pub fn bert(size: crate::models::BertPosSize) -> Self {
        Self::new(size)
    }
}

impl PosTaggingPipelineBuilder<super::DictionaryPosTagger> {
    /// Creates a builder for a dictionary-based morphological analyzer.
    pub fn dictionary(options: crate::models::DictionaryOptions) -> Self {
        Self::new(options)
    }
}
