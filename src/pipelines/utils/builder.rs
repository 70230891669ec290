use std::sync::Arc;

use super::{build_cache_key, DeviceRequest};
use crate::error::Result;
use crate::pipelines::cache::{ModelCache, ModelOptions};

pub trait BasePipelineBuilder<M>: Sized
where
    M: Send + Sync + 'static,
{
    type Pipeline;

    type Options: ModelOptions + Clone;

    fn options(&self) -> &Self::Options;

    fn device_request(&self) -> &DeviceRequest;

    fn create_model(options: Self::Options, device: candle_core::Device) -> Result<M>;

    fn construct_pipeline(model: Arc<M>) -> Result<Self::Pipeline>;

    /// Load a fresh model instance.
    fn build(self) -> Result<Self::Pipeline> {
        let device = self.device_request().clone().resolve()?;
        tracing::info!(model = %self.options().cache_key(), "loading model");

        let model = Self::create_model(self.options().clone(), device)?;

        Self::construct_pipeline(Arc::new(model))
    }

    /// Reuse a model already held by `cache`, loading it on first use.
    fn build_cached(self, cache: &ModelCache) -> Result<Self::Pipeline> {
        let device = self.device_request().clone().resolve()?;

        let key = build_cache_key(self.options(), &device);

        let model = cache.get_or_create(&key, || {
            tracing::info!(model = %key, "loading model into cache");
            Self::create_model(self.options().clone(), device.clone())
        })?;

        Self::construct_pipeline(model)
    }
}

pub struct StandardPipelineBuilder<Opts> {
    pub(crate) options: Opts,
    pub(crate) device_request: DeviceRequest,
}

impl<Opts> StandardPipelineBuilder<Opts> {
    pub fn new(options: Opts) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Cpu,
        }
    }

    pub(crate) fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}
