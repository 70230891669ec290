use candle_core::Device;

use crate::error::Result;

/// Sentence encoder used to score keyphrase candidates against their document.
pub trait EmbeddingModel {
    /// Model-specific options (e.g. size variant).
    type Options: std::fmt::Debug + Clone;

    /// Load the model onto `device`.
    fn new(options: Self::Options, device: Device) -> Result<Self>
    where
        Self: Sized;

    /// Embed each text. Vectors share one dimension and are returned in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Device the model runs on.
    fn device(&self) -> &Device;
}
