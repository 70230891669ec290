use super::pipeline::Token;
use super::scheme::PosScheme;
use crate::error::Result;

/// A morphological analyzer usable by [`PosTaggingPipeline`](super::PosTaggingPipeline).
pub trait PosTaggingModel {
    /// Options identifying the model to load.
    type Options: std::fmt::Debug + Clone;

    /// Load the model onto `device`.
    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    /// Split `text` into tokens annotated with a `-`-separated POS path.
    fn tag(&self, text: &str) -> Result<Vec<Token>>;

    /// Label vocabulary used in [`Token::pos`].
    fn scheme(&self) -> PosScheme;

    /// Device the model runs on.
    fn device(&self) -> &candle_core::Device;
}
