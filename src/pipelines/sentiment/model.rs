use super::pipeline::Prediction;
use crate::error::Result;

/// A sequence classifier usable by [`SentimentAnalysisPipeline`](super::SentimentAnalysisPipeline).
pub trait SentimentAnalysisModel {
    /// Options identifying the model to load.
    type Options: std::fmt::Debug + Clone;

    /// Load the model onto `device`.
    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    /// Probability of every sentiment class, in label-id order.
    fn predict_scores(&self, text: &str) -> Result<Vec<Prediction>>;

    /// Class probabilities for each input, one result per item.
    fn predict_scores_batch(&self, texts: &[&str]) -> Result<Vec<Result<Vec<Prediction>>>> {
        Ok(texts.iter().map(|text| self.predict_scores(text)).collect())
    }

    /// Device the model runs on.
    fn device(&self) -> &candle_core::Device;
}
