use serde::Serialize;
use std::sync::Arc;

use super::model::SentimentAnalysisModel;
use crate::error::{PipelineError, Result};
use crate::pipelines::stats::PipelineStats;

// ============ Output types ============

/// A sentiment label with its probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The sentiment class (e.g. "positive", "negative", "neutral").
    pub label: String,
    /// Probability (0.0 to 1.0).
    pub score: f32,
}

/// Single-text output from [`SentimentAnalysisPipeline::run`].
#[derive(Debug)]
pub struct Output {
    /// Most likely class.
    pub prediction: Prediction,
    /// Every class with its probability, in label-id order.
    pub scores: Vec<Prediction>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Single result in batch output.
#[derive(Debug)]
pub struct BatchResult {
    /// Input text.
    pub text: String,
    /// Per-class scores or error for this input.
    pub scores: Result<Vec<Prediction>>,
}

/// Batch output from [`SentimentAnalysisPipeline::run_batch`].
#[derive(Debug)]
pub struct BatchOutput {
    /// Results for each input.
    pub results: Vec<BatchResult>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Pick the highest-scoring class. Ties keep the lower label id.
pub(crate) fn top_prediction(scores: &[Prediction]) -> Option<&Prediction> {
    scores
        .iter()
        .reduce(|best, p| if p.score > best.score { p } else { best })
}

// ============ Pipeline ============

/// Classifies text sentiment (positive, negative, neutral).
///
/// Construct with [`SentimentAnalysisPipelineBuilder`](super::SentimentAnalysisPipelineBuilder).
///
/// # Examples
///
/// ```rust,no_run
/// # use ja_text_pipelines::sentiment::{SentimentAnalysisPipelineBuilder, ModernBertSize};
/// # fn main() -> ja_text_pipelines::error::Result<()> {
/// let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
///
/// let output = pipeline.run("この商品は本当に素晴らしい！")?;
/// println!("{}: {:.2}", output.prediction.label, output.prediction.score);
/// for class in &output.scores {
///     println!("  {}: {:.2}", class.label, class.score);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: Arc<M>,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Score every sentiment class for `text`.
    pub fn run(&self, text: &str) -> Result<Output> {
        let stats_builder = PipelineStats::start();

        let scores = self.model.predict_scores(text)?;
        let prediction = top_prediction(&scores)
            .cloned()
            .ok_or_else(|| PipelineError::Unexpected("Model returned no class scores".into()))?;

        tracing::debug!(label = %prediction.label, score = prediction.score, "sentiment predicted");

        Ok(Output {
            prediction,
            scores,
            stats: stats_builder.finish(1),
        })
    }

    /// Score a batch of texts in one forward pass.
    pub fn run_batch(&self, texts: &[&str]) -> Result<BatchOutput> {
        let stats_builder = PipelineStats::start();

        let results = self
            .model
            .predict_scores_batch(texts)?
            .into_iter()
            .zip(texts)
            .map(|(scores, text)| BatchResult {
                text: text.to_string(),
                scores,
            })
            .collect();

        Ok(BatchOutput {
            results,
            stats: stats_builder.finish(texts.len()),
        })
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    struct FixedScores {
        device: Device,
    }

    impl SentimentAnalysisModel for FixedScores {
        type Options = ();

        fn new(_: (), device: Device) -> Result<Self> {
            Ok(Self { device })
        }

        fn predict_scores(&self, text: &str) -> Result<Vec<Prediction>> {
            if text == "壊れた" {
                return Err(PipelineError::Tokenization("bad input".into()));
            }
            Ok(vec![
                Prediction {
                    label: "negative".into(),
                    score: 0.1,
                },
                Prediction {
                    label: "neutral".into(),
                    score: 0.2,
                },
                Prediction {
                    label: "positive".into(),
                    score: 0.7,
                },
            ])
        }

        fn device(&self) -> &Device {
            &self.device
        }
    }

    fn pipeline() -> SentimentAnalysisPipeline<FixedScores> {
        SentimentAnalysisPipeline {
            model: Arc::new(FixedScores::new((), Device::Cpu).unwrap()),
        }
    }

    #[test]
    fn run_reports_top_class_and_all_scores() {
        let output = pipeline().run("最高の一日でした").unwrap();
        assert_eq!(output.prediction.label, "positive");
        assert_eq!(output.scores.len(), 3);
        assert_eq!(output.stats.items_processed, 1);
    }

    #[test]
    fn batch_keeps_per_item_errors() {
        let output = pipeline().run_batch(&["良い", "壊れた"]).unwrap();
        assert_eq!(output.results.len(), 2);
        assert!(output.results[0].scores.is_ok());
        assert!(output.results[1].scores.is_err());
        assert_eq!(output.results[1].text, "壊れた");
    }

    #[test]
    fn top_prediction_prefers_first_on_tie() {
        let scores = vec![
            Prediction {
                label: "a".into(),
                score: 0.5,
            },
            Prediction {
                label: "b".into(),
                score: 0.5,
            },
        ];
        assert_eq!(top_prediction(&scores).unwrap().label, "a");
        assert!(top_prediction(&[]).is_none());
    }
}
