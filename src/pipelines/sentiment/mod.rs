//! Sentiment analysis pipeline.
//!
//! Classify Japanese (or any of the model's languages) text as `positive`, `negative`, or
//! `neutral`. Returns the top label plus the probability of every class.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ja_text_pipelines::sentiment::{SentimentAnalysisPipelineBuilder, ModernBertSize};
//!
//! # fn main() -> ja_text_pipelines::error::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::modernbert(ModernBertSize::Base).build()?;
//!
//! let output = pipeline.run("サポートの対応がとても丁寧でした。")?;
//! println!("sentiment: {} ({:.2})", output.prediction.label, output.prediction.score);
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Models
//!
//! | Model | Sizes | Builder Method |
//! |-------|-------|----------------|
//! | ModernBERT multilingual sentiment | `Base`, `Large` | [`SentimentAnalysisPipelineBuilder::modernbert`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::ModernBertSize;
pub use crate::pipelines::stats::PipelineStats;
pub use builder::SentimentAnalysisPipelineBuilder;
pub use model::SentimentAnalysisModel;
pub use pipeline::{BatchOutput, BatchResult, Output, Prediction, SentimentAnalysisPipeline};

/// Only for generic annotations. Use [`SentimentAnalysisPipelineBuilder::modernbert`].
pub type SentimentModernBert = crate::models::modernbert::SentimentModernBertModel;
