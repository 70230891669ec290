//! Keyphrase extraction with sentence embeddings.
//!
//! Candidate phrases are n-grams of the document's words (POS tokens when available,
//! otherwise runs of kanji, hiragana, katakana or latin letters and digits). Each candidate
//! is embedded together with the document and picked by maximal marginal relevance, which
//! balances similarity to the document against similarity to phrases already picked.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ja_text_pipelines::keyphrase::{BertEmbeddingSize, KeyphrasePipelineBuilder};
//!
//! # fn main() -> ja_text_pipelines::error::Result<()> {
//! let pipeline = KeyphrasePipelineBuilder::bert(BertEmbeddingSize::Small).build()?;
//!
//! let output = pipeline.run("東京都は新しい交通システムの導入を検討している。")?;
//! for phrase in &output.keyphrases {
//!     println!("{}: {:.4}", phrase.text, phrase.relevance);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Models
//!
//! | Model | Sizes | Builder Method |
//! |-------|-------|----------------|
//! | Multilingual E5 | `Small`, `Base` | [`KeyphrasePipelineBuilder::bert`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod candidates;
pub(crate) mod mmr;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::BertEmbeddingSize;
pub use crate::pipelines::stats::PipelineStats;
pub use builder::KeyphrasePipelineBuilder;
pub use model::EmbeddingModel;
pub use pipeline::{Keyphrase, KeyphrasePipeline, KeyphraseParams, Output};

/// Only for generic annotations. Use [`KeyphrasePipelineBuilder::bert`].
pub type BertEmbedder = crate::models::bert::BertEmbeddingModel;
