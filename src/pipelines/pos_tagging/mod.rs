//! Part-of-speech tagging pipeline.
//!
//! Split Japanese text into tokens, each annotated with a surface form, lemma, and a
//! `-`-separated POS path whose first segment is the coarse category.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ja_text_pipelines::pos_tagging::{BertPosSize, PosTaggingPipelineBuilder};
//!
//! # fn main() -> ja_text_pipelines::error::Result<()> {
//! let pipeline = PosTaggingPipelineBuilder::bert(BertPosSize::Base).build()?;
//!
//! let output = pipeline.run("東京で美味しいラーメンを食べた。")?;
//! for token in &output.tokens {
//!     println!("{}\t{}\t{:?}", token.text, token.pos, token.category(output.scheme));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! Backends use different label vocabularies and are not drop-in replacements for each
//! other. Each reports its [`PosScheme`], which maps its labels to a [`CoarseCategory`].
//!
//! | Backend | Options | Scheme | Builder Method |
//! |---------|---------|--------|----------------|
//! | BERT token classifier | [`BertPosSize`] | `Upos` | [`PosTaggingPipelineBuilder::bert`] |
//! | MeCab-style dictionary | [`DictionaryOptions`] | `Ipadic` or `Unidic` | [`PosTaggingPipelineBuilder::dictionary`] |

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;
pub(crate) mod scheme;

// ============ Public API ============

pub use crate::models::{BertPosSize, DictionaryOptions};
pub use crate::pipelines::stats::PipelineStats;
pub use builder::PosTaggingPipelineBuilder;
pub use model::PosTaggingModel;
pub use pipeline::{Output, PosTaggingPipeline, Token};
pub use scheme::{CoarseCategory, PosScheme};

/// Only for generic annotations. Use [`PosTaggingPipelineBuilder::bert`].
pub type BertPosTagger = crate::models::bert::BertPosModel;

/// Only for generic annotations. Use [`PosTaggingPipelineBuilder::dictionary`].
pub type DictionaryPosTagger = crate::models::dictionary::DictionaryPosModel;
