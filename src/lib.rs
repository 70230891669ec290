//! Japanese text annotation pipelines in Rust.
//!
//! Powered by [Candle](https://github.com/huggingface/candle) and
//! [vibrato](https://github.com/daac-tools/vibrato), with an API shaped like Python's
//! [Transformers](https://huggingface.co/docs/transformers) pipelines.
//!
//! - [`sentiment`]: positive / negative / neutral classification.
//! - [`pos_tagging`]: tokens with part-of-speech paths, from a BERT tagger or a MeCab-style
//!   dictionary.
//! - [`keywords`]: most frequent content words of tagged text.
//! - [`keyphrase`]: embedding-ranked phrases with maximal marginal relevance.
//! - [`analysis`]: all of the above over one document, each feature degrading on its own.

#![warn(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;

// ============ Public API ============

pub mod analysis;
pub mod config;
pub mod error;
pub mod input;
pub mod stopwords;

pub use pipelines::cache::ModelCache;
pub use pipelines::{keyphrase, keywords, pos_tagging, sentiment};
