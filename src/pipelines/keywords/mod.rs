//! Frequency-based keyword extraction from part-of-speech tags.
//!
//! Counts the surface forms of tokens whose coarse category is allowed (nouns, proper
//! nouns and adjectives by default) and returns the most frequent ones. Works on the
//! output of any [`pos_tagging`](crate::pos_tagging) backend; no model is involved.
//!
//! ```rust
//! use ja_text_pipelines::keywords::FrequencyKeywordExtractor;
//! use ja_text_pipelines::pos_tagging::{PosScheme, Token};
//!
//! let tokens = vec![Token::new("A", "名詞"), Token::new("B", "名詞")];
//! let keywords = FrequencyKeywordExtractor::new(PosScheme::Unidic)
//!     .with_top_n(1)
//!     .extract(&tokens);
//!
//! assert_eq!(keywords[0].text, "A");
//! ```

pub(crate) mod extractor;

pub use extractor::{FrequencyKeywordExtractor, KeywordCount};
