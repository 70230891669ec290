// ============ Model implementations ============

pub(crate) mod bert;
pub(crate) mod dictionary;
pub(crate) mod modernbert;

// Public option types (for builder entry points)
pub use bert::{BertEmbeddingSize, BertPosSize};
pub use dictionary::DictionaryOptions;
pub use modernbert::ModernBertSize;
