pub(crate) mod cache;
pub(crate) mod stats;
pub(crate) mod utils;

pub mod keyphrase;
pub mod keywords;
pub mod pos_tagging;
pub mod sentiment;
