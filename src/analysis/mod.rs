//! Text analysis pipeline: tokenize, count, select the top K.

pub mod counter;
pub mod tokenizer;
pub mod topk;

pub use counter::{FrequencyTable, count};
pub use tokenizer::tokenize;
pub use topk::{TopKResult, WordCount, top_k};

use std::num::NonZeroUsize;

/// Run the full pipeline over decoded text
pub fn analyze(text: &str, k: NonZeroUsize) -> TopKResult {
    let table = count(tokenize(text));
    top_k(&table, k)
}
