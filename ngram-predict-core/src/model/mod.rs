//! Word n-gram models and the queries answered from them.
//!
//! - Fixed-order frequency tables (`NGramModel`)
//! - The model family, one table per order (`MultiGramModel`)
//! - Per-context transition counts (`State`)
//! - Query parameters (`PredictionInput`)
//! - Autocomplete and next-word prediction with backoff (`predictor`)

/// Autocomplete and next-word prediction over a model family.
///
/// Both queries share a longest-context-first backoff search.
pub mod predictor;

/// Model family holding one `NGramModel` per order from 2 to `max_n`.
///
/// Supports sequential and multithreaded construction and merging.
pub mod multigram_model;

/// Fixed-order word n-gram frequency table (`n >= 2`).
pub mod ngram_model;

/// Transition counts of a single context.
mod state;

/// Validated query parameters (`max_n`, `top_k`).
pub mod prediction_input;

pub use state::State;
