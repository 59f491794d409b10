//! Word n-gram prediction library.
//!
//! This crate builds n-gram frequency tables (orders 2 to `max_n`) from a
//! token sequence and answers two queries against them:
//! - autocomplete of the last, partially typed word
//! - prediction of the next word
//!
//! Both queries back off from the longest context to the shortest and never
//! mutate the model family they read.

/// N-gram models and query logic.
pub mod model;

/// Text cleaning and tokenization.
pub mod text;

/// File helpers (corpus loading, directory listing).
pub mod io;

/// Memoization of model builds.
pub mod cache;

/// Error type of build and load operations.
pub mod error;

pub use error::ModelError;
