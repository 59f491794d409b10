use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;
use crate::error::ModelError;

/// Number of chunks per CPU used by `build_parallel`.
const CHUNKS_PER_CPU: usize = 8;

/// The model family: one `NGramModel` per order from 2 to `max_n`.
///
/// This struct manages:
/// - `ngrams`: a map from n-gram order to its frequency table. Every order in
///   `2..=max_n` is present, possibly empty when the training tokens were too short.
/// - `token_count`: how many tokens the family was trained on.
///
/// A family is built once and never updated afterwards; queries only borrow it.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiGramModel {
	ngrams: BTreeMap<usize, NGramModel>,
	token_count: usize,
}

/// Summary of a built family, for display and for the HTTP service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelStats {
	pub max_n: usize,
	pub token_count: usize,
	/// `(order, distinct contexts)` for every order, ascending.
	pub contexts: Vec<(usize, usize)>,
}

impl MultiGramModel {
	/// Creates a family with empty tables for every order in `2..=max_n`.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_n < 2`.
	pub fn empty(max_n: usize) -> Result<Self, ModelError> {
		if max_n < 2 {
			return Err(ModelError::InvalidArgument(format!("max_n must be >= 2, got {max_n}")));
		}
		let mut ngrams = BTreeMap::new();
		for n in 2..=max_n {
			ngrams.insert(n, NGramModel::new(n)?);
		}
		Ok(Self { ngrams, token_count: 0 })
	}

	/// Builds every order from 2 to `max_n` in one pass per order.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_n < 2`. Too few tokens is not an
	/// error: the highest orders are simply left empty.
	pub fn build(tokens: &[String], max_n: usize) -> Result<Self, ModelError> {
		let mut model = Self::empty(max_n)?;
		model.add_window_range(tokens, 0, tokens.len());
		model.token_count = tokens.len();
		model.log_built();
		Ok(model)
	}

	/// Same result as `build`, computed on worker threads.
	///
	/// # Behavior
	/// - Splits the window start positions into chunks (CPU cores * factor).
	/// - Each worker counts the windows starting inside its chunk. Windows may
	///   read tokens past the chunk end, so nothing is lost at boundaries.
	/// - Partial families are collected over an MPSC channel and merged.
	pub fn build_parallel(tokens: &[String], max_n: usize) -> Result<Self, ModelError> {
		let mut final_model = Self::empty(max_n)?;
		if tokens.is_empty() {
			return Ok(final_model);
		}

		let chunks = num_cpus::get() * CHUNKS_PER_CPU;
		let chunk_size = tokens.len().div_ceil(chunks).max(1);
		debug!("building {} tokens in chunks of {}", tokens.len(), chunk_size);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for start in (0..tokens.len()).step_by(chunk_size) {
				let tx = tx.clone();
				let end = (start + chunk_size).min(tokens.len());
				scope.spawn(move || {
					let partial_model = Self::empty(max_n).map(|mut partial| {
						partial.add_window_range(tokens, start, end);
						partial
					});
					// The receiver lives until the scope ends
					let _ = tx.send(partial_model);
				});
			}
		});
		drop(tx);

		for partial_model in rx.iter() {
			final_model.merge(&partial_model?)?;
		}
		final_model.token_count = tokens.len();
		final_model.log_built();
		Ok(final_model)
	}

	/// Counts, for every order, the windows whose first token lies in `start..end`.
	fn add_window_range(&mut self, tokens: &[String], start: usize, end: usize) {
		for (n, model) in self.ngrams.iter_mut() {
			let stop = (end + n - 1).min(tokens.len());
			if stop > start {
				model.add_tokens(&tokens[start..stop]);
			}
		}
	}

	fn log_built(&self) {
		for (n, model) in &self.ngrams {
			info!("built {}-gram model (context size {}) with {} unique contexts", n, n - 1, model.len());
		}
	}

	/// Highest order of the family.
	pub fn max_n(&self) -> usize {
		self.ngrams.keys().next_back().copied().unwrap_or(0)
	}

	/// Number of tokens the family was trained on.
	pub fn token_count(&self) -> usize {
		self.token_count
	}

	/// The frequency table of order `n`, if that order was built.
	pub fn order(&self, n: usize) -> Option<&NGramModel> {
		self.ngrams.get(&n)
	}

	/// Iterates over the tables in ascending order.
	pub fn orders(&self) -> impl Iterator<Item = &NGramModel> {
		self.ngrams.values()
	}

	pub fn stats(&self) -> ModelStats {
		ModelStats {
			max_n: self.max_n(),
			token_count: self.token_count,
			contexts: self.ngrams.iter().map(|(n, model)| (*n, model.len())).collect(),
		}
	}

	/// Merges another family into this one.
	///
	/// Both families must cover the same orders. Counts are summed and token
	/// counts added; windows spanning the two training sequences are not
	/// recovered.
	///
	/// # Errors
	/// Returns `OrderMismatch` if the highest orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.max_n() != other.max_n() {
			return Err(ModelError::OrderMismatch { expected: self.max_n(), found: other.max_n() });
		}

		for (n, model) in &other.ngrams {
			if let Some(existing) = self.ngrams.get_mut(n) {
				existing.merge(model)?;
			} else {
				self.ngrams.insert(*n, model.clone());
			}
		}
		self.token_count += other.token_count;

		Ok(())
	}
}
