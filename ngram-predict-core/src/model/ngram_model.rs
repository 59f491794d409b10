use std::collections::HashMap;

use super::state::State;
use crate::error::ModelError;

/// Frequency table of a word n-gram model of order `n`.
///
/// The `NGramModel` stores one state per context of `n-1` consecutive words
/// and counts which words followed each context in the training tokens.
///
/// # Responsibilities
/// - Build the table from a token sequence with a sliding window of width `n`
/// - Look up the state of a context
/// - Merge with another n-gram model of the same order `n`
///
/// # Invariants
/// - `n` is always >= 2
/// - Each state in `states` corresponds to a unique context of length `n-1`
/// - All state transitions have occurrence counts >= 1
#[derive(Clone, Debug, PartialEq)]
pub struct NGramModel {
	/// The order of the model (number of words in the n-gram)
	n: usize, // must be >= 2

	/// Mapping from a context (length n-1) to its corresponding state
	states: HashMap<Vec<String>, State>,
}

impl NGramModel {
	/// Creates a new, empty n-gram model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 2`.
	pub fn new(n: usize) -> Result<Self, ModelError> {
		if n < 2 {
			return Err(ModelError::InvalidArgument(format!("n must be >= 2, got {n}")));
		}
		Ok(Self { n, states: HashMap::new() })
	}

	/// The order of this model.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Adds every window of `n` consecutive tokens to the model.
	///
	/// The first `n-1` tokens of a window form the context, the last one is
	/// the observed next word. Sequences shorter than `n` add nothing.
	pub fn add_tokens(&mut self, tokens: &[String]) {
		for window in tokens.windows(self.n) {
			let (context, next_word) = window.split_at(self.n - 1);
			let state = self.states.entry(context.to_vec()).or_insert_with(|| State::new(context));
			state.add_transition(&next_word[0]);
		}
	}

	/// Returns the state recorded for `context`, if any.
	///
	/// A context of the wrong length is simply never found.
	pub fn get(&self, context: &[String]) -> Option<&State> {
		self.states.get(context)
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Iterates over all recorded states in no particular order.
	pub fn states(&self) -> impl Iterator<Item = &State> {
		self.states.values()
	}

	/// Total number of n-grams (windows) observed by this model.
	pub fn observations(&self) -> usize {
		self.states.values().map(State::total).sum()
	}

	/// Merges another n-gram model into this one.
	///
	/// Occurrence counts for matching contexts and transitions are summed.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.n != other.n {
			return Err(ModelError::OrderMismatch { expected: self.n, found: other.n });
		}

		for (context, state) in &other.states {
			if let Some(existing) = self.states.get_mut(context) {
				existing.merge(state)?;
			} else {
				self.states.insert(context.clone(), state.clone());
			}
		}

		Ok(())
	}
}
