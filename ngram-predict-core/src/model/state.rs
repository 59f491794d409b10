use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::ModelError;

/// Represents a context of an n-gram model.
///
/// A `State` corresponds to a fixed sequence of `n-1` words (`context`) and
/// stores every word observed right after it, together with how many times
/// it was observed.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Rank the following words by frequency, optionally filtered
/// - Merge with another state having the same context (parallel learning support)
///
/// ## Invariants
/// - All transitions belong to the same `context`
/// - Each transition occurrence count is strictly positive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// The `n-1` words preceding every recorded transition.
	context: Vec<String>,
	/// Outgoing transitions indexed by the next word.
	/// Example: { "dog" => 2, "cat" => 1 }
	transitions: HashMap<String, usize>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(context: &[String]) -> Self {
		Self {
			context: context.to_vec(),
			transitions: HashMap::new(),
		}
	}

	/// The context this state was recorded for.
	pub fn context(&self) -> &[String] {
		&self.context
	}

	/// Records an occurrence of a transition toward `next_word`.
	pub fn add_transition(&mut self, next_word: &str) {
		match self.transitions.get_mut(next_word) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.transitions.insert(next_word.to_owned(), 1);
			}
		}
	}

	/// Number of times `word` followed this context (0 if never).
	pub fn count(&self, word: &str) -> usize {
		self.transitions.get(word).copied().unwrap_or(0)
	}

	/// Total number of observations of this context, all next words included.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Number of distinct next words.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Iterates over `(next_word, occurrence)` pairs in no particular order.
	pub fn transitions(&self) -> impl Iterator<Item = (&str, usize)> {
		self.transitions.iter().map(|(word, occurrence)| (word.as_str(), *occurrence))
	}

	/// Returns the next words accepted by `keep`, most frequent first.
	///
	/// Equal counts are ordered lexicographically so that results are
	/// reproducible regardless of hash iteration order.
	pub fn ranked<F>(&self, keep: F) -> Vec<(&str, usize)>
	where
		F: Fn(&str) -> bool,
	{
		let mut ranked: Vec<(&str, usize)> = self.transitions().filter(|&(word, _)| keep(word)).collect();
		ranked.sort_by(|a, b| match b.1.cmp(&a.1) {
			Ordering::Equal => a.0.cmp(b.0),
			other => other,
		});
		ranked
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same context. Occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error if the contexts do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.context != other.context {
			return Err(ModelError::InvalidArgument(format!(
				"context mismatch: {:?} vs {:?}",
				self.context, other.context
			)));
		}

		for (next_word, occurrence) in &other.transitions {
			*self.transitions.entry(next_word.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}
