use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Highest n-gram order used when none is given.
pub const DEFAULT_MAX_N: usize = 3;

/// Number of suggestions returned when none is given.
pub const DEFAULT_TOP_K: usize = 5;

/// Query parameters shared by autocomplete and next-word prediction.
///
/// # Invariants
/// - `max_n >= 2`
/// - `top_k >= 1`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictionInput {
	/// Highest n-gram order to query; backoff walks down to 2 from here.
	max_n: usize,

	/// Maximum number of ranked suggestions returned.
	top_k: usize,
}

impl Default for PredictionInput {
	fn default() -> Self {
		Self { max_n: DEFAULT_MAX_N, top_k: DEFAULT_TOP_K }
	}
}

impl PredictionInput {
	/// Creates validated query parameters.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_n < 2` or `top_k == 0`.
	pub fn new(max_n: usize, top_k: usize) -> Result<Self, ModelError> {
		let mut input = Self::default();
		input.set_max_n(max_n)?;
		input.set_top_k(top_k)?;
		Ok(input)
	}

	pub fn max_n(&self) -> usize {
		self.max_n
	}

	pub fn top_k(&self) -> usize {
		self.top_k
	}

	/// Sets the highest order to query.
	///
	/// # Errors
	/// Returns an error if the value is below 2.
	pub fn set_max_n(&mut self, max_n: usize) -> Result<(), ModelError> {
		if max_n < 2 {
			return Err(ModelError::InvalidArgument(format!("max_n must be >= 2, got {max_n}")));
		}
		self.max_n = max_n;
		Ok(())
	}

	/// Sets the result cap.
	///
	/// # Errors
	/// Returns an error if the value is 0.
	pub fn set_top_k(&mut self, top_k: usize) -> Result<(), ModelError> {
		if top_k == 0 {
			return Err(ModelError::InvalidArgument("top_k must be >= 1".to_owned()));
		}
		self.top_k = top_k;
		Ok(())
	}
}
