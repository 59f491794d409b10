use thiserror::Error;

/// Errors raised while building, merging or loading n-gram models.
///
/// Query operations never return this type: an unanswerable query is a
/// normal, empty `Prediction` carrying an explanation.
#[derive(Debug, Error)]
pub enum ModelError {
	/// A caller-supplied parameter is outside its valid range (ex. `max_n < 2`).
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// Two models (or two states) of different shape were merged.
	#[error("order mismatch: expected {expected}, found {found}")]
	OrderMismatch { expected: usize, found: usize },

	/// Reading a corpus from disk failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
