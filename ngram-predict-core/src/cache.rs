use std::num::NonZeroUsize;
use std::sync::Arc;

use log::debug;
use lru::LruCache;

use crate::error::ModelError;
use crate::model::multigram_model::MultiGramModel;
use crate::text;

/// Memoizes model builds keyed by `(cleaned text, max_n)`.
///
/// Built families are shared as immutable `Arc` snapshots. When `capacity`
/// is reached the least recently used entry is evicted.
#[derive(Debug)]
pub struct ModelCache {
	entries: LruCache<(String, usize), Arc<MultiGramModel>>,
}

impl ModelCache {
	/// # Errors
	/// Returns `InvalidArgument` if `capacity == 0`.
	pub fn new(capacity: usize) -> Result<Self, ModelError> {
		let capacity = NonZeroUsize::new(capacity)
			.ok_or_else(|| ModelError::InvalidArgument("cache capacity must be >= 1".to_owned()))?;
		Ok(Self { entries: LruCache::new(capacity) })
	}

	/// Returns the family for `raw_text`, building it on a miss.
	///
	/// The text is cleaned and tokenized first, so texts differing only by
	/// case or whitespace share an entry.
	pub fn get_or_build(&mut self, raw_text: &str, max_n: usize) -> Result<Arc<MultiGramModel>, ModelError> {
		let key = (text::clean(raw_text), max_n);
		if let Some(model) = self.entries.get(&key).cloned() {
			debug!("model cache hit ({} entries)", self.entries.len());
			return Ok(model);
		}

		let model = Arc::new(MultiGramModel::build(&text::tokenize(&key.0), max_n)?);
		self.entries.put(key, Arc::clone(&model));
		Ok(model)
	}

	pub fn contains(&self, raw_text: &str, max_n: usize) -> bool {
		self.entries.contains(&(text::clean(raw_text), max_n))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
