use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::multigram_model::MultiGramModel;
use super::prediction_input::PredictionInput;

pub const EMPTY_AUTOCOMPLETE: &str = "enter text to get suggestions";
pub const FIRST_WORD: &str = "cannot autocomplete the first word; provide more context";
pub const NO_AUTOCOMPLETE: &str = "no autocomplete suggestions found";
pub const EMPTY_PREDICTION: &str = "enter text to get next-word predictions";
pub const NO_PREDICTION: &str = "no next-word predictions found";

/// One ranked candidate word.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Suggestion {
	pub token: String,
	/// Raw occurrence count under the matched context.
	pub count: usize,
	/// Share of the whole context distribution, in percent, rounded to 2 decimals.
	pub percentage: f64,
}

impl Suggestion {
	fn new(token: &str, count: usize, total: usize) -> Self {
		let percentage = (count as f64 / total as f64 * 100.0 * 100.0).round() / 100.0;
		Self { token: token.to_owned(), count, percentage }
	}

	/// The percentage as displayed to users, ex. `"66.67%"`.
	pub fn formatted_percentage(&self) -> String {
		format!("{:.2}%", self.percentage)
	}
}

impl fmt::Display for Suggestion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.token, self.formatted_percentage())
	}
}

/// Which table answered a query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MatchSource {
	pub order: usize,
	pub context: Vec<String>,
}

impl fmt::Display for MatchSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "found in {}-gram model with context (", self.order)?;
		for (i, word) in self.context.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{word:?}")?;
		}
		if self.context.len() == 1 {
			write!(f, ",")?;
		}
		write!(f, ")")
	}
}

/// Result of a query: ranked suggestions plus a human readable explanation.
///
/// An empty `suggestions` list is a normal outcome, `explanation` then says why.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
	pub suggestions: Vec<Suggestion>,
	pub source: Option<MatchSource>,
	pub explanation: String,
}

impl Prediction {
	fn empty(explanation: &str) -> Self {
		Self { suggestions: Vec::new(), source: None, explanation: explanation.to_owned() }
	}

	fn found(source: MatchSource, suggestions: Vec<Suggestion>) -> Self {
		Self { explanation: source.to_string(), source: Some(source), suggestions }
	}

	pub fn is_empty(&self) -> bool {
		self.suggestions.is_empty()
	}
}

/// Longest-context-first search shared by both queries.
///
/// Walks `n` from `max_n` down to 2 and stops at the first order whose
/// context exists AND leaves at least one candidate accepted by `keep`.
/// Orders the source is too short for, or that were never built, are skipped.
fn backoff<F>(
	models: &MultiGramModel,
	context_source: &[String],
	max_n: usize,
	top_k: usize,
	keep: F,
) -> Option<(MatchSource, Vec<Suggestion>)>
where
	F: Fn(&str) -> bool,
{
	for n in (2..=max_n).rev() {
		let context_length = n - 1;
		if context_source.len() < context_length {
			continue;
		}

		let context = &context_source[context_source.len() - context_length..];
		let Some(state) = models.order(n).and_then(|table| table.get(context)) else {
			debug!("{n}-gram: context {context:?} not found");
			continue;
		};

		let ranked = state.ranked(&keep);
		if ranked.is_empty() {
			debug!("{n}-gram: context {context:?} found but no candidate kept");
			continue;
		}

		let total = state.total();
		let suggestions = ranked
			.into_iter()
			.take(top_k)
			.map(|(word, count)| Suggestion::new(word, count, total))
			.collect();
		return Some((MatchSource { order: n, context: context.to_vec() }, suggestions));
	}
	None
}

/// Suggests completions for the last, partially typed word of `input_words`.
///
/// The words before it form the context. Candidates must start with the
/// partial word; when a context matches but no candidate does, a shorter
/// context is tried. Percentages are relative to every word seen after the
/// context, not only the matching ones. A `top_k` of 0 yields the "no
/// autocomplete" result, never a match without suggestions.
pub fn autocomplete(models: &MultiGramModel, input_words: &[String], max_n: usize, top_k: usize) -> Prediction {
	let Some((partial_word, context_words)) = input_words.split_last() else {
		return Prediction::empty(EMPTY_AUTOCOMPLETE);
	};
	if context_words.is_empty() {
		return Prediction::empty(FIRST_WORD);
	}
	if top_k == 0 {
		return Prediction::empty(NO_AUTOCOMPLETE);
	}

	match backoff(models, context_words, max_n, top_k, |word| word.starts_with(partial_word.as_str())) {
		Some((source, suggestions)) => Prediction::found(source, suggestions),
		None => Prediction::empty(NO_AUTOCOMPLETE),
	}
}

/// Predicts the words most likely to follow `input_words`.
///
/// A `top_k` of 0 asks for nothing and returns the "no prediction" result.
/// The first context found wins: every recorded context has at least one
/// follower, so there is nothing to filter out.
pub fn predict_next(models: &MultiGramModel, input_words: &[String], max_n: usize, top_k: usize) -> Prediction {
	if input_words.is_empty() {
		return Prediction::empty(EMPTY_PREDICTION);
	}
	if top_k == 0 {
		return Prediction::empty(NO_PREDICTION);
	}

	match backoff(models, input_words, max_n, top_k, |_| true) {
		Some((source, suggestions)) => Prediction::found(source, suggestions),
		None => Prediction::empty(NO_PREDICTION),
	}
}

/// Query front-end binding a borrowed model family to a `PredictionInput`.
#[derive(Clone, Copy, Debug)]
pub struct Predictor<'a> {
	models: &'a MultiGramModel,
	input: PredictionInput,
}

impl<'a> Predictor<'a> {
	pub fn new(models: &'a MultiGramModel, input: PredictionInput) -> Self {
		Self { models, input }
	}

	pub fn input(&self) -> &PredictionInput {
		&self.input
	}

	pub fn autocomplete(&self, input_words: &[String]) -> Prediction {
		autocomplete(self.models, input_words, self.input.max_n(), self.input.top_k())
	}

	pub fn predict_next(&self, input_words: &[String]) -> Prediction {
		predict_next(self.models, input_words, self.input.max_n(), self.input.top_k())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(text: &str) -> Vec<String> {
		text.split_whitespace().map(str::to_owned).collect()
	}

	fn lazy_model() -> MultiGramModel {
		MultiGramModel::build(&words("the lazy dog the lazy cat the lazy dog"), 3).unwrap()
	}

	fn pairs(prediction: &Prediction) -> Vec<(&str, String)> {
		prediction
			.suggestions
			.iter()
			.map(|s| (s.token.as_str(), s.formatted_percentage()))
			.collect()
	}

	#[test]
	fn predicts_from_trigram_context() {
		let model = lazy_model();
		let prediction = predict_next(&model, &words("the lazy"), 3, 5);

		assert_eq!(pairs(&prediction), vec![("dog", "66.67%".to_owned()), ("cat", "33.33%".to_owned())]);
		let source = prediction.source.unwrap();
		assert_eq!(source.order, 3);
		assert_eq!(source.context, words("the lazy"));
		assert_eq!(prediction.explanation, r#"found in 3-gram model with context ("the", "lazy")"#);
	}

	#[test]
	fn autocompletes_partial_word() {
		let model = lazy_model();
		let prediction = autocomplete(&model, &words("the lazy d"), 3, 5);

		assert_eq!(pairs(&prediction), vec![("dog", "66.67%".to_owned())]);
		assert_eq!(prediction.suggestions[0].count, 2);
		assert_eq!(prediction.source.unwrap().order, 3);
	}

	#[test]
	fn first_word_cannot_be_autocompleted() {
		let prediction = autocomplete(&lazy_model(), &words("dog"), 3, 5);
		assert!(prediction.is_empty());
		assert!(prediction.source.is_none());
		assert_eq!(prediction.explanation, FIRST_WORD);
	}

	#[test]
	fn empty_input_is_not_an_error() {
		let model = lazy_model();
		assert_eq!(autocomplete(&model, &[], 3, 5).explanation, EMPTY_AUTOCOMPLETE);
		assert_eq!(predict_next(&model, &[], 3, 5).explanation, EMPTY_PREDICTION);
	}

	#[test]
	fn unseen_context_yields_no_result() {
		let model = lazy_model();
		let prediction = predict_next(&model, &words("purple elephant"), 3, 5);
		assert!(prediction.is_empty());
		assert_eq!(prediction.explanation, NO_PREDICTION);

		let prediction = autocomplete(&model, &words("purple elephant d"), 3, 5);
		assert!(prediction.is_empty());
		assert_eq!(prediction.explanation, NO_AUTOCOMPLETE);
	}

	#[test]
	fn backs_off_to_shorter_context() {
		let model = lazy_model();
		// ("purple", "lazy") is unknown at order 3, ("lazy",) is known at order 2
		let prediction = predict_next(&model, &words("purple lazy"), 3, 5);
		let source = prediction.source.clone().unwrap();
		assert_eq!(source.order, 2);
		assert_eq!(source.context, words("lazy"));
		assert_eq!(prediction.explanation, r#"found in 2-gram model with context ("lazy",)"#);
		assert_eq!(pairs(&prediction), vec![("dog", "66.67%".to_owned()), ("cat", "33.33%".to_owned())]);
	}

	#[test]
	fn autocomplete_retries_when_filter_empties_candidates() {
		// ("x", "y") is only followed by "b"; ("y",) is also followed by "a..."
		let model = MultiGramModel::build(&words("x y b z y apple z y b"), 3).unwrap();

		let prediction = autocomplete(&model, &words("x y a"), 3, 5);
		let source = prediction.source.clone().unwrap();
		assert_eq!(source.order, 2);
		assert_eq!(source.context, words("y"));
		// total for ("y",) is 3: b twice, apple once
		assert_eq!(pairs(&prediction), vec![("apple", "33.33%".to_owned())]);

		// Next-word prediction stops at the first matched context
		let prediction = predict_next(&model, &words("x y"), 3, 5);
		assert_eq!(pairs(&prediction), vec![("b", "100.00%".to_owned())]);
		assert_eq!(prediction.source.unwrap().order, 3);
	}

	#[test]
	fn short_input_skips_orders_it_cannot_fill() {
		let model = lazy_model();
		let prediction = predict_next(&model, &words("lazy"), 3, 5);
		assert_eq!(prediction.source.unwrap().order, 2);
	}

	#[test]
	fn query_order_above_family_is_skipped() {
		let model = lazy_model();
		let prediction = predict_next(&model, &words("x the lazy"), 6, 5);
		assert_eq!(prediction.source.unwrap().order, 3);
	}

	#[test]
	fn caps_results_and_never_breaks_prefix() {
		let model = MultiGramModel::build(&words("go da go db go dc go dd go x go da"), 2).unwrap();

		let prediction = autocomplete(&model, &words("go d"), 2, 2);
		assert_eq!(prediction.suggestions.len(), 2);
		assert_eq!(prediction.suggestions[0].token, "da");
		// tie between db, dc, dd resolved lexicographically
		assert_eq!(prediction.suggestions[1].token, "db");
		assert!(prediction.suggestions.iter().all(|s| s.token.starts_with('d')));
	}

	#[test]
	fn zero_top_k_reports_nothing_found() {
		let model = lazy_model();

		let prediction = predict_next(&model, &words("the lazy"), 3, 0);
		assert!(prediction.is_empty());
		assert!(prediction.source.is_none());
		assert_eq!(prediction.explanation, NO_PREDICTION);

		let prediction = autocomplete(&model, &words("the lazy d"), 3, 0);
		assert!(prediction.is_empty());
		assert!(prediction.source.is_none());
		assert_eq!(prediction.explanation, NO_AUTOCOMPLETE);
	}

	#[test]
	fn reported_context_exists_in_reported_table() {
		let model = lazy_model();
		for input in ["the lazy", "lazy", "dog the", "cat"] {
			let prediction = predict_next(&model, &words(input), 3, 5);
			let source = prediction.source.unwrap();
			let state = model.order(source.order).unwrap().get(&source.context).unwrap();
			assert_eq!(state.context().len(), source.order - 1);
		}
	}

	#[test]
	fn predictor_uses_its_input() {
		let model = lazy_model();
		let predictor = Predictor::new(&model, PredictionInput::new(3, 1).unwrap());
		assert_eq!(predictor.predict_next(&words("the lazy")).suggestions.len(), 1);
		assert_eq!(predictor.autocomplete(&words("the lazy c")).suggestions[0].token, "cat");
	}

	#[test]
	fn suggestion_display() {
		let suggestion = Suggestion::new("dog", 2, 3);
		assert_eq!(suggestion.percentage, 66.67);
		assert_eq!(suggestion.to_string(), "dog (66.67%)");
	}
}
