use std::sync::LazyLock;

use regex::Regex;

/// Runs of whitespace, collapsed to a single space by `clean`.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Failed to build regex"));

/// A word (letters, digits, underscore, with inner apostrophes or hyphens),
/// or any single character that is neither a word character nor whitespace.
static TOKEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\w+(?:['’-]\w+)*|[^\w\s]").expect("Failed to build regex"));

/// Normalizes raw training text.
///
/// - Collapses whitespace runs to one space
/// - Trims both ends
/// - Lowercases
pub fn clean(raw: &str) -> String {
	WHITESPACE.replace_all(raw, " ").trim().to_lowercase()
}

/// Splits cleaned text into word tokens.
///
/// Punctuation marks become tokens of their own, so `"dog, cat."` gives
/// `["dog", ",", "cat", "."]`. Contractions stay whole (`"don't"`).
pub fn tokenize(text: &str) -> Vec<String> {
	TOKEN.find_iter(text).map(|m| m.as_str().to_owned()).collect()
}

/// Splits a user query into words: lowercased, trimmed, whitespace separated.
///
/// Unlike `tokenize`, punctuation stays attached, so a partially typed word
/// is kept exactly as typed.
pub fn split_input(text: &str) -> Vec<String> {
	text.to_lowercase().split_whitespace().map(str::to_owned).collect()
}
