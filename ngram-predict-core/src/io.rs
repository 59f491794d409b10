use std::fs;
use std::path::Path;

use log::info;

use crate::error::ModelError;
use crate::text;

/// Reads a UTF-8 text file into memory.
pub fn read_text<P: AsRef<Path>>(filename: P) -> Result<String, ModelError> {
	let contents = fs::read_to_string(&filename)?;
	info!("read {} characters from {}", contents.chars().count(), filename.as_ref().display());
	Ok(contents)
}

/// Reads a corpus file, cleans it and splits it into tokens.
pub fn read_tokens<P: AsRef<Path>>(filename: P) -> Result<Vec<String>, ModelError> {
	let tokens = text::tokenize(&text::clean(&read_text(filename)?));
	info!("found {} tokens", tokens.len());
	Ok(tokens)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/corpus.txt"` → `"corpus"`
/// - `"corpus.txt"` → `"corpus"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> Result<String, ModelError> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| ModelError::InvalidArgument("path has no filename".to_owned()))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Lists the base names of all files with a given extension in a directory.
///
/// Sorted, extension removed.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<String>, ModelError> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(get_filename(&path)?);
		}
	}

	files.sort();
	Ok(files)
}
