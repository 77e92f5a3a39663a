//! Path utilities for file naming and lossy path display.
//!
//! [`ILLEGAL_FILENAME_CHARS`] is the single source of truth for which characters
//! may not appear in a generated file or directory name. E-reader stores such as
//! Rakuten Kobo reject files containing any of them.

use std::path::Path;

/// Characters replaced by [`sanitize_filename`].
pub const ILLEGAL_FILENAME_CHARS: [char; 7] = [':', '?', '"', '*', '\\', '|', '/'];

/// Replacement for every character in [`ILLEGAL_FILENAME_CHARS`].
pub const FILENAME_REPLACEMENT: char = ' ';

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Gets the file name from a path with fallback to lossy conversion.
///
/// # Returns
///
/// * `String` - The file name, or `"unknown"` when the path has none
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Checks if a filename starts with a dot (hidden file).
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Returns the lowercase extension of a path, if it has a UTF-8 one.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Sanitizes a filename by replacing every illegal character with a space.
///
/// # Arguments
///
/// * `filename` - The filename to sanitize
///
/// # Returns
///
/// * `String` - The sanitized filename, same length in characters as the input
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if ILLEGAL_FILENAME_CHARS.contains(&c) {
                FILENAME_REPLACEMENT
            } else {
                c
            }
        })
        .collect()
}
