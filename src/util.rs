//! Utility functions shared across lectern modules.

use std::fs;
use std::path::Path;

use crate::error::{LecternError, Result};

/// Maximum file size that can be read into memory (10 MB).
///
/// Guards config and state reads against unexpectedly large files.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a file into a string with size limit protection.
///
/// Returns an error if the file exceeds `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| LecternError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(LecternError::serde(format!(
            "file {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| LecternError::storage(path, e))
}

/// Count whitespace-separated words in a block of text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count occurrences of a marker token in a block of text.
///
/// Plain substring occurrences; markers are literal tokens like `[pause]`.
pub fn marker_count(text: &str, marker: &str) -> usize {
    if marker.is_empty() {
        return 0;
    }
    text.matches(marker).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_to_string_limited_success() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.txt");
        fs::write(&path, "Hello, world!").unwrap();

        let content = read_to_string_limited(&path).unwrap();
        assert_eq!(content, "Hello, world!");
    }

    #[test]
    fn test_read_to_string_limited_nonexistent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.txt");

        let result = read_to_string_limited(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_to_string_with_limit_at_boundary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("boundary.txt");

        let content = "x".repeat(100);
        fs::write(&path, &content).unwrap();

        // At the limit passes, one byte over fails
        assert!(read_to_string_with_limit(&path, 100).is_ok());
        let err = read_to_string_with_limit(&path, 99).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(err.to_string().contains("100 bytes"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("the quick  brown\tfox"), 4);
        assert_eq!(word_count("line one\nline two"), 4);
    }

    #[test]
    fn test_marker_count() {
        assert_eq!(marker_count("", "[pause]"), 0);
        assert_eq!(marker_count("no markers here", "[pause]"), 0);
        assert_eq!(marker_count("a [pause] b [pause] c", "[pause]"), 2);
        assert_eq!(marker_count("[pause][pause]", "[pause]"), 2);
        assert_eq!(marker_count("anything", ""), 0);
    }
}
