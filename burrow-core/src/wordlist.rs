use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Trimmed, non-empty, non-comment lines in file order.
pub fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Load wordlist from file
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::WordlistRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let words = parse_wordlist(&content);
    if words.is_empty() {
        return Err(ConfigError::WordlistEmpty {
            path: path.to_path_buf(),
        });
    }

    Ok(words)
}
