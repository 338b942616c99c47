// Cache path utilities.
// Locates the cache directory and turns cache keys into safe file names.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Extension given to keys that do not carry one.
pub const CACHE_EXTENSION: &str = "csv";

/// Get the platform cache directory (~/.cache/acquire on Linux).
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "acquire").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// File name for a cache key.
/// Keys without an extension get `.csv`; path separators and reserved characters become underscores.
pub fn entry_file_name(key: &str) -> String {
    let name = sanitize_name(key.trim());
    let name = if name.is_empty() || name.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        name
    };

    if name.contains('.') && !name.ends_with('.') {
        name
    } else {
        format!("{}.{}", name.trim_end_matches('.'), CACHE_EXTENSION)
    }
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}
