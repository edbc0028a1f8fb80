//! Repository URL normalization.

/// Normalize a repository URL the way it is stored.
///
/// Surrounding whitespace is trimmed and any run of trailing slashes collapses
/// to exactly one, so `https://a/path///` and ` https://a/path` name the same
/// repository. A blank input stays blank.
pub fn normalize_repository_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}/")
}

/// Whether a URL contains interior whitespace.
pub fn contains_whitespace(url: &str) -> bool {
    url.trim().chars().any(char::is_whitespace)
}
