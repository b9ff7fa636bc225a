//! Substring query shaping for `LIKE`-based note search.

/// Escape character used in generated `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Returns the trimmed query, or `None` when it is blank.
///
/// Blank queries never reach storage: they would otherwise match every row.
pub fn normalize_search_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Builds a `%...%` pattern that matches `query` literally.
///
/// `%`, `_` and the escape character itself are escaped, so user input
/// cannot act as a wildcard.
pub fn like_contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
