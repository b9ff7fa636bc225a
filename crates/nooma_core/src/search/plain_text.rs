//! Plain-text projection of note markup.
//!
//! # Invariants
//! - Exactly the characters `# * ` _ ~ [ ] ( )` are removed.
//! - Nothing is inserted in their place; surrounding text is concatenated.
//! - Everything else is kept verbatim, except that the result is trimmed of
//!   leading and trailing whitespace.
//!
//! This is a lossy projection for search and previews, not a renderer.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKUP_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`_~\[\]()]").expect("valid markup character regex"));

/// Removes markup characters from `content`.
pub fn strip_markup(content: &str) -> String {
    MARKUP_CHARS_RE.replace_all(content, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::strip_markup;

    #[test]
    fn strips_heading_and_emphasis_markers() {
        assert_eq!(strip_markup("# Hello *world*"), "Hello world");
    }

    #[test]
    fn concatenates_text_around_removed_characters() {
        assert_eq!(
            strip_markup("[link](https://example.com) ~~gone~~ `code` __b__"),
            "linkhttps://example.com gone code b"
        );
    }

    #[test]
    fn keeps_other_punctuation_and_whitespace() {
        assert_eq!(strip_markup("- item!\n> quote"), "- item!\n> quote");
    }

    #[test]
    fn trims_only_the_outer_whitespace() {
        assert_eq!(strip_markup("## Title\n\nbody  *x* "), "Title\n\nbody  x");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(strip_markup(""), "");
    }
}
