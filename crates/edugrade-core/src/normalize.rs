//! Markup and console text normalization.
//!
//! Normalization makes formatting, indentation, and auto-generated
//! attributes irrelevant to grading. Both sides of a comparison always go
//! through the same function.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").expect("valid regex"));

// `data-*` and `id` attributes, with the whitespace that separates them from
// the previous token. Quoted and unquoted values.
static INCIDENTAL_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+(?:data-[^\s=>/]*|id)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>"']+)"#)
        .expect("valid regex")
});

static BEFORE_TAG_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(/?>)").expect("valid regex"));

/// Normalize markup for string comparison.
///
/// Trims, strips `data-*` and `id` attributes, collapses whitespace runs to a
/// single space, removes whitespace between tags and before tag ends, and
/// lower-cases the result.
pub fn normalize_html(html: &str) -> String {
    let trimmed = html.trim();
    let stripped = INCIDENTAL_ATTRIBUTE.replace_all(trimmed, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let joined = BETWEEN_TAGS.replace_all(&collapsed, "><");
    let closed = BEFORE_TAG_END.replace_all(&joined, "$1");
    closed.trim().to_lowercase()
}

/// Normalize console output: trim and collapse whitespace runs.
pub fn normalize_console(output: &str) -> String {
    collapse_whitespace(output).into_owned()
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim();
    WHITESPACE.replace_all(trimmed, " ")
}

/// Split markup before every opening tag.
///
/// A boundary is a `<` followed by any character other than `/`, so closing
/// tags stay attached to the fragment they close. Whitespace-only fragments
/// are dropped; the remaining fragments are returned untrimmed.
pub fn split_fragments(markup: &str) -> Vec<&str> {
    let bytes = markup.as_bytes();
    let mut fragments = Vec::new();
    let mut start = 0;

    for (index, _) in markup.match_indices('<') {
        if index == 0 {
            continue;
        }
        match bytes.get(index + 1) {
            Some(b'/') | None => continue,
            Some(_) => {
                fragments.push(&markup[start..index]);
                start = index;
            }
        }
    }
    fragments.push(&markup[start..]);

    fragments
        .into_iter()
        .filter(|fragment| !fragment.trim().is_empty())
        .collect()
}
