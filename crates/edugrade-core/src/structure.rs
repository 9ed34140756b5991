//! Structural view of a markup string.

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::error::GradeError;
use crate::normalize::normalize_html;

/// Text, element sequence, and normalized form of one markup string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlStructure {
    /// Visible text of the document body, trimmed.
    pub text_content: String,
    /// Lower-cased tag names of every body descendant, in document order.
    pub tags: Vec<String>,
    /// The raw markup after [`normalize_html`].
    pub normalized_html: String,
}

impl HtmlStructure {
    /// Parse markup permissively, the way a browser builds a document.
    ///
    /// Malformed input (unclosed or stray tags) is repaired by the HTML5
    /// tree builder rather than rejected.
    pub fn parse(html: &str) -> Result<Self, GradeError> {
        let document = Html::parse_document(html);
        let body_selector = selector("body")?;
        let element_selector = selector("body *")?;

        let text_content = document
            .select(&body_selector)
            .next()
            .map(|body| body.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();

        let tags = document
            .select(&element_selector)
            .map(|element| element.value().name().to_lowercase())
            .collect();

        Ok(Self {
            text_content,
            tags,
            normalized_html: normalize_html(html),
        })
    }

    /// The first element, if any.
    pub fn first_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn tag_set(&self) -> HashSet<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Whether every tag of `other` also appears somewhere in `self`.
    pub fn has_all_tags_of(&self, other: &HtmlStructure) -> bool {
        let own = self.tag_set();
        other.tags.iter().all(|tag| own.contains(tag.as_str()))
    }
}

/// Tags of `expected` that never occur in `actual`, deduplicated, in the
/// order they first appear in `expected`.
pub fn missing_tags<'a>(expected: &'a [String], actual: &[String]) -> Vec<&'a str> {
    let actual: HashSet<&str> = actual.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    expected
        .iter()
        .map(String::as_str)
        .filter(|tag| seen.insert(*tag) && !actual.contains(tag))
        .collect()
}

fn selector(css: &str) -> Result<Selector, GradeError> {
    Selector::parse(css).map_err(|e| GradeError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn parse_text_and_tags() {
        let s = HtmlStructure::parse("<div><span>Hello</span> <b>World</b></div>").unwrap();
        assert_eq!(s.text_content, "Hello World");
        assert_eq!(s.tags, tags(&["div", "span", "b"]));
        assert_eq!(s.first_tag(), Some("div"));
    }

    #[test]
    fn parse_lowercases_tag_names() {
        let s = HtmlStructure::parse("<DIV><P>Text</P></DIV>").unwrap();
        assert_eq!(s.tags, tags(&["div", "p"]));
    }

    #[test]
    fn parse_plain_text() {
        let s = HtmlStructure::parse("  just text  ").unwrap();
        assert_eq!(s.text_content, "just text");
        assert!(s.tags.is_empty());
        assert_eq!(s.first_tag(), None);
    }

    #[test]
    fn parse_empty_markup() {
        let s = HtmlStructure::parse("").unwrap();
        assert_eq!(s.text_content, "");
        assert!(s.tags.is_empty());
        assert_eq!(s.normalized_html, "");
    }

    #[test]
    fn parse_repairs_unclosed_tags() {
        let s = HtmlStructure::parse("<ul><li>One<li>Two").unwrap();
        assert_eq!(s.tags, tags(&["ul", "li", "li"]));
        assert_eq!(s.text_content, "OneTwo");
    }

    #[test]
    fn parse_survives_nul_bytes() {
        let s = HtmlStructure::parse("<p>a\0b</p>\0<div").unwrap();
        assert_eq!(s.first_tag(), Some("p"));
    }

    #[test]
    fn missing_tags_in_expected_order() {
        let expected = tags(&["div", "span", "b", "span"]);
        let actual = tags(&["div"]);
        assert_eq!(missing_tags(&expected, &actual), vec!["span", "b"]);
        assert!(missing_tags(&actual, &expected).is_empty());
    }

    #[test]
    fn tag_superset_ignores_order_and_count() {
        let user = HtmlStructure::parse("<p>x</p><h1>y</h1><p>z</p>").unwrap();
        let expected = HtmlStructure::parse("<h1>y</h1><p>x</p>").unwrap();
        assert!(user.has_all_tags_of(&expected));
        assert!(!expected.has_all_tags_of(&HtmlStructure::parse("<ul></ul>").unwrap()));
    }
}
