//! The assignment grader.
//!
//! Compares learner output against a stored reference and explains the first
//! discrepancy it finds. HTML is checked through an ordered cascade; the
//! order matters because later checks are more lenient than earlier ones
//! and can disagree with them on partially overlapping inputs.

use once_cell::sync::Lazy;

use crate::error::GradeError;
use crate::lenient::{LenientMatcher, PhraseTable};
use crate::messages::Messages;
use crate::model::{Assignment, GraderResult, LanguageTag, OutputKind};
use crate::normalize::{normalize_console, normalize_html, split_fragments};
use crate::structure::{missing_tags, HtmlStructure};

static DEFAULT_GRADER: Lazy<Grader> = Lazy::new(Grader::new);

/// Grade HTML markup with the builtin phrase table.
pub fn grade_html(user_html: &str, expected_html: &str, language: Option<LanguageTag>) -> GraderResult {
    DEFAULT_GRADER.grade_html(user_html, expected_html, language)
}

/// Grade console output with the builtin phrase table.
pub fn grade_console(output: &str, expected: &str, language: Option<LanguageTag>) -> GraderResult {
    DEFAULT_GRADER.grade_console(output, expected, language)
}

/// Stateless grading service.
///
/// Holds only the compiled phrase substitutions, so one instance can be
/// shared freely between threads.
#[derive(Debug, Clone)]
pub struct Grader {
    matcher: LenientMatcher,
}

impl Default for Grader {
    fn default() -> Self {
        Self::new()
    }
}

impl Grader {
    /// A grader using [`PhraseTable::builtin`].
    pub fn new() -> Self {
        match Self::with_phrases(&PhraseTable::builtin()) {
            Ok(grader) => grader,
            Err(err) => {
                tracing::warn!("builtin phrase table rejected, lenient matching disabled: {err}");
                Self::without_phrases()
            }
        }
    }

    /// A grader that only case-folds when matching leniently.
    pub fn without_phrases() -> Self {
        Self {
            matcher: LenientMatcher::default(),
        }
    }

    /// A grader using a custom phrase table.
    pub fn with_phrases(table: &PhraseTable) -> Result<Self, GradeError> {
        Ok(Self {
            matcher: LenientMatcher::new(table)?,
        })
    }

    /// Grade an assignment's output, dispatching on its kind.
    ///
    /// The assignment's own language wins over `fallback`.
    pub fn grade_assignment(
        &self,
        assignment: &Assignment,
        output: &str,
        fallback: LanguageTag,
    ) -> GraderResult {
        let language = Some(assignment.language.unwrap_or(fallback));
        match assignment.kind {
            OutputKind::Html => self.grade_html(output, &assignment.expected, language),
            OutputKind::Console => self.grade_console(output, &assignment.expected, language),
        }
    }

    /// Decide whether `user_html` satisfies `expected_html`.
    ///
    /// Never fails: internal errors become a failing result whose details
    /// carry the raw inputs.
    pub fn grade_html(
        &self,
        user_html: &str,
        expected_html: &str,
        language: Option<LanguageTag>,
    ) -> GraderResult {
        let language = language.unwrap_or_default();
        let messages = Messages::for_language(language);

        match self.try_grade_html(user_html, expected_html, language, &messages) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("html grading failed, reporting as incorrect: {err}");
                GraderResult::fail(messages.incorrect(), expected_html, user_html)
            }
        }
    }

    fn try_grade_html(
        &self,
        user_html: &str,
        expected_html: &str,
        language: LanguageTag,
        messages: &Messages,
    ) -> Result<GraderResult, GradeError> {
        let user = HtmlStructure::parse(user_html)?;
        let expected = HtmlStructure::parse(expected_html)?;

        if user.normalized_html == expected.normalized_html {
            tracing::debug!(check = "normalized", "html accepted");
            return Ok(GraderResult::pass(messages.correct()));
        }

        // Only a phrase table relaxes this check; otherwise texts must agree.
        let texts_match = user.text_content == expected.text_content
            || (self.matcher.has_phrases(language)
                && self
                    .matcher
                    .equivalent(&user.text_content, &expected.text_content, language));
        if !texts_match && !user.text_content.is_empty() && !expected.text_content.is_empty() {
            tracing::debug!(check = "text", "html rejected");
            return Ok(GraderResult::fail(
                messages.expected_output(&expected.text_content, &user.text_content),
                expected.text_content,
                user.text_content,
            ));
        }

        if let Some(missing) = missing_tags(&expected.tags, &user.tags).first() {
            tracing::debug!(check = "tags", missing = %missing, "html rejected");
            let wrapped = format!("<{missing}>");
            return Ok(match user.first_tag() {
                Some(first) if first != *missing => GraderResult::fail(
                    messages.expected_element(missing, first),
                    wrapped,
                    format!("<{first}>"),
                ),
                _ => GraderResult::fail(
                    messages.missing_element(missing),
                    wrapped,
                    messages.absent(),
                ),
            });
        }

        // An empty reference is contained in anything; it must not pass here.
        if !expected.normalized_html.is_empty()
            && user.normalized_html.contains(&expected.normalized_html)
        {
            tracing::debug!(check = "containment", "html accepted");
            return Ok(GraderResult::pass(messages.correct()));
        }

        if all_fragments_present(expected_html, &user.normalized_html) {
            tracing::debug!(check = "fragments", "html accepted");
            return Ok(GraderResult::pass(messages.correct()));
        }

        if self
            .matcher
            .equivalent(&user.text_content, &expected.text_content, language)
            && user.has_all_tags_of(&expected)
        {
            tracing::debug!(check = "lenient", "html accepted");
            return Ok(GraderResult::pass(messages.correct()));
        }

        tracing::debug!(check = "fallback", "html rejected");
        Ok(GraderResult::fail(
            messages.incorrect(),
            expected_html,
            user_html,
        ))
    }

    /// Decide whether console `output` matches `expected`.
    pub fn grade_console(
        &self,
        output: &str,
        expected: &str,
        language: Option<LanguageTag>,
    ) -> GraderResult {
        let language = language.unwrap_or_default();
        let messages = Messages::for_language(language);

        let normalized_output = normalize_console(output);
        let normalized_expected = normalize_console(expected);

        if normalized_output == normalized_expected
            || self
                .matcher
                .matches_exactly(&normalized_output, &normalized_expected, language)
        {
            return GraderResult::pass(messages.correct());
        }

        GraderResult::fail(
            messages.console_mismatch(&normalized_expected, &normalized_output),
            normalized_expected,
            normalized_output,
        )
    }
}

/// Whether every opening-tag fragment of the raw expected markup occurs in
/// the normalized user markup. Requires at least one non-empty fragment.
fn all_fragments_present(expected_html: &str, normalized_user: &str) -> bool {
    let fragments: Vec<String> = split_fragments(expected_html)
        .into_iter()
        .map(|fragment| normalize_html(fragment.trim()))
        .filter(|fragment| !fragment.is_empty())
        .collect();

    !fragments.is_empty()
        && fragments
            .iter()
            .all(|fragment| normalized_user.contains(fragment.as_str()))
}
