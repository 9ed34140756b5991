//! Grader error types.
//!
//! These errors never escape `grade_html` / `grade_console`: the grader
//! converts them into a failing `GraderResult`. They are public so that
//! phrase-table loading and custom grading pipelines can surface them.

use thiserror::Error;

/// Errors that can occur inside the grader.
#[derive(Debug, Error)]
pub enum GradeError {
    /// A CSS selector used to walk the parsed document failed to build.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// A phrase-table entry cannot be used for substitution.
    #[error("invalid phrase pair for {language}: {reason}")]
    InvalidPhrase { language: String, reason: String },

    /// A substitution pattern failed to compile.
    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),
}
