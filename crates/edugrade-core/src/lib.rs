//! edugrade-core — Assignment grading engine, progress tracking, and reports.
//!
//! This crate defines the grader that compares learner HTML or console output
//! against an expected reference, plus the data model, batch engine, and
//! persistence seams that the edugrade CLI builds on.

pub mod config;
pub mod engine;
pub mod error;
pub mod grader;
pub mod lenient;
pub mod messages;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod progress;
pub mod report;
pub mod structure;

pub use error::GradeError;
pub use grader::{grade_console, grade_html, Grader};
pub use model::{GradeDetails, GraderResult, LanguageTag};
