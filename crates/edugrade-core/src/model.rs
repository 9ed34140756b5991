//! Core data model types for edugrade.
//!
//! Grading verdicts, language tags, and the assignment definitions that
//! the batch engine grades learner output against.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The verdict of a single grading call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraderResult {
    /// Whether the learner's output was accepted.
    pub ok: bool,
    /// Localized, human-readable explanation.
    pub message: String,
    /// The expected/actual fragment behind a failure, when one can be identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<GradeDetails>,
}

/// Expected vs. actual fragment attached to a failing verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDetails {
    pub expected: String,
    pub actual: String,
}

impl GraderResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn fail(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            message: message.into(),
            details: Some(GradeDetails {
                expected: expected.into(),
                actual: actual.into(),
            }),
        }
    }
}

/// Supported UI languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    #[default]
    Ru,
    Kz,
    En,
}

impl LanguageTag {
    /// All supported languages, default first.
    pub const ALL: [LanguageTag; 3] = [LanguageTag::Ru, LanguageTag::Kz, LanguageTag::En];

    /// Whether this is the language the reference outputs are authored in.
    pub fn is_default(self) -> bool {
        self == LanguageTag::default()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageTag::Ru => write!(f, "ru"),
            LanguageTag::Kz => write!(f, "kz"),
            LanguageTag::En => write!(f, "en"),
        }
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "rus" => Ok(LanguageTag::Ru),
            "kz" | "kk" | "kaz" => Ok(LanguageTag::Kz),
            "en" | "eng" => Ok(LanguageTag::En),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for LanguageTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What kind of output an assignment produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Markup captured from the rendered document body.
    Html,
    /// Text written to the console.
    Console,
}

impl OutputKind {
    /// File extension a submission of this kind is stored under.
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Html => "html",
            OutputKind::Console => "txt",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Html => write!(f, "html"),
            OutputKind::Console => write!(f, "console"),
        }
    }
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(OutputKind::Html),
            "console" | "text" | "txt" => Ok(OutputKind::Console),
            other => Err(format!("unknown output kind: {other}")),
        }
    }
}

/// A single exercise with a stored reference output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier within its set.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Course this assignment belongs to.
    pub course_id: String,
    /// Module within the course.
    pub module_id: String,
    /// Whether the expected value is markup or console text.
    pub kind: OutputKind,
    /// The reference output.
    pub expected: String,
    /// Language override for this assignment.
    #[serde(default)]
    pub language: Option<LanguageTag>,
    /// Tags for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A collection of assignments, usually one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Course the assignments belong to unless they override it.
    pub course_id: String,
    /// Language used for assignments that don't specify one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<LanguageTag>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl AssignmentSet {
    /// The language an assignment is graded in: its own, else the set's,
    /// else `fallback`.
    pub fn language_for(&self, assignment: &Assignment, fallback: LanguageTag) -> LanguageTag {
        assignment
            .language
            .or(self.default_language)
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_display_and_parse() {
        assert_eq!(LanguageTag::Ru.to_string(), "ru");
        assert_eq!(LanguageTag::Kz.to_string(), "kz");
        assert_eq!("RU".parse::<LanguageTag>().unwrap(), LanguageTag::Ru);
        assert_eq!("kk".parse::<LanguageTag>().unwrap(), LanguageTag::Kz);
        assert_eq!("eng".parse::<LanguageTag>().unwrap(), LanguageTag::En);
        assert!("de".parse::<LanguageTag>().is_err());
    }

    #[test]
    fn language_deserializes_aliases() {
        let tag: LanguageTag = serde_json::from_str("\"KK\"").unwrap();
        assert_eq!(tag, LanguageTag::Kz);
        assert_eq!(serde_json::to_string(&LanguageTag::Kz).unwrap(), "\"kz\"");
        assert!(serde_json::from_str::<LanguageTag>("\"fr\"").is_err());
    }

    #[test]
    fn default_language_is_russian() {
        assert_eq!(LanguageTag::default(), LanguageTag::Ru);
        assert!(LanguageTag::Ru.is_default());
        assert!(!LanguageTag::Kz.is_default());
    }

    #[test]
    fn output_kind_parse() {
        assert_eq!("HTML".parse::<OutputKind>().unwrap(), OutputKind::Html);
        assert_eq!("text".parse::<OutputKind>().unwrap(), OutputKind::Console);
        assert_eq!(OutputKind::Console.extension(), "txt");
        assert!("pdf".parse::<OutputKind>().is_err());
    }

    #[test]
    fn passing_result_omits_details_in_json() {
        let result = GraderResult::pass("ok");
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("details"));

        let result = GraderResult::fail("no", "<span>", "<div>");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["details"]["expected"], "<span>");
        assert_eq!(json["details"]["actual"], "<div>");
    }
}
