//! TOML assignment set parser.
//!
//! Loads assignment sets from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Assignment, AssignmentSet, LanguageTag, OutputKind};
use crate::structure::HtmlStructure;

/// Intermediate TOML structure for parsing assignment set files.
#[derive(Debug, Deserialize)]
struct TomlAssignmentFile {
    assignment_set: TomlSetHeader,
    #[serde(default)]
    assignments: Vec<TomlAssignment>,
}

#[derive(Debug, Deserialize)]
struct TomlSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    default_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlAssignment {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    course_id: Option<String>,
    module_id: String,
    kind: String,
    expected: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse a single TOML file into an `AssignmentSet`.
pub fn parse_assignment_set(path: &Path) -> Result<AssignmentSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assignment set file: {}", path.display()))?;

    parse_assignment_set_str(&content, path)
}

/// Parse a TOML string into an `AssignmentSet` (useful for testing).
pub fn parse_assignment_set_str(content: &str, source_path: &Path) -> Result<AssignmentSet> {
    let parsed: TomlAssignmentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_language: Option<LanguageTag> = parsed
        .assignment_set
        .default_language
        .as_deref()
        .map(|l| l.parse().map_err(|e: String| anyhow::anyhow!("{}", e)))
        .transpose()?;

    let course_id = parsed
        .assignment_set
        .course_id
        .unwrap_or_else(|| parsed.assignment_set.id.clone());

    let assignments = parsed
        .assignments
        .into_iter()
        .map(|a| {
            let language = a
                .language
                .map(|l| l.parse().map_err(|e: String| anyhow::anyhow!("{}", e)))
                .transpose()?;
            let kind: OutputKind = a
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("assignment {}: {}", a.id, e))?;

            Ok(Assignment {
                id: a.id,
                title: a.title,
                description: a.description,
                course_id: a.course_id.unwrap_or_else(|| course_id.clone()),
                module_id: a.module_id,
                kind,
                expected: a.expected,
                language,
                tags: a.tags,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AssignmentSet {
        id: parsed.assignment_set.id,
        name: parsed.assignment_set.name,
        description: parsed.assignment_set.description,
        course_id,
        default_language,
        assignments,
    })
}

/// Recursively load all `.toml` assignment set files from a directory.
pub fn load_assignment_directory(dir: &Path) -> Result<Vec<AssignmentSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_assignment_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_assignment_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or every set under a directory.
pub fn load_assignments(path: &Path) -> Result<Vec<AssignmentSet>> {
    if path.is_dir() {
        load_assignment_directory(path)
    } else {
        Ok(vec![parse_assignment_set(path)?])
    }
}

/// A warning from assignment set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The assignment ID (if applicable).
    pub assignment_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an assignment set for common authoring mistakes.
pub fn validate_assignment_set(set: &AssignmentSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.assignments.is_empty() {
        warnings.push(ValidationWarning {
            assignment_id: None,
            message: "assignment set has no assignments".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for assignment in &set.assignments {
        if !seen_ids.insert(&assignment.id) {
            warnings.push(ValidationWarning {
                assignment_id: Some(assignment.id.clone()),
                message: format!("duplicate assignment ID: {}", assignment.id),
            });
        }
    }

    for assignment in &set.assignments {
        let warn = |message: &str| ValidationWarning {
            assignment_id: Some(assignment.id.clone()),
            message: message.to_string(),
        };

        if assignment.expected.trim().is_empty() {
            warnings.push(warn("expected output is empty"));
            continue;
        }

        if assignment.module_id.trim().is_empty() {
            warnings.push(warn("module_id is empty"));
        }

        match assignment.kind {
            OutputKind::Html => {
                let has_elements = HtmlStructure::parse(&assignment.expected)
                    .map(|s| !s.tags.is_empty())
                    .unwrap_or(false);
                if !has_elements {
                    warnings.push(warn(
                        "html assignment expects no elements; only text will be compared",
                    ));
                }
            }
            OutputKind::Console => {
                let trimmed = assignment.expected.trim();
                if trimmed.starts_with('<') && trimmed.ends_with('>') {
                    warnings.push(warn("console assignment expects markup; did you mean kind = \"html\"?"));
                }
            }
        }
    }

    warnings
}
