//! Grading report types with JSON persistence and regression detection.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AssignmentSet, GraderResult, LanguageTag, OutputKind};

/// A complete batch grading report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the assignment set.
    pub set: SetSummary,
    /// Whose submissions were graded.
    pub learner_id: String,
    /// One outcome per assignment, in set order.
    pub outcomes: Vec<AssignmentOutcome>,
    pub summary: ReportSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an assignment set (without the full definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSummary {
    pub id: String,
    pub name: String,
    pub course_id: String,
    pub assignment_count: usize,
}

impl SetSummary {
    pub fn of(set: &AssignmentSet) -> Self {
        Self {
            id: set.id.clone(),
            name: set.name.clone(),
            course_id: set.course_id.clone(),
            assignment_count: set.assignments.len(),
        }
    }
}

/// How a single assignment fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Passed,
    Failed,
    /// No submission was found.
    Missing,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Passed => write!(f, "passed"),
            OutcomeStatus::Failed => write!(f, "failed"),
            OutcomeStatus::Missing => write!(f, "missing"),
        }
    }
}

/// The grading outcome of one assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    pub assignment_id: String,
    pub module_id: String,
    pub kind: OutputKind,
    pub language: LanguageTag,
    pub status: OutcomeStatus,
    /// The grader's verdict; absent for missing submissions.
    #[serde(default)]
    pub result: Option<GraderResult>,
    /// Whether this run recorded the completion for the first time.
    #[serde(default)]
    pub newly_completed: bool,
}

impl AssignmentOutcome {
    pub fn message(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.message.as_str())
    }
}

/// Pass counts for the whole set and per module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub missing: usize,
    /// Passed over total, 0.0 for an empty set.
    pub pass_rate: f64,
    pub per_module: BTreeMap<String, ModuleStats>,
}

/// Pass counts for one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleStats {
    pub total: usize,
    pub passed: usize,
    pub pass_rate: f64,
}

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    }
}

impl ReportSummary {
    pub fn from_outcomes(outcomes: &[AssignmentOutcome]) -> Self {
        let mut summary = ReportSummary {
            total: outcomes.len(),
            ..Default::default()
        };

        for outcome in outcomes {
            let module = summary
                .per_module
                .entry(outcome.module_id.clone())
                .or_default();
            module.total += 1;
            match outcome.status {
                OutcomeStatus::Passed => {
                    summary.passed += 1;
                    module.passed += 1;
                }
                OutcomeStatus::Failed => summary.failed += 1,
                OutcomeStatus::Missing => summary.missing += 1,
            }
        }

        summary.pass_rate = rate(summary.passed, summary.total);
        for module in summary.per_module.values_mut() {
            module.pass_rate = rate(module.passed, module.total);
        }
        summary
    }
}

impl GradingReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline to find assignments that
    /// stopped or started passing, e.g. after editing reference outputs.
    pub fn compare(&self, baseline: &GradingReport) -> RegressionReport {
        let index = |report: &GradingReport| -> HashMap<String, AssignmentOutcome> {
            report
                .outcomes
                .iter()
                .map(|o| (o.assignment_id.clone(), o.clone()))
                .collect()
        };

        let baseline_outcomes = index(baseline);
        let current_outcomes = index(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_assignments = 0usize;

        for outcome in &self.outcomes {
            let Some(before) = baseline_outcomes.get(&outcome.assignment_id) else {
                new_assignments += 1;
                continue;
            };

            let was_passing = before.status == OutcomeStatus::Passed;
            let is_passing = outcome.status == OutcomeStatus::Passed;
            let change = || StatusChange {
                assignment_id: outcome.assignment_id.clone(),
                module_id: outcome.module_id.clone(),
                baseline: before.status,
                current: outcome.status,
                message: outcome.message().map(str::to_string),
            };

            match (was_passing, is_passing) {
                (true, false) => regressions.push(change()),
                (false, true) => improvements.push(change()),
                _ => unchanged += 1,
            }
        }

        let removed_assignments = baseline
            .outcomes
            .iter()
            .filter(|o| !current_outcomes.contains_key(&o.assignment_id))
            .count();

        RegressionReport {
            regressions,
            improvements,
            unchanged,
            new_assignments,
            removed_assignments,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Assignments that passed in the baseline and no longer do.
    pub regressions: Vec<StatusChange>,
    /// Assignments that pass now and did not before.
    pub improvements: Vec<StatusChange>,
    pub unchanged: usize,
    /// Assignments in current but not baseline.
    pub new_assignments: usize,
    /// Assignments in baseline but not current.
    pub removed_assignments: usize,
}

/// A pass/fail flip between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub assignment_id: String,
    pub module_id: String,
    pub baseline: OutcomeStatus,
    pub current: OutcomeStatus,
    /// Grader message of the current run.
    #[serde(default)]
    pub message: Option<String>,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Assignment | Module | Baseline | Current | Message |\n");
            md.push_str("|------------|--------|----------|---------|---------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    c.assignment_id,
                    c.module_id,
                    c.baseline,
                    c.current,
                    c.message.as_deref().unwrap_or("").replace('|', "\\|")
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, module: &str, status: OutcomeStatus) -> AssignmentOutcome {
        let result = match status {
            OutcomeStatus::Passed => Some(GraderResult::pass("Правильно! Задание выполнено.")),
            OutcomeStatus::Failed => Some(GraderResult::fail(
                "Неправильно. Повторите попытку.",
                "<p>a</p>",
                "<p>b</p>",
            )),
            OutcomeStatus::Missing => None,
        };
        AssignmentOutcome {
            assignment_id: id.into(),
            module_id: module.into(),
            kind: OutputKind::Html,
            language: LanguageTag::Ru,
            status,
            result,
            newly_completed: false,
        }
    }

    fn make_report(outcomes: Vec<AssignmentOutcome>) -> GradingReport {
        GradingReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            set: SetSummary {
                id: "test".into(),
                name: "Test".into(),
                course_id: "course".into(),
                assignment_count: outcomes.len(),
            },
            learner_id: "alice".into(),
            summary: ReportSummary::from_outcomes(&outcomes),
            outcomes,
            duration_ms: 0,
        }
    }

    #[test]
    fn summary_counts_per_module() {
        let summary = ReportSummary::from_outcomes(&[
            outcome("a1", "m1", OutcomeStatus::Passed),
            outcome("a2", "m1", OutcomeStatus::Failed),
            outcome("a3", "m2", OutcomeStatus::Missing),
            outcome("a4", "m2", OutcomeStatus::Passed),
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.missing, 1);
        assert!((summary.pass_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.per_module["m1"].passed, 1);
        assert!((summary.per_module["m2"].pass_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_of_empty_set() {
        let summary = ReportSummary::from_outcomes(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert!(summary.per_module.is_empty());
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(vec![outcome("a1", "m1", OutcomeStatus::Passed)]);
        let current = make_report(vec![outcome("a1", "m1", OutcomeStatus::Passed)]);

        let report = current.compare(&baseline);
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_regression() {
        let baseline = make_report(vec![outcome("a1", "m1", OutcomeStatus::Passed)]);
        let current = make_report(vec![outcome("a1", "m1", OutcomeStatus::Failed)]);

        let report = current.compare(&baseline);
        assert_eq!(report.regressions.len(), 1);
        assert_eq!(report.regressions[0].assignment_id, "a1");
        assert_eq!(
            report.regressions[0].message.as_deref(),
            Some("Неправильно. Повторите попытку.")
        );
    }

    #[test]
    fn failed_to_missing_is_unchanged() {
        let baseline = make_report(vec![outcome("a1", "m1", OutcomeStatus::Failed)]);
        let current = make_report(vec![outcome("a1", "m1", OutcomeStatus::Missing)]);

        let report = current.compare(&baseline);
        assert!(!report.has_regressions());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(vec![outcome("old", "m1", OutcomeStatus::Passed)]);
        let current = make_report(vec![outcome("new", "m1", OutcomeStatus::Passed)]);

        let report = current.compare(&baseline);
        assert_eq!(report.new_assignments, 1);
        assert_eq!(report.removed_assignments, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![
            outcome("a1", "m1", OutcomeStatus::Passed),
            outcome("a2", "m1", OutcomeStatus::Missing),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save_json(&path).unwrap();
        let loaded = GradingReport::load_json(&path).unwrap();

        assert_eq!(loaded.set.id, "test");
        assert_eq!(loaded.outcomes.len(), 2);
        assert_eq!(loaded.outcomes[1].status, OutcomeStatus::Missing);
        assert_eq!(loaded.summary, report.summary);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(vec![outcome("a1", "m1", OutcomeStatus::Passed)]);
        let current = make_report(vec![outcome("a1", "m1", OutcomeStatus::Failed)]);

        let md = current.compare(&baseline).to_markdown();
        assert!(md.contains("Regressions"));
        assert!(md.contains("| a1 | m1 | passed | failed |"));
        assert!(!md.contains("Improvements"));
    }
}
