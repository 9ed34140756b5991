//! The `edugrade check` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use edugrade_core::config::load_config_from;
use edugrade_core::engine::{DirectorySource, EngineConfig, GradingEngine, ProgressReporter};
use edugrade_core::parser::load_assignments;
use edugrade_core::progress::JsonFileProgress;
use edugrade_core::report::{AssignmentOutcome, GradingReport, OutcomeStatus};
use edugrade_core::LanguageTag;

pub struct CheckArgs {
    pub assignments: PathBuf,
    pub submissions: PathBuf,
    pub learner: String,
    pub progress: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub filter: Option<String>,
    pub parallelism: Option<usize>,
    pub lang: Option<LanguageTag>,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_assignment_start(&self, _assignment_id: &str) {}

    fn on_assignment_complete(&self, outcome: &AssignmentOutcome) {
        let icon = match outcome.status {
            OutcomeStatus::Passed => "OK",
            OutcomeStatus::Failed => "FAIL",
            OutcomeStatus::Missing => "MISSING",
        };
        let completed = if outcome.newly_completed {
            " (completed)"
        } else {
            ""
        };
        eprintln!("  {icon}: {} [{}]{completed}", outcome.assignment_id, outcome.kind);
    }

    fn on_assignment_error(&self, assignment_id: &str, error: &str) {
        eprintln!("  ERROR: {assignment_id}: {error}");
    }

    fn on_set_complete(&self, total: usize, passed: usize, errors: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {passed}/{total} passed, {errors} errors ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let parallelism = args.parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(
        args.submissions.is_dir(),
        "submissions directory not found: {}",
        args.submissions.display()
    );

    let mut sets = load_assignments(&args.assignments)?;
    anyhow::ensure!(
        !sets.is_empty(),
        "no assignment sets found in {}",
        args.assignments.display()
    );

    if let Some(filter_tags) = &args.filter {
        let tags: Vec<&str> = filter_tags.split(',').map(|s| s.trim()).collect();
        for set in &mut sets {
            set.assignments
                .retain(|a| a.tags.iter().any(|t| tags.contains(&t.as_str())));
        }
    }

    let progress_path = args.progress.unwrap_or_else(|| config.progress_file.clone());
    let output = args.output.unwrap_or_else(|| config.output_dir.clone());

    let engine = GradingEngine::new(
        Arc::new(config.grader()?),
        Arc::new(DirectorySource::new(&args.submissions)),
        Arc::new(JsonFileProgress::new(&progress_path)),
        EngineConfig {
            parallelism,
            learner_id: args.learner,
            default_language: config.default_language,
            language_override: args.lang,
        },
    );
    let reporter = ConsoleReporter;

    for set in &sets {
        eprintln!(
            "edugrade v{} - Grading {} assignments of '{}'",
            env!("CARGO_PKG_VERSION"),
            set.assignments.len(),
            set.name
        );
        eprintln!();

        let report = engine.run(set, &reporter).await?;

        print_summary(&report);

        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = output.join(format!("report-{}-{timestamp}.json", set.id));
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    eprintln!("Progress recorded in: {}", progress_path.display());
    Ok(())
}

fn print_summary(report: &GradingReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Assignment", "Module", "Status", "Message"]);
    for outcome in &report.outcomes {
        table.add_row(vec![
            Cell::new(&outcome.assignment_id),
            Cell::new(&outcome.module_id),
            Cell::new(outcome.status),
            Cell::new(outcome.message().unwrap_or("")),
        ]);
    }
    eprintln!("\n{table}");

    let mut modules = Table::new();
    modules.set_header(vec!["Module", "Passed", "Pass rate"]);
    for (module, stats) in &report.summary.per_module {
        modules.add_row(vec![
            Cell::new(module),
            Cell::new(format!("{}/{}", stats.passed, stats.total)),
            Cell::new(format!("{:.1}%", stats.pass_rate * 100.0)),
        ]);
    }
    eprintln!("{modules}");
    eprintln!(
        "Overall: {}/{} passed ({:.1}%), {} missing",
        report.summary.passed,
        report.summary.total,
        report.summary.pass_rate * 100.0,
        report.summary.missing
    );
}
