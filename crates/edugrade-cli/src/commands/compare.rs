//! The `edugrade compare` command.

use std::path::PathBuf;

use anyhow::Result;

use edugrade_core::report::{GradingReport, StatusChange};

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = GradingReport::load_json(&baseline_path)?;
    let current = GradingReport::load_json(&current_path)?;

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            print_changes("Regressions", &report.regressions);
            print_changes("Improvements", &report.improvements);

            if report.new_assignments > 0 {
                println!("\n{} new assignment(s)", report.new_assignments);
            }
            if report.removed_assignments > 0 {
                println!("{} removed assignment(s)", report.removed_assignments);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_changes(title: &str, changes: &[StatusChange]) {
    if changes.is_empty() {
        return;
    }
    println!("\n{title}:");
    for c in changes {
        println!(
            "  {} ({}) {} -> {}",
            c.assignment_id, c.module_id, c.baseline, c.current
        );
        if let Some(message) = &c.message {
            println!("    {message}");
        }
    }
}
