//! The `edugrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use edugrade_core::parser::{load_assignments, validate_assignment_set};

pub fn execute(assignments_path: PathBuf) -> Result<()> {
    let sets = load_assignments(&assignments_path)?;
    anyhow::ensure!(
        !sets.is_empty(),
        "no assignment sets found in {}",
        assignments_path.display()
    );

    let mut total_warnings = 0;

    for set in &sets {
        println!(
            "Assignment set: {} ({} assignments)",
            set.name,
            set.assignments.len()
        );

        let warnings = validate_assignment_set(set);
        for w in &warnings {
            let prefix = w
                .assignment_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All assignment sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
