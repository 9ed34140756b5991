//! The `edugrade progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use edugrade_core::progress::{JsonFileProgress, ProgressStore};

pub async fn execute(store_path: PathBuf, learner: Option<String>) -> Result<()> {
    let store = JsonFileProgress::new(&store_path);
    let records = store.completions(learner.as_deref()).await?;

    if records.is_empty() {
        println!("No completions recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Learner", "Course", "Module", "Assignment", "Completed"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.learner_id),
            Cell::new(&record.key.course_id),
            Cell::new(&record.key.module_id),
            Cell::new(&record.key.assignment_id),
            Cell::new(record.completed_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }
    println!("{table}");
    println!("{} completion(s)", records.len());

    Ok(())
}
