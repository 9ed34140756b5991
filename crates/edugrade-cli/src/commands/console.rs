//! The `edugrade console` command.

use std::path::PathBuf;

use anyhow::Result;

use edugrade_core::LanguageTag;

use super::{grader_and_language, print_verdict, read_input};

pub fn execute(
    output_path: PathBuf,
    expected_path: PathBuf,
    lang: Option<LanguageTag>,
    json: bool,
) -> Result<()> {
    let output = read_input(&output_path)?;
    let expected = read_input(&expected_path)?;
    let (grader, language) = grader_and_language(lang)?;

    let result = grader.grade_console(&output, &expected, Some(language));
    print_verdict(&result, json)
}
