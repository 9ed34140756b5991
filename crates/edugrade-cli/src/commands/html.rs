//! The `edugrade html` command.

use std::path::PathBuf;

use anyhow::Result;

use edugrade_core::LanguageTag;

use super::{grader_and_language, print_verdict, read_input};

pub fn execute(
    user_path: PathBuf,
    expected_path: PathBuf,
    lang: Option<LanguageTag>,
    json: bool,
) -> Result<()> {
    let user = read_input(&user_path)?;
    let expected = read_input(&expected_path)?;
    let (grader, language) = grader_and_language(lang)?;

    let result = grader.grade_html(&user, &expected, Some(language));
    print_verdict(&result, json)
}
