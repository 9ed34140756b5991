//! Subcommand implementations.

pub mod check;
pub mod compare;
pub mod console;
pub mod html;
pub mod init;
pub mod progress;
pub mod validate;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use edugrade_core::config::load_config;
use edugrade_core::{Grader, GraderResult, LanguageTag};

/// Read a file, or stdin when the path is `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Grader and message language for single-submission commands.
///
/// The `--lang` flag wins over the configured default language.
pub(crate) fn grader_and_language(lang: Option<LanguageTag>) -> Result<(Grader, LanguageTag)> {
    let config = load_config()?;
    let grader = config.grader()?;
    Ok((grader, lang.unwrap_or(config.default_language)))
}

/// Print a single verdict and exit 1 when it failed.
pub(crate) fn print_verdict(result: &GraderResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.ok {
        println!("PASS: {}", result.message);
    } else {
        println!("FAIL: {}", result.message);
        if let Some(details) = &result.details {
            println!("  expected: {}", details.expected);
            println!("  actual:   {}", details.actual);
        }
    }

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}
