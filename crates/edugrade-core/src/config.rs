//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grader::Grader;
use crate::lenient::PhraseTable;
use crate::model::LanguageTag;

/// Environment variable overriding [`EdugradeConfig::default_language`].
pub const LANGUAGE_ENV: &str = "EDUGRADE_LANGUAGE";

/// Top-level edugrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdugradeConfig {
    /// Language used when neither the assignment nor its set names one.
    #[serde(default)]
    pub default_language: LanguageTag,
    /// Max concurrent gradings.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Where completions are recorded.
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    /// Phrase table replacing the builtin one.
    #[serde(default)]
    pub phrase_file: Option<PathBuf>,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./edugrade-results")
}
fn default_progress_file() -> PathBuf {
    PathBuf::from("./edugrade-progress.json")
}

impl Default for EdugradeConfig {
    fn default() -> Self {
        Self {
            default_language: LanguageTag::default(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            progress_file: default_progress_file(),
            phrase_file: None,
        }
    }
}

impl EdugradeConfig {
    /// Parse a config from TOML, resolving `${VAR}` references in paths.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: EdugradeConfig = toml::from_str(content)?;
        config.resolve_paths(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Build a grader from the configured phrase table, or the builtin one.
    pub fn grader(&self) -> Result<Grader> {
        match &self.phrase_file {
            Some(path) => {
                let table = PhraseTable::load(path)?;
                tracing::debug!("loaded phrase table from {}", path.display());
                Ok(Grader::with_phrases(&table)?)
            }
            None => Ok(Grader::new()),
        }
    }

    fn resolve_paths(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let resolve = |p: &Path| PathBuf::from(resolve_vars(&p.to_string_lossy(), &lookup));
        self.output_dir = resolve(self.output_dir.as_path());
        self.progress_file = resolve(self.progress_file.as_path());
        self.phrase_file = self.phrase_file.as_deref().map(resolve);
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(LANGUAGE_ENV).filter(|v| !v.trim().is_empty()) {
            self.default_language = value
                .trim()
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{LANGUAGE_ENV}: {e}"))?;
        }
        Ok(())
    }
}

/// Resolve references like `${VAR_NAME}` in a string through `lookup`.
///
/// Unset variables resolve to the empty string.
fn resolve_vars(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&lookup(&rest[start + 2..start + end]).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `edugrade.toml` in the current directory
/// 2. `~/.config/edugrade/config.toml`
///
/// `EDUGRADE_LANGUAGE` overrides the configured default language.
pub fn load_config() -> Result<EdugradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EdugradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("edugrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = EdugradeConfig::from_toml_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => EdugradeConfig::default(),
    };

    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("edugrade"))
}
