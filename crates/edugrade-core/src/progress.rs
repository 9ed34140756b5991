//! Assignment completion tracking.
//!
//! The grader never touches storage itself. Callers record a completion in a
//! [`ProgressStore`] after a passing verdict.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::model::Assignment;

/// Identifies one assignment inside the course tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompletionKey {
    pub course_id: String,
    pub module_id: String,
    pub assignment_id: String,
}

impl CompletionKey {
    pub fn new(
        course_id: impl Into<String>,
        module_id: impl Into<String>,
        assignment_id: impl Into<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            module_id: module_id.into(),
            assignment_id: assignment_id.into(),
        }
    }

    pub fn for_assignment(assignment: &Assignment) -> Self {
        Self::new(
            assignment.course_id.clone(),
            assignment.module_id.clone(),
            assignment.id.clone(),
        )
    }
}

impl fmt::Display for CompletionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.course_id, self.module_id, self.assignment_id
        )
    }
}

/// One completed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub learner_id: String,
    #[serde(flatten)]
    pub key: CompletionKey,
    pub completed_at: DateTime<Utc>,
}

/// Storage for completed assignments.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Record that `learner_id` completed `key`.
    ///
    /// Returns `false` if the completion was already recorded; the original
    /// timestamp is kept.
    async fn record_completion(&self, learner_id: &str, key: &CompletionKey) -> Result<bool>;

    async fn is_completed(&self, learner_id: &str, key: &CompletionKey) -> Result<bool>;

    /// Completions of one learner, or of everyone, ordered by learner and key.
    async fn completions(&self, learner_id: Option<&str>) -> Result<Vec<CompletionRecord>>;
}

type CompletionMap = BTreeMap<(String, CompletionKey), DateTime<Utc>>;

fn insert_completion(map: &mut CompletionMap, learner_id: &str, key: &CompletionKey) -> bool {
    let entry = (learner_id.to_string(), key.clone());
    if map.contains_key(&entry) {
        return false;
    }
    map.insert(entry, Utc::now());
    true
}

fn collect_records(map: &CompletionMap, learner_id: Option<&str>) -> Vec<CompletionRecord> {
    map.iter()
        .filter(|((learner, _), _)| learner_id.map_or(true, |id| learner.as_str() == id))
        .map(|((learner, key), completed_at)| CompletionRecord {
            learner_id: learner.clone(),
            key: key.clone(),
            completed_at: *completed_at,
        })
        .collect()
}

/// Process-local progress, lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryProgress {
    completions: Mutex<CompletionMap>,
}

impl InMemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgress {
    async fn record_completion(&self, learner_id: &str, key: &CompletionKey) -> Result<bool> {
        let mut completions = self.completions.lock().await;
        Ok(insert_completion(&mut completions, learner_id, key))
    }

    async fn is_completed(&self, learner_id: &str, key: &CompletionKey) -> Result<bool> {
        let completions = self.completions.lock().await;
        Ok(completions.contains_key(&(learner_id.to_string(), key.clone())))
    }

    async fn completions(&self, learner_id: Option<&str>) -> Result<Vec<CompletionRecord>> {
        let completions = self.completions.lock().await;
        Ok(collect_records(&completions, learner_id))
    }
}

/// On-disk layout of [`JsonFileProgress`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    completions: Vec<CompletionRecord>,
}

/// Progress kept in a single JSON file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename. Concurrent writers in other processes are not coordinated.
#[derive(Debug)]
pub struct JsonFileProgress {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileProgress {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<CompletionMap> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CompletionMap::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read progress file: {}", self.path.display())
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(CompletionMap::new());
        }

        let file: ProgressFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse progress file: {}", self.path.display()))?;
        Ok(file
            .completions
            .into_iter()
            .map(|record| ((record.learner_id, record.key), record.completed_at))
            .collect())
    }

    async fn write(&self, map: &CompletionMap) -> Result<()> {
        let file = ProgressFile {
            completions: collect_records(map, None),
        };
        let json = serde_json::to_string_pretty(&file).context("failed to serialize progress")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for JsonFileProgress {
    async fn record_completion(&self, learner_id: &str, key: &CompletionKey) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut map = self.read().await?;
        if !insert_completion(&mut map, learner_id, key) {
            return Ok(false);
        }
        self.write(&map).await?;
        tracing::debug!("recorded completion of {key} for {learner_id}");
        Ok(true)
    }

    async fn is_completed(&self, learner_id: &str, key: &CompletionKey) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let map = self.read().await?;
        Ok(map.contains_key(&(learner_id.to_string(), key.clone())))
    }

    async fn completions(&self, learner_id: Option<&str>) -> Result<Vec<CompletionRecord>> {
        let _guard = self.lock.lock().await;
        let map = self.read().await?;
        Ok(collect_records(&map, learner_id))
    }
}
