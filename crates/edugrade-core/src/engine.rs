//! Batch grading engine.
//!
//! Fetches a learner's submission for every assignment of a set, grades them
//! concurrently, and records passing assignments in the progress store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::grader::Grader;
use crate::model::{Assignment, AssignmentSet, LanguageTag};
use crate::progress::{CompletionKey, ProgressStore};
use crate::report::{AssignmentOutcome, GradingReport, OutcomeStatus, ReportSummary, SetSummary};

/// Where learner output comes from.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// The learner's output for `assignment`, or `None` if nothing was submitted.
    async fn fetch(&self, assignment: &Assignment) -> Result<Option<String>>;
}

/// Reads `<dir>/<assignment id>.html` or `<dir>/<assignment id>.txt`.
///
/// The extension matching the assignment kind is tried first.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SubmissionSource for DirectorySource {
    async fn fetch(&self, assignment: &Assignment) -> Result<Option<String>> {
        let preferred = assignment.kind.extension();
        let other = if preferred == "html" { "txt" } else { "html" };

        for ext in [preferred, other] {
            let path = self.dir.join(format!("{}.{ext}", assignment.id));
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => return Ok(Some(content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to read submission {}", path.display()))
                }
            }
        }
        Ok(None)
    }
}

/// Submissions held in memory, keyed by assignment id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    submissions: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, assignment_id: impl Into<String>, output: impl Into<String>) -> Self {
        self.submissions.insert(assignment_id.into(), output.into());
        self
    }
}

#[async_trait]
impl SubmissionSource for MemorySource {
    async fn fetch(&self, assignment: &Assignment) -> Result<Option<String>> {
        Ok(self.submissions.get(&assignment.id).cloned())
    }
}

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent gradings.
    pub parallelism: usize,
    /// Learner whose progress is recorded.
    pub learner_id: String,
    /// Language for assignments whose set names none.
    pub default_language: LanguageTag,
    /// Grade every assignment in this language, ignoring set defaults.
    pub language_override: Option<LanguageTag>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            learner_id: "local".to_string(),
            default_language: LanguageTag::default(),
            language_override: None,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_assignment_start(&self, assignment_id: &str);
    fn on_assignment_complete(&self, outcome: &AssignmentOutcome);
    fn on_assignment_error(&self, assignment_id: &str, error: &str);
    fn on_set_complete(&self, total: usize, passed: usize, errors: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_assignment_start(&self, _: &str) {}
    fn on_assignment_complete(&self, _: &AssignmentOutcome) {}
    fn on_assignment_error(&self, _: &str, _: &str) {}
    fn on_set_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The batch grading engine.
pub struct GradingEngine {
    grader: Arc<Grader>,
    source: Arc<dyn SubmissionSource>,
    progress: Arc<dyn ProgressStore>,
    config: EngineConfig,
}

impl GradingEngine {
    pub fn new(
        grader: Arc<Grader>,
        source: Arc<dyn SubmissionSource>,
        progress: Arc<dyn ProgressStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            grader,
            source,
            progress,
            config,
        }
    }

    /// Grade every assignment of `set`.
    ///
    /// Assignments whose submission could not be read are left out of the
    /// report and surfaced through `reporter`. A completion that fails to
    /// persist keeps its passing outcome and is surfaced the same way.
    pub async fn run(
        &self,
        set: &AssignmentSet,
        reporter: &dyn ProgressReporter,
    ) -> Result<GradingReport> {
        anyhow::ensure!(self.config.parallelism >= 1, "parallelism must be at least 1");

        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let mut futures = FuturesUnordered::new();

        for (position, assignment) in set.assignments.iter().enumerate() {
            let grader = Arc::clone(&self.grader);
            let source = Arc::clone(&self.source);
            let progress = Arc::clone(&self.progress);
            let semaphore = Arc::clone(&semaphore);
            let mut assignment = assignment.clone();
            if let Some(language) = self.config.language_override {
                assignment.language = Some(language);
            }
            let language = set.language_for(&assignment, self.config.default_language);
            let learner_id = self.config.learner_id.clone();

            reporter.on_assignment_start(&assignment.id);

            futures.push(async move {
                let assignment_id = assignment.id.clone();
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    let Some(output) = source.fetch(&assignment).await? else {
                        let outcome = AssignmentOutcome {
                            assignment_id: assignment.id.clone(),
                            module_id: assignment.module_id.clone(),
                            kind: assignment.kind,
                            language,
                            status: OutcomeStatus::Missing,
                            result: None,
                            newly_completed: false,
                        };
                        return Ok((outcome, None));
                    };

                    let graded = assignment.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        grader.grade_assignment(&graded, &output, language)
                    })
                    .await
                    .context("grading task panicked")?;

                    let mut record_error = None;
                    let newly_completed = if result.ok {
                        let key = CompletionKey::for_assignment(&assignment);
                        match progress.record_completion(&learner_id, &key).await {
                            Ok(newly) => newly,
                            Err(e) => {
                                tracing::warn!("failed to record completion of {key}: {e:#}");
                                record_error = Some(format!("failed to record completion: {e:#}"));
                                false
                            }
                        }
                    } else {
                        false
                    };

                    let outcome = AssignmentOutcome {
                        assignment_id: assignment.id.clone(),
                        module_id: assignment.module_id.clone(),
                        kind: assignment.kind,
                        language,
                        status: if result.ok {
                            OutcomeStatus::Passed
                        } else {
                            OutcomeStatus::Failed
                        },
                        result: Some(result),
                        newly_completed,
                    };
                    Ok::<_, anyhow::Error>((outcome, record_error))
                };
                (position, assignment_id, inner.await)
            });
        }

        let mut outcomes = Vec::new();
        let mut errors = 0usize;

        while let Some((position, assignment_id, result)) = futures.next().await {
            match result {
                Ok((outcome, record_error)) => {
                    reporter.on_assignment_complete(&outcome);
                    if let Some(error) = record_error {
                        reporter.on_assignment_error(&assignment_id, &error);
                        errors += 1;
                    }
                    outcomes.push((position, outcome));
                }
                Err(e) => {
                    tracing::error!("grading failed for {assignment_id}: {e:#}");
                    reporter.on_assignment_error(&assignment_id, &e.to_string());
                    errors += 1;
                }
            }
        }

        outcomes.sort_by_key(|(position, _)| *position);
        let outcomes: Vec<AssignmentOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();
        let summary = ReportSummary::from_outcomes(&outcomes);

        let elapsed = start.elapsed();
        reporter.on_set_complete(set.assignments.len(), summary.passed, errors, elapsed);

        Ok(GradingReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            set: SetSummary::of(set),
            learner_id: self.config.learner_id.clone(),
            outcomes,
            summary,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputKind;
    use crate::progress::{CompletionRecord, InMemoryProgress};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn assignment(id: &str, kind: OutputKind, expected: &str) -> Assignment {
        Assignment {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            course_id: "course".into(),
            module_id: "m1".into(),
            kind,
            expected: expected.into(),
            language: None,
            tags: vec![],
        }
    }

    fn set(assignments: Vec<Assignment>) -> AssignmentSet {
        AssignmentSet {
            id: "set".into(),
            name: "Set".into(),
            description: String::new(),
            course_id: "course".into(),
            default_language: Some(LanguageTag::Ru),
            assignments,
        }
    }

    #[derive(Default)]
    struct CountingReporter {
        started: AtomicUsize,
        completed: AtomicUsize,
        errored: AtomicUsize,
        finished: AtomicUsize,
    }

    impl ProgressReporter for CountingReporter {
        fn on_assignment_start(&self, _: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_assignment_complete(&self, _: &AssignmentOutcome) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_assignment_error(&self, _: &str, _: &str) {
            self.errored.fetch_add(1, Ordering::SeqCst);
        }
        fn on_set_complete(&self, _: usize, _: usize, _: usize, _: Duration) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A store whose writes always fail.
    struct BrokenProgress;

    #[async_trait]
    impl ProgressStore for BrokenProgress {
        async fn record_completion(&self, _: &str, _: &CompletionKey) -> Result<bool> {
            anyhow::bail!("disk full")
        }
        async fn is_completed(&self, _: &str, _: &CompletionKey) -> Result<bool> {
            Ok(false)
        }
        async fn completions(&self, _: Option<&str>) -> Result<Vec<CompletionRecord>> {
            Ok(vec![])
        }
    }

    fn engine(
        source: impl SubmissionSource + 'static,
        progress: Arc<dyn ProgressStore>,
        config: EngineConfig,
    ) -> GradingEngine {
        GradingEngine::new(
            Arc::new(Grader::new()),
            Arc::new(source),
            progress,
            config,
        )
    }

    #[tokio::test]
    async fn grades_and_records_progress() {
        let set = set(vec![
            assignment("heading", OutputKind::Html, "<h1>Привет</h1>"),
            assignment("wrong", OutputKind::Console, "42"),
            assignment("absent", OutputKind::Console, "hi"),
        ]);
        let source = MemorySource::new()
            .with("heading", "<h1>Привет</h1>")
            .with("wrong", "41");
        let progress = Arc::new(InMemoryProgress::new());
        let reporter = CountingReporter::default();

        let report = engine(source, progress.clone(), EngineConfig::default())
            .run(&set, &reporter)
            .await
            .unwrap();

        let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![OutcomeStatus::Passed, OutcomeStatus::Failed, OutcomeStatus::Missing]
        );
        assert!(report.outcomes[0].newly_completed);
        assert!(!report.outcomes[1].newly_completed);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.learner_id, "local");

        let key = CompletionKey::new("course", "m1", "heading");
        assert!(progress.is_completed("local", &key).await.unwrap());
        assert_eq!(progress.completions(None).await.unwrap().len(), 1);

        assert_eq!(reporter.started.load(Ordering::SeqCst), 3);
        assert_eq!(reporter.completed.load(Ordering::SeqCst), 3);
        assert_eq!(reporter.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_run_is_not_newly_completed() {
        let set = set(vec![assignment("c", OutputKind::Console, "ok")]);
        let progress: Arc<dyn ProgressStore> = Arc::new(InMemoryProgress::new());
        let engine = engine(
            MemorySource::new().with("c", "ok"),
            progress,
            EngineConfig::default(),
        );

        let first = engine.run(&set, &NoopReporter).await.unwrap();
        let second = engine.run(&set, &NoopReporter).await.unwrap();
        assert!(first.outcomes[0].newly_completed);
        assert!(!second.outcomes[0].newly_completed);
        assert_eq!(second.outcomes[0].status, OutcomeStatus::Passed);
    }

    #[tokio::test]
    async fn language_override_applies_to_messages() {
        let set = set(vec![assignment("c", OutputKind::Console, "42")]);
        let config = EngineConfig {
            language_override: Some(LanguageTag::En),
            ..EngineConfig::default()
        };
        let report = engine(
            MemorySource::new().with("c", "41"),
            Arc::new(InMemoryProgress::new()),
            config,
        )
        .run(&set, &NoopReporter)
        .await
        .unwrap();

        assert_eq!(report.outcomes[0].language, LanguageTag::En);
        let result = report.outcomes[0].result.as_ref().unwrap();
        assert!(!result.ok);
        assert_eq!(
            result.message,
            crate::messages::Messages::for_language(LanguageTag::En).console_mismatch("42", "41")
        );
    }

    #[tokio::test]
    async fn failed_completion_keeps_passing_verdict() {
        let set = set(vec![assignment("c", OutputKind::Console, "42")]);
        let reporter = CountingReporter::default();
        let report = engine(
            MemorySource::new().with("c", "42"),
            Arc::new(BrokenProgress),
            EngineConfig::default(),
        )
        .run(&set, &reporter)
        .await
        .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Passed);
        assert!(!report.outcomes[0].newly_completed);
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(reporter.completed.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.errored.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn set_without_language_uses_engine_default() {
        let mut set = set(vec![
            assignment("plain", OutputKind::Console, "42"),
            Assignment {
                language: Some(LanguageTag::Kz),
                ..assignment("own", OutputKind::Console, "42")
            },
        ]);
        set.default_language = None;
        let source = MemorySource::new().with("plain", "41").with("own", "41");
        let config = EngineConfig {
            default_language: LanguageTag::En,
            ..EngineConfig::default()
        };

        let report = engine(source, Arc::new(InMemoryProgress::new()), config)
            .run(&set, &NoopReporter)
            .await
            .unwrap();

        assert_eq!(report.outcomes[0].language, LanguageTag::En);
        assert_eq!(report.outcomes[1].language, LanguageTag::Kz);
        assert_eq!(
            report.outcomes[0].result.as_ref().unwrap().message,
            crate::messages::Messages::for_language(LanguageTag::En).console_mismatch("42", "41")
        );
    }

    #[tokio::test]
    async fn override_beats_assignment_language() {
        let set = set(vec![Assignment {
            language: Some(LanguageTag::Kz),
            ..assignment("own", OutputKind::Console, "42")
        }]);
        let config = EngineConfig {
            language_override: Some(LanguageTag::En),
            ..EngineConfig::default()
        };
        let report = engine(
            MemorySource::new().with("own", "41"),
            Arc::new(InMemoryProgress::new()),
            config,
        )
        .run(&set, &NoopReporter)
        .await
        .unwrap();
        assert_eq!(report.outcomes[0].language, LanguageTag::En);
    }

    #[tokio::test]
    async fn directory_source_prefers_kind_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<p>Hi</p>").unwrap();
        std::fs::write(dir.path().join("page.txt"), "wrong").unwrap();
        std::fs::write(dir.path().join("out.html"), "fallback").unwrap();

        let source = DirectorySource::new(dir.path());
        let page = assignment("page", OutputKind::Html, "<p>Hi</p>");
        let out = assignment("out", OutputKind::Console, "fallback");
        let none = assignment("none", OutputKind::Console, "x");

        assert_eq!(source.fetch(&page).await.unwrap().as_deref(), Some("<p>Hi</p>"));
        assert_eq!(source.fetch(&out).await.unwrap().as_deref(), Some("fallback"));
        assert!(source.fetch(&none).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_parallelism_is_rejected() {
        let config = EngineConfig {
            parallelism: 0,
            ..EngineConfig::default()
        };
        let result = engine(MemorySource::new(), Arc::new(InMemoryProgress::new()), config)
            .run(&set(vec![]), &NoopReporter)
            .await;
        assert!(result.is_err());
    }
}
