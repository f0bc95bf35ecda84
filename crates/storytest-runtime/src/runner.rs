//! Story test execution
//!
//! Interprets a [`TestPlan`] against a [`StoryPage`]:
//! - steps run strictly in order, each awaited before the next starts
//! - an uncaught page error aborts the attempt at once
//! - the page error listener is removed on every exit path
//! - a transient navigation error re-runs the whole attempt once, after a
//!   page reset and fresh preparation

use crate::error::{TestFailure, TestResult};
use crate::hooks::{CoverageSink, HookSet, PagePreparer, StandardPreparer};
use crate::page::{ListenerGuard, PageErrorEvent, StoryPage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storytest_codegen::messages::{retry_notice, story_url};
use storytest_codegen::{Step, TestPlan};
use tokio::sync::mpsc;

/// Default story server
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6006";

/// Runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Story server URL used in failure links and page preparation
    pub base_url: String,
    /// Verify and save coverage after each visit
    pub coverage_enabled: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            coverage_enabled: false,
        }
    }
}

impl RunnerConfig {
    /// With a base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With coverage enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_coverage(mut self, enabled: bool) -> Self {
        self.coverage_enabled = enabled;
        self
    }
}

/// How a test ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// All steps completed
    Passed {
        /// Attempts used (1 or 2)
        attempts: u32,
        /// Value returned by the story visit
        result: serde_json::Value,
    },
    /// Test was reported skipped and the page never touched
    Skipped,
}

/// Executes story test plans
pub struct StoryTestRunner {
    config: RunnerConfig,
    hooks: HookSet,
    coverage: Option<Arc<dyn CoverageSink>>,
    preparer: Arc<dyn PagePreparer>,
}

impl StoryTestRunner {
    /// Create runner with the standard page preparer
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        let preparer = Arc::new(StandardPreparer::new(&config.base_url));
        Self {
            config,
            hooks: HookSet::default(),
            coverage: None,
            preparer,
        }
    }

    /// With visit hooks
    #[inline]
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// With a coverage sink
    #[inline]
    #[must_use]
    pub fn with_coverage_sink(mut self, sink: Arc<dyn CoverageSink>) -> Self {
        self.coverage = Some(sink);
        self
    }

    /// With a custom page preparer
    #[inline]
    #[must_use]
    pub fn with_preparer(mut self, preparer: Arc<dyn PagePreparer>) -> Self {
        self.preparer = preparer;
        self
    }

    /// Runner settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one story test
    ///
    /// # Errors
    /// - `TestFailure::CoverageSinkMissing` before touching the page when
    ///   coverage is enabled without a sink
    /// - otherwise the failure of the last attempt, unchanged
    pub async fn run(&self, plan: &TestPlan, page: &dyn StoryPage) -> TestResult<TestOutcome> {
        let story = &plan.context;
        if plan.is_skipped() {
            tracing::info!(story = %story.id, "story test skipped");
            return Ok(TestOutcome::Skipped);
        }
        if self.config.coverage_enabled && self.coverage.is_none() {
            return Err(TestFailure::CoverageSinkMissing);
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(plan, page).await {
                Ok(result) => {
                    tracing::debug!(story = %story.id, attempts, "story test passed");
                    return Ok(TestOutcome::Passed { attempts, result });
                }
                Err(failure) if failure.is_transient() && plan.retry.allows_retry(attempts) => {
                    tracing::warn!(story = %story.id, error = %failure, "{}", retry_notice(&story.title, &story.name));
                    page.reset().await?;
                    self.preparer.prepare(page).await?;
                }
                Err(failure) => {
                    tracing::debug!(story = %story.id, attempts, error = %failure, "story test failed");
                    return Err(failure);
                }
            }
        }
    }

    async fn attempt(&self, plan: &TestPlan, page: &dyn StoryPage) -> TestResult<serde_json::Value> {
        let (errors_tx, mut errors_rx) = mpsc::unbounded_channel::<PageErrorEvent>();
        let mut listener: Option<ListenerGuard<'_>> = None;
        let mut result = serde_json::Value::Null;

        for step in &plan.steps {
            match step {
                Step::RegisterErrorListener => {
                    let tx = errors_tx.clone();
                    listener = Some(ListenerGuard::register(
                        page,
                        Box::new(move |event| {
                            let _ = tx.send(event);
                        }),
                    ));
                }
                Step::DeregisterErrorListener => {
                    if let Ok(event) = errors_rx.try_recv() {
                        return Err(self.uncaught(plan, &event));
                    }
                    if let Some(guard) = listener.take() {
                        guard.release();
                    }
                }
                step => {
                    let listening = listener.is_some();
                    tokio::select! {
                        biased;
                        Some(event) = errors_rx.recv(), if listening => {
                            return Err(self.uncaught(plan, &event));
                        }
                        outcome = self.execute(*step, plan, page) => {
                            if let Some(value) = outcome? {
                                result = value;
                            }
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    async fn execute(&self, step: Step, plan: &TestPlan, page: &dyn StoryPage) -> TestResult<Option<serde_json::Value>> {
        let context = &plan.context;
        match step {
            Step::PreVisit => {
                if let Some(hook) = self.hooks.pre_visit() {
                    hook.call(page, context).await?;
                }
            }
            Step::VisitStory { has_play_fn } => {
                return Ok(Some(page.visit_story(&context.id, has_play_fn).await?));
            }
            Step::PostVisit => {
                if let Some(hook) = self.hooks.post_visit() {
                    hook.call(page, context).await?;
                }
            }
            Step::VerifyCoverage => {
                if self.config.coverage_enabled {
                    if !page.has_coverage_marker().await? {
                        return Err(TestFailure::CoverageMisconfigured);
                    }
                    let sink = self.coverage.as_ref().ok_or(TestFailure::CoverageSinkMissing)?;
                    sink.save_coverage(page).await?;
                }
            }
            Step::RegisterErrorListener | Step::DeregisterErrorListener => {}
        }
        Ok(None)
    }

    fn uncaught(&self, plan: &TestPlan, event: &PageErrorEvent) -> TestFailure {
        tracing::debug!(story = %plan.context.id, error = %event.message, "uncaught page error");
        TestFailure::UncaughtPageError {
            story_url: story_url(&self.config.base_url, plan.context.id.as_str()),
            message: event.details().to_string(),
        }
    }
}

impl std::fmt::Debug for StoryTestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryTestRunner")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("coverage", &self.coverage.is_some())
            .finish_non_exhaustive()
    }
}
