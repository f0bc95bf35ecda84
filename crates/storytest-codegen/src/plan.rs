//! Test plans
//!
//! A [`TestPlan`] is the structured form of one generated story test: the
//! story context, its tag decision, the ordered steps and the retry policy.
//! The JavaScript renderer and the in-process runner both consume it.
//!
//! ```text
//! RegisterErrorListener ─► PreVisit ─► VisitStory ─► PostVisit ─► VerifyCoverage
//!          │                                                            │
//!          └──────────────── DeregisterErrorListener ◄──────────────────┘
//!                              (always, even on failure)
//! ```

use serde::{Deserialize, Serialize};
use storytest_csf::{StoryEntry, StoryId, TagDecision, TagFilterConfig};

/// Identity passed to hooks and error builders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryContext {
    /// Story id
    pub id: StoryId,
    /// Resolved title
    pub title: String,
    /// Display name
    pub name: String,
}

impl From<&StoryEntry> for StoryContext {
    fn from(entry: &StoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            name: entry.name.clone(),
        }
    }
}

/// One step of a story test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Subscribe to uncaught page errors
    RegisterErrorListener,
    /// Run the pre-visit hook
    PreVisit,
    /// Render the story, running its play function if it has one
    VisitStory {
        /// Whether the play function runs
        has_play_fn: bool,
    },
    /// Run the post-visit hook
    PostVisit,
    /// Check the coverage marker and save coverage when enabled
    VerifyCoverage,
    /// Unsubscribe from uncaught page errors
    DeregisterErrorListener,
}

/// How often the whole step sequence may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// One retry after a transient navigation error
    pub const SINGLE_RETRY: Self = Self { max_attempts: 2 };

    /// No retry
    pub const NONE: Self = Self { max_attempts: 1 };

    /// Check if another attempt is allowed after `attempts` runs
    #[inline]
    #[must_use]
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::SINGLE_RETRY
    }
}

/// Structured description of one story test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    /// Story identity
    pub context: StoryContext,
    /// Export the plan was built from
    pub export_name: String,
    /// Tag decision (never `Omit` for planned tests)
    pub decision: TagDecision,
    /// Steps in execution order
    pub steps: Vec<Step>,
    /// Retry policy for transient navigation errors
    pub retry: RetryPolicy,
}

impl TestPlan {
    /// Build plan for a story, or `None` when the story is omitted
    #[must_use]
    pub fn for_story(entry: &StoryEntry, decision: TagDecision) -> Option<Self> {
        if !decision.is_emitted() {
            return None;
        }
        Some(Self {
            context: StoryContext::from(entry),
            export_name: entry.export_name.clone(),
            decision,
            steps: standard_steps(entry.has_play_fn),
            retry: RetryPolicy::default(),
        })
    }

    /// With a different retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether the test is emitted but not executed
    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.decision == TagDecision::RunSkipped
    }

    /// Whether the visit runs a play function
    #[must_use]
    pub fn has_play_fn(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, Step::VisitStory { has_play_fn: true }))
    }

    /// Test case name: `play-test` or `smoke-test`
    #[must_use]
    pub fn test_name(&self) -> &'static str {
        if self.has_play_fn() {
            "play-test"
        } else {
            "smoke-test"
        }
    }
}

/// The fixed step order of a story test
#[must_use]
pub fn standard_steps(has_play_fn: bool) -> Vec<Step> {
    vec![
        Step::RegisterErrorListener,
        Step::PreVisit,
        Step::VisitStory { has_play_fn },
        Step::PostVisit,
        Step::VerifyCoverage,
        Step::DeregisterErrorListener,
    ]
}

/// Decision for one story of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStory {
    /// Export name
    pub export_name: String,
    /// Story id
    pub id: StoryId,
    /// Tag decision
    pub decision: TagDecision,
}

/// Plans for every story of one module, in export order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePlan {
    /// Resolved module title
    pub title: String,
    /// Emitted tests
    pub tests: Vec<TestPlan>,
    /// Every story with its decision, omitted ones included
    pub stories: Vec<PlannedStory>,
}

impl ModulePlan {
    /// Plan a module's stories against a tag filter
    #[must_use]
    pub fn build(title: &str, entries: &[StoryEntry], filter: &TagFilterConfig) -> Self {
        let mut plan = Self {
            title: title.to_string(),
            ..Self::default()
        };

        for entry in entries {
            let decision = filter.decide(&entry.tags);
            tracing::debug!(story = %entry.id, ?decision, "tag decision");
            plan.stories.push(PlannedStory {
                export_name: entry.export_name.clone(),
                id: entry.id.clone(),
                decision,
            });
            plan.tests.extend(TestPlan::for_story(entry, decision));
        }
        plan
    }

    /// Number of omitted stories
    #[must_use]
    pub fn omitted(&self) -> usize {
        self.stories
            .iter()
            .filter(|s| s.decision == TagDecision::Omit)
            .count()
    }

    /// Check whether an export produced a test
    #[must_use]
    pub fn emits(&self, export_name: &str) -> bool {
        self.tests.iter().any(|t| t.export_name == export_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storytest_csf::TagSet;

    fn entry(export_name: &str, tags: &[&str], has_play_fn: bool) -> StoryEntry {
        StoryEntry {
            id: StoryId::derive("Atoms/Button", export_name).unwrap(),
            title: "Atoms/Button".to_string(),
            name: export_name.to_string(),
            export_name: export_name.to_string(),
            tags: tags.iter().copied().collect::<TagSet>(),
            has_play_fn,
        }
    }

    #[test]
    fn omitted_story_has_no_plan() {
        assert!(TestPlan::for_story(&entry("A", &[], false), TagDecision::Omit).is_none());
    }

    #[test]
    fn steps_follow_fixed_order() {
        let plan = TestPlan::for_story(&entry("A", &[], true), TagDecision::Run).unwrap();
        assert_eq!(plan.steps, standard_steps(true));
        assert_eq!(plan.steps.first(), Some(&Step::RegisterErrorListener));
        assert_eq!(plan.steps.last(), Some(&Step::DeregisterErrorListener));
        assert_eq!(plan.test_name(), "play-test");
        assert_eq!(plan.retry, RetryPolicy::SINGLE_RETRY);
    }

    #[test]
    fn smoke_test_without_play() {
        let plan = TestPlan::for_story(&entry("A", &[], false), TagDecision::RunSkipped).unwrap();
        assert_eq!(plan.test_name(), "smoke-test");
        assert!(plan.is_skipped());
    }

    #[test]
    fn retry_policy_bounds_attempts() {
        let policy = RetryPolicy::SINGLE_RETRY;
        assert!(policy.allows_retry(1));
        assert!(!policy.allows_retry(2));
        assert!(!RetryPolicy::NONE.allows_retry(1));
    }

    #[test]
    fn module_plan_keeps_order_and_decisions() {
        let entries = vec![
            entry("Primary", &[], false),
            entry("Flaky", &["flaky"], false),
            entry("Skipped", &["skip-test"], true),
        ];
        let filter = TagFilterConfig::new()
            .with_exclude(["flaky"])
            .with_skip(["skip-test"]);

        let plan = ModulePlan::build("Atoms/Button", &entries, &filter);
        let exports: Vec<&str> = plan.tests.iter().map(|t| t.export_name.as_str()).collect();
        assert_eq!(exports, vec!["Primary", "Skipped"]);
        assert_eq!(plan.omitted(), 1);
        assert_eq!(plan.stories.len(), 3);
        assert!(!plan.emits("Flaky"));
    }
}
