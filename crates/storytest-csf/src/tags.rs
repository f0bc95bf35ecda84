//! Tag-based story filtering
//!
//! Decides per story whether a test is generated, generated as skipped,
//! or omitted entirely.

use crate::story::TagSet;
use serde::{Deserialize, Serialize};

/// Outcome of tag filtering for one story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagDecision {
    /// Generate and execute the test
    Run,
    /// Generate no test at all
    Omit,
    /// Generate the test but report it skipped
    RunSkipped,
}

impl TagDecision {
    /// Whether a test appears in the output module
    #[inline]
    #[must_use]
    pub fn is_emitted(&self) -> bool {
        !matches!(self, TagDecision::Omit)
    }
}

/// Include / exclude / skip tag sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFilterConfig {
    /// When non-empty, only stories carrying one of these run
    pub include: Vec<String>,
    /// Stories carrying any of these are omitted
    pub exclude: Vec<String>,
    /// Stories carrying any of these are emitted as skipped
    pub skip: Vec<String>,
}

impl TagFilterConfig {
    /// Create empty filter (everything runs)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With include tags
    #[must_use]
    pub fn with_include<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = tags.into_iter().map(Into::into).collect();
        self
    }

    /// With exclude tags
    #[must_use]
    pub fn with_exclude<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = tags.into_iter().map(Into::into).collect();
        self
    }

    /// With skip tags
    #[must_use]
    pub fn with_skip<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Decide what happens to a story with `story_tags`
    #[must_use]
    pub fn decide(&self, story_tags: &TagSet) -> TagDecision {
        decide(story_tags, self)
    }
}

/// Apply the filter rules in precedence order
///
/// 1. non-empty include with no overlap → omit
/// 2. exclude overlap → omit
/// 3. skip overlap → run skipped
/// 4. otherwise → run
#[must_use]
pub fn decide(story_tags: &TagSet, config: &TagFilterConfig) -> TagDecision {
    if !config.include.is_empty() && !story_tags.intersects(&config.include) {
        return TagDecision::Omit;
    }
    if story_tags.intersects(&config.exclude) {
        return TagDecision::Omit;
    }
    if story_tags.intersects(&config.skip) {
        return TagDecision::RunSkipped;
    }
    TagDecision::Run
}
