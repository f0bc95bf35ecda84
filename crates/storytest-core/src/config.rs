//! Configuration
//!
//! Loaded from `storytest.toml`:
//!
//! ```toml
//! working_dir = "."
//!
//! stories = [
//!     "stories/pages/**/*.stories.@(js|jsx|ts|tsx)",
//!     { directory = "stories/atoms", title_prefix = "Atoms" },
//! ]
//!
//! [tags]
//! include = ["test"]
//! exclude = ["flaky"]
//! skip = ["skip-test"]
//!
//! [coverage]
//! enabled = true
//!
//! [runtime]
//! base_url = "http://127.0.0.1:6006"
//!
//! [template]
//! runtime_module = "@storytest/runtime"
//! ```
//!
//! `REFERENCE_URL` (then `TARGET_URL`) overrides `runtime.base_url`;
//! `STORYTEST_COVERAGE` overrides `coverage.enabled`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storytest_codegen::TestTemplate;
use storytest_csf::{ProjectLayout, StoryLocationRule, TagFilterConfig};
use storytest_runtime::{RunnerConfig, DEFAULT_BASE_URL};

/// Default config file name
pub const CONFIG_FILE: &str = "storytest.toml";

/// One story location entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoriesEntry {
    /// Bare glob, no title prefix
    Glob(String),
    /// Directory with optional files pattern and title prefix
    Directory {
        /// Directory relative to the working directory
        directory: String,
        /// Files pattern below the directory
        #[serde(default)]
        files: Option<String>,
        /// Prefix for path-derived titles
        #[serde(default)]
        title_prefix: String,
    },
}

impl StoriesEntry {
    /// Compile into a location rule
    ///
    /// # Errors
    /// Returns error if the glob does not compile
    pub fn to_rule(&self) -> Result<StoryLocationRule, ConfigError> {
        let rule = match self {
            StoriesEntry::Glob(pattern) => StoryLocationRule::new(pattern, "")?,
            StoriesEntry::Directory {
                directory,
                files,
                title_prefix,
            } => StoryLocationRule::from_directory(directory, files.as_deref(), title_prefix.clone())?,
        };
        Ok(rule)
    }
}

/// `[coverage]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Verify instrumentation and save coverage after each story
    pub enabled: bool,
}

/// `[runtime]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Story server URL
    pub base_url: Option<String>,
}

/// `[transform]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSection {
    /// Emit a placeholder test for modules without stories
    pub insert_test_if_empty: bool,
    /// Drop original story declarations from the output
    pub clear_original_body: bool,
}

impl Default for TransformSection {
    fn default() -> Self {
        Self {
            insert_test_if_empty: true,
            clear_original_body: true,
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorytestConfig {
    /// Root story paths are relative to (defaults to the config's directory)
    pub working_dir: Option<PathBuf>,
    /// Story locations in declaration order
    pub stories: Vec<StoriesEntry>,
    /// Tag filter
    pub tags: TagFilterConfig,
    /// Coverage settings
    pub coverage: CoverageConfig,
    /// Runtime settings
    pub runtime: RuntimeSection,
    /// Generated code bindings
    pub template: TestTemplate,
    /// Emission switches
    pub transform: TransformSection,
}

impl StorytestConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on invalid TOML or unknown shapes
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a file
    ///
    /// A relative `working_dir` is resolved against the file's directory.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Self::from_toml_str(&text, path)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.working_dir = Some(match config.working_dir.take() {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        });

        tracing::debug!(path = %path.display(), stories = config.stories.len(), "loaded config");
        Ok(config)
    }

    /// With story entries
    #[inline]
    #[must_use]
    pub fn with_stories(mut self, stories: Vec<StoriesEntry>) -> Self {
        self.stories = stories;
        self
    }

    /// With a tag filter
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: TagFilterConfig) -> Self {
        self.tags = tags;
        self
    }

    /// With a working directory
    #[inline]
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Apply process environment overrides
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an environment lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = non_empty("REFERENCE_URL").or_else(|| non_empty("TARGET_URL")) {
            self.runtime.base_url = Some(url);
        }
        if let Some(flag) = non_empty("STORYTEST_COVERAGE") {
            self.coverage.enabled = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    /// Working directory, falling back to `default`
    #[must_use]
    pub fn working_dir_or(&self, default: &Path) -> PathBuf {
        self.working_dir.clone().unwrap_or_else(|| default.to_path_buf())
    }

    /// Build the story layout
    ///
    /// # Errors
    /// Returns error if any story entry does not compile
    pub fn layout(&self, default_working_dir: &Path) -> Result<ProjectLayout, ConfigError> {
        let mut layout = ProjectLayout::new(self.working_dir_or(default_working_dir));
        for entry in &self.stories {
            layout.push_rule(entry.to_rule()?);
        }
        Ok(layout)
    }

    /// Settings for the in-process runner
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default()
            .with_base_url(
                self.runtime
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            )
            .with_coverage(self.coverage.enabled)
    }
}
