//! Story locations
//!
//! Maps where story files live to the title prefix their stories get.
//! Loaded once per process and shared read-only by every transform.

use crate::error::LayoutError;
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Component, Path, PathBuf};

/// Files pattern used when a directory entry names none
pub const DEFAULT_STORY_FILES: &str = "**/*.stories.@(js|jsx|mjs|ts|tsx)";

/// One `(glob, title prefix)` rule
#[derive(Debug, Clone)]
pub struct StoryLocationRule {
    /// Normalized glob, relative to the working directory
    pattern: String,
    /// Prefix joined in front of path-derived titles
    title_prefix: String,
    /// Literal leading directory of the glob
    base_dir: String,
    matcher: GlobMatcher,
}

impl StoryLocationRule {
    /// Create rule from a glob pattern
    ///
    /// # Errors
    /// Returns error if the glob does not compile
    pub fn new(pattern: &str, title_prefix: impl Into<String>) -> Result<Self, LayoutError> {
        let pattern = normalize_pattern(pattern);
        let glob = GlobBuilder::new(&rewrite_extglob(&pattern))
            .literal_separator(true)
            .build()
            .map_err(|source| LayoutError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;

        Ok(Self {
            base_dir: literal_base(&pattern),
            title_prefix: title_prefix.into(),
            matcher: glob.compile_matcher(),
            pattern,
        })
    }

    /// Create rule from a directory plus optional files pattern
    ///
    /// # Errors
    /// Returns error if the combined glob does not compile
    pub fn from_directory(
        directory: &str,
        files: Option<&str>,
        title_prefix: impl Into<String>,
    ) -> Result<Self, LayoutError> {
        let directory = normalize_path_str(directory);
        let files = files.unwrap_or(DEFAULT_STORY_FILES);
        let pattern = if directory.is_empty() {
            files.to_string()
        } else {
            format!("{}/{}", directory, files.trim_start_matches("./"))
        };
        Self::new(&pattern, title_prefix)
    }

    /// Normalized glob pattern
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Title prefix
    #[inline]
    #[must_use]
    pub fn title_prefix(&self) -> &str {
        &self.title_prefix
    }

    /// Literal base directory of the glob
    #[inline]
    #[must_use]
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Check if a working-directory-relative path matches
    #[inline]
    #[must_use]
    pub fn matches(&self, relative_path: &str) -> bool {
        self.matcher.is_match(relative_path)
    }

    /// Portion of `relative_path` below the base directory
    #[must_use]
    pub fn suffix_of<'p>(&self, relative_path: &'p str) -> &'p str {
        if self.base_dir.is_empty() {
            return relative_path;
        }
        relative_path
            .strip_prefix(self.base_dir.as_str())
            .map_or(relative_path, |rest| rest.trim_start_matches('/'))
    }
}

/// Process-wide story layout
///
/// Working directory plus ordered location rules.
#[derive(Debug, Clone, Default)]
pub struct ProjectLayout {
    working_dir: PathBuf,
    rules: Vec<StoryLocationRule>,
}

impl ProjectLayout {
    /// Create layout rooted at `working_dir`
    #[inline]
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            rules: Vec::new(),
        }
    }

    /// With an additional rule (declaration order is kept)
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, rule: StoryLocationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule
    #[inline]
    pub fn push_rule(&mut self, rule: StoryLocationRule) {
        self.rules.push(rule);
    }

    /// Working directory
    #[inline]
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Rules in declaration order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[StoryLocationRule] {
        &self.rules
    }

    /// Path of `file` relative to the working directory, `/`-separated
    #[must_use]
    pub fn relative_path(&self, file: &Path) -> String {
        let relative = if file.is_absolute() {
            file.strip_prefix(&self.working_dir).unwrap_or(file)
        } else {
            file
        };
        normalize_path_str(&relative.to_string_lossy())
    }

    /// Check whether any rule claims `file`
    #[must_use]
    pub fn is_story_file(&self, file: &Path) -> bool {
        let relative = self.relative_path(file);
        self.rules.iter().any(|r| r.matches(&relative))
    }
}

/// Normalize separators, drop `./` and resolve `..` lexically
#[must_use]
pub fn normalize_path_str(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<String> = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                if segments.last().is_some_and(|s| s != "..") {
                    segments.pop();
                } else {
                    segments.push("..".to_string());
                }
            }
            Component::Normal(seg) => segments.push(seg.to_string_lossy().into_owned()),
        }
    }
    segments.join("/")
}

fn normalize_pattern(pattern: &str) -> String {
    let unified = pattern.replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Rewrite `@(a|b)` extglob groups into `{a,b}` alternations
#[must_use]
pub fn rewrite_extglob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut depth = 0usize;
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '@' if chars.peek() == Some(&'(') => {
                chars.next();
                depth += 1;
                out.push('{');
            }
            '|' if depth > 0 => out.push(','),
            ')' if depth > 0 => {
                depth -= 1;
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    out
}

fn literal_base(pattern: &str) -> String {
    let is_magic = |seg: &str| seg.contains(&['*', '?', '[', '{', '(', '!'][..]);
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal: Vec<&str> = match segments.split_last() {
        // The last segment names files, never a directory
        Some((_, dirs)) => dirs.iter().copied().take_while(|s| !is_magic(s)).collect(),
        None => Vec::new(),
    };
    literal.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_matches_nested_files() {
        let rule = StoryLocationRule::new("src/components/**", "Components").unwrap();
        assert!(rule.matches("src/components/Button.stories.tsx"));
        assert!(rule.matches("src/components/forms/Input.stories.tsx"));
        assert!(!rule.matches("src/pages/Home.stories.tsx"));
        assert_eq!(rule.base_dir(), "src/components");
    }

    #[test]
    fn rule_strips_leading_dot_slash() {
        let rule = StoryLocationRule::new("./stories/**/*.stories.tsx", "").unwrap();
        assert_eq!(rule.pattern(), "stories/**/*.stories.tsx");
        assert!(rule.matches("stories/atoms/Button.stories.tsx"));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let rule = StoryLocationRule::new("stories/*.stories.tsx", "").unwrap();
        assert!(rule.matches("stories/Button.stories.tsx"));
        assert!(!rule.matches("stories/atoms/Button.stories.tsx"));
    }

    #[test]
    fn directory_rule_uses_default_files() {
        let rule = StoryLocationRule::from_directory("./stories/atoms", None, "Atoms").unwrap();
        assert!(rule.matches("stories/atoms/Button.stories.tsx"));
        assert!(rule.matches("stories/atoms/deep/Badge.stories.js"));
        assert!(!rule.matches("stories/atoms/Button.tsx"));
        assert_eq!(rule.base_dir(), "stories/atoms");
    }

    #[test]
    fn extglob_rewrite() {
        assert_eq!(
            rewrite_extglob("**/*.stories.@(js|jsx|ts|tsx)"),
            "**/*.stories.{js,jsx,ts,tsx}"
        );
        assert_eq!(rewrite_extglob("plain/*.ts"), "plain/*.ts");
    }

    #[test]
    fn invalid_glob_is_reported() {
        let result = StoryLocationRule::new("stories/[", "");
        assert!(matches!(result, Err(LayoutError::InvalidGlob { .. })));
    }

    #[test]
    fn suffix_below_base_dir() {
        let rule = StoryLocationRule::new("src/components/**", "Components").unwrap();
        assert_eq!(rule.suffix_of("src/components/forms/Input.tsx"), "forms/Input.tsx");
    }

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize_path_str("./src/./a/../b.ts"), "src/b.ts");
        assert_eq!(normalize_path_str("src\\win\\Button.tsx"), "src/win/Button.tsx");
        assert_eq!(normalize_path_str("../stories/x.ts"), "../stories/x.ts");
    }

    #[test]
    fn layout_relative_path() {
        let layout = ProjectLayout::new("/repo");
        let rel = layout.relative_path(Path::new("/repo/src/Button.stories.tsx"));
        assert_eq!(rel, "src/Button.stories.tsx");

        let already = layout.relative_path(Path::new("./src/Button.stories.tsx"));
        assert_eq!(already, "src/Button.stories.tsx");
    }

    #[test]
    fn layout_story_file_detection() {
        let layout = ProjectLayout::new("/repo")
            .with_rule(StoryLocationRule::new("src/**/*.stories.tsx", "").unwrap());
        assert!(layout.is_story_file(Path::new("/repo/src/a/B.stories.tsx")));
        assert!(!layout.is_story_file(Path::new("/repo/src/a/B.tsx")));
    }
}
