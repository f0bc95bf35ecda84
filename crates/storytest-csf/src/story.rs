//! Story records and identifiers
//!
//! Provides [`StoryEntry`], the per-story record produced by extraction,
//! together with the id and naming rules of the story format.

use crate::error::LayoutError;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

static ID_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[ ’–—―′¿'`~!@#$%^&*()_|+\-=?;:",.<>{}\[\]\\/]"#).expect("valid id pattern")
});

static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("-+").expect("valid dash pattern"));

/// Ordered, deduplicated set of tags
///
/// Union never removes a tag; insertion order is kept for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(IndexSet<String>);

impl TagSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(IndexSet::new())
    }

    /// Add a tag
    #[inline]
    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Union with another set, keeping own order first
    #[must_use]
    pub fn union(&self, other: &TagSet) -> TagSet {
        let mut merged = self.clone();
        for tag in &other.0 {
            merged.0.insert(tag.clone());
        }
        merged
    }

    /// Check whether any tag is shared with `tags`
    #[must_use]
    pub fn intersects<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.0.contains(t.as_ref()))
    }

    /// Iterate tags in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of tags
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Stable story identifier (`<kind>--<name>`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoryId(String);

impl StoryId {
    /// Derive id from a title (or meta id) and the story export name
    ///
    /// # Errors
    /// Returns error if either component has no alphanumeric characters
    pub fn derive(kind: &str, export_name: &str) -> Result<Self, LayoutError> {
        let kind = sanitize_component("kind", kind)?;
        let name = sanitize_component("name", &story_name_from_export(export_name))?;
        Ok(Self(format!("{kind}--{name}")))
    }

    /// Get id as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase and collapse punctuation into single dashes
#[must_use]
pub fn sanitize(value: &str) -> String {
    let lowered = value.to_lowercase();
    let dashed = ID_PUNCTUATION.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

fn sanitize_component(component: &'static str, value: &str) -> Result<String, LayoutError> {
    let sanitized = sanitize(value);
    if sanitized.is_empty() {
        return Err(LayoutError::InvalidIdComponent {
            component,
            value: value.to_string(),
        });
    }
    Ok(sanitized)
}

/// Human-readable story name from an export key
///
/// Splits camel case, digit runs and separators into words and
/// upper-cases each word's first letter: `PrimaryButton` → `Primary Button`.
#[must_use]
pub fn story_name_from_export(key: &str) -> String {
    split_words(key)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn split_words(key: &str) -> Vec<String> {
    let chars: Vec<char> = key.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let boundary = !current.is_empty()
                && ((prev.is_lowercase() && c.is_uppercase())
                    || (prev.is_alphabetic() != c.is_alphabetic())
                    || (prev.is_uppercase()
                        && c.is_uppercase()
                        && next.is_some_and(char::is_lowercase)));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// One story as seen by the transform
///
/// Created during extraction from one export and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEntry {
    /// Stable id derived from title and export name
    pub id: StoryId,
    /// Resolved display title
    pub title: String,
    /// Display name
    pub name: String,
    /// Exported binding name
    pub export_name: String,
    /// Effective tags (module ∪ story)
    pub tags: TagSet,
    /// Whether the story declares an interaction function
    pub has_play_fn: bool,
}
