//! Title resolution
//!
//! A story's display title is either the one the author wrote, or one
//! derived from where the file lives:
//!
//! ```text
//! explicit title ──────────────────────────────► title (unchanged)
//! path ─► first matching rule ─► prefix + path below rule base ─► title
//!      └► no rule matches ─────► path below working directory ──► title
//! ```

use crate::layout::{ProjectLayout, StoryLocationRule};
use std::path::Path;

/// Separator between title hierarchy levels
pub const TITLE_SEPARATOR: char = '/';

/// Resolve a story title
///
/// Pure: the same path, rules and explicit title always give the same result.
#[must_use]
pub fn resolve_title(
    relative_file_path: &str,
    rules: &[StoryLocationRule],
    explicit_user_title: Option<&str>,
) -> String {
    if let Some(title) = explicit_user_title.filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    match rules.iter().find(|rule| rule.matches(relative_file_path)) {
        Some(rule) => {
            let title = join_title(rule.title_prefix(), rule.suffix_of(relative_file_path));
            tracing::debug!(
                path = relative_file_path,
                rule = rule.pattern(),
                %title,
                "title from story location rule"
            );
            title
        }
        None => join_title("", relative_file_path),
    }
}

/// Title resolver bound to one story file
///
/// Computes the working-directory-relative path once and answers for
/// any explicit title the module declares.
#[derive(Debug, Clone)]
pub struct TitleResolver<'a> {
    layout: &'a ProjectLayout,
    relative_path: String,
}

impl<'a> TitleResolver<'a> {
    /// Create resolver for `file`
    #[must_use]
    pub fn for_file(layout: &'a ProjectLayout, file: &Path) -> Self {
        Self {
            relative_path: layout.relative_path(file),
            layout,
        }
    }

    /// Working-directory-relative path of the file
    #[inline]
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Resolve title given the module's explicit title (if any)
    #[must_use]
    pub fn resolve(&self, explicit_user_title: Option<&str>) -> String {
        resolve_title(&self.relative_path, self.layout.rules(), explicit_user_title)
    }
}

fn join_title(prefix: &str, path: &str) -> String {
    let mut segments: Vec<&str> = prefix
        .split(['/', '\\'])
        .chain(path.split(['/', '\\']))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if let Some(last) = segments.last_mut() {
        let file_name: &str = *last;
        if let Some(dot) = file_name.find('.').filter(|&i| i > 0) {
            *last = &file_name[..dot];
        }
    }

    // `Button/Button.stories.tsx` names the story file after its folder
    if segments.len() >= 2
        && segments[segments.len() - 1].eq_ignore_ascii_case(segments[segments.len() - 2])
    {
        segments.pop();
    }

    segments.join(&TITLE_SEPARATOR.to_string())
}
