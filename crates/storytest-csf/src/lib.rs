//! Story module analysis
//!
//! Reads story modules statically and answers three questions about them:
//! - **extract**: which stories does a module export, with what metadata
//! - **title**: what display title do they get
//! - **tags**: does each story run, run skipped, or get omitted
//!
//! # Example
//!
//! ```rust
//! use storytest_csf::{extract, resolve_title, SourceLanguage, StoryLocationRule};
//!
//! let source = "export default {}; export const Primary = {};";
//! let module = extract(source, SourceLanguage::Tsx).unwrap();
//!
//! let rules = vec![StoryLocationRule::new("src/components/**", "Components").unwrap()];
//! let title = resolve_title("src/components/Button.stories.tsx", &rules, module.meta.title.as_deref());
//! assert_eq!(title, "Components/Button");
//!
//! let (entries, _) = module.entries(&title);
//! assert_eq!(entries[0].id.as_str(), "components-button--primary");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod extract;
pub mod language;
pub mod layout;
pub mod story;
pub mod tags;
pub mod title;

// Re-exports
pub use error::{ExtractError, ExtractResult, LayoutError, MalformedExport};
pub use extract::{
    extract, BindingReference, ExportMatcher, ExtractedModule, ModuleMeta, StoryExport, StoryStatement,
};
pub use language::SourceLanguage;
pub use layout::{normalize_path_str, ProjectLayout, StoryLocationRule, DEFAULT_STORY_FILES};
pub use story::{sanitize, story_name_from_export, StoryEntry, StoryId, TagSet};
pub use tags::{decide, TagDecision, TagFilterConfig};
pub use title::{resolve_title, TitleResolver, TITLE_SEPARATOR};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for story analysis
    pub use crate::{
        extract, resolve_title, ExtractedModule, MalformedExport, ProjectLayout, SourceLanguage,
        StoryEntry, StoryId, StoryLocationRule, TagDecision, TagFilterConfig, TagSet,
        TitleResolver,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
