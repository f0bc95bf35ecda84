//! Story module to browser test transform
//!
//! Ties the analysis, generation and runtime crates together:
//! - [`transform`]: extract → resolve title → filter → plan → emit
//! - [`config`]: `storytest.toml` loading with environment overrides
//! - [`service`]: file ingress with a content-addressed result cache
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use storytest_core::{transform, TransformOptions};
//!
//! let source = "export default { title: 'Atoms/Button' };\nexport const Primary = {};\n";
//! let options = TransformOptions::new(|explicit| explicit.unwrap_or("Untitled").to_string());
//!
//! let result = transform(source, Path::new("Button.stories.tsx"), &options).unwrap();
//! assert_eq!(result.report.tests, 1);
//! assert!(result.code.contains("describe(\"Atoms/Button\""));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod service;
pub mod transform;

// Re-exports
pub use config::{
    CoverageConfig, RuntimeSection, StoriesEntry, StorytestConfig, TransformSection, CONFIG_FILE,
};
pub use error::{ConfigError, ServiceError, TransformError};
pub use hash::SourceHash;
pub use service::{ServiceSettings, TransformService, DEFAULT_MAX_FILE_SIZE};
pub use transform::{plan, transform, MakeTitle, TransformOptions, TransformReport, TransformResult};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for transforming story modules
    pub use crate::{
        transform, StorytestConfig, TransformError, TransformOptions, TransformResult,
        TransformService,
    };
    pub use storytest_csf::{ProjectLayout, StoryLocationRule, TagDecision, TagFilterConfig};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
