//! Story test execution policy
//!
//! Runs a generated story test plan against injected collaborators:
//! a [`StoryPage`] driver, a [`HookSet`], an optional [`CoverageSink`] and a
//! [`PagePreparer`]. Enforces step ordering, listener teardown, coverage
//! diagnostics and the single retry on transient navigation errors.

#![warn(missing_docs)]

pub mod error;
pub mod hooks;
pub mod page;
pub mod runner;

// Re-exports
pub use error::{DriverError, DriverErrorKind, TestFailure, TestResult};
pub use hooks::{wait_for_page_ready, CoverageSink, HookSet, PagePreparer, StandardPreparer, VisitHook};
pub use page::{ListenerId, LoadState, PageErrorEvent, PageErrorHandler, StoryPage};
pub use runner::{RunnerConfig, StoryTestRunner, TestOutcome, DEFAULT_BASE_URL};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running story tests
    pub use crate::{
        DriverError, HookSet, RunnerConfig, StoryPage, StoryTestRunner, TestFailure, TestOutcome,
        VisitHook,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
