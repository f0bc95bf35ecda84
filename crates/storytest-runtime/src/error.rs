//! Failure classification for story test execution
//!
//! Driver errors are classified once, when they are created. Retry logic
//! only ever looks at [`DriverErrorKind`], never at message text.

use storytest_codegen::messages::{
    uncaught_page_error, COVERAGE_MISCONFIGURED, TRANSIENT_NAVIGATION_SIGNATURE,
};

/// Classification of a browser driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverErrorKind {
    /// A page navigation destroyed the evaluation context mid-test
    TransientNavigationRace,
    /// Anything else
    Other,
}

/// Error reported by the browser driver or a hook
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    kind: DriverErrorKind,
    message: String,
}

impl DriverError {
    /// Classify a driver message
    ///
    /// Only messages containing the execution-context-destroyed signature
    /// are transient.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if message.contains(TRANSIENT_NAVIGATION_SIGNATURE) {
            DriverErrorKind::TransientNavigationRace
        } else {
            DriverErrorKind::Other
        };
        Self { kind, message }
    }

    /// Create a non-transient error regardless of message
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Other,
            message: message.into(),
        }
    }

    /// Classification
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DriverErrorKind {
        self.kind
    }

    /// Original message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether one retry is warranted
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == DriverErrorKind::TransientNavigationRace
    }
}

/// Why a story test failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestFailure {
    /// The page threw while the story was exercised
    #[error("{}", uncaught_page_error(.story_url, .message))]
    UncaughtPageError {
        /// Navigable story URL
        story_url: String,
        /// Stack or message of the page error
        message: String,
    },

    /// Coverage is enabled but the page is not instrumented
    #[error("{}", COVERAGE_MISCONFIGURED)]
    CoverageMisconfigured,

    /// Coverage is enabled but the runner has nowhere to save it
    #[error("coverage is enabled but no coverage sink is configured")]
    CoverageSinkMissing,

    /// Driver or hook error, propagated unchanged
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl TestFailure {
    /// Whether the failure qualifies for the single retry
    ///
    /// Uncaught page errors and coverage failures never do.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, TestFailure::Driver(e) if e.is_transient())
    }
}

/// Result type alias for test execution
pub type TestResult<T> = Result<T, TestFailure>;
