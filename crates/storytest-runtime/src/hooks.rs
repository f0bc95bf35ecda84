//! Injected collaborators
//!
//! Hooks, coverage persistence and page preparation are passed to the
//! runner as values instead of living in process-wide slots.

use crate::error::DriverError;
use crate::page::{LoadState, StoryPage};
use std::fmt;
use std::sync::Arc;
use storytest_codegen::StoryContext;

/// Hook run before or after a story visit
#[async_trait::async_trait]
pub trait VisitHook: Send + Sync {
    /// Run the hook
    async fn call(&self, page: &dyn StoryPage, context: &StoryContext) -> Result<(), DriverError>;
}

/// Optional pre- and post-visit hooks
#[derive(Clone, Default)]
pub struct HookSet {
    pre_visit: Option<Arc<dyn VisitHook>>,
    post_visit: Option<Arc<dyn VisitHook>>,
}

impl HookSet {
    /// Create empty hook set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a pre-visit hook
    #[inline]
    #[must_use]
    pub fn with_pre_visit(mut self, hook: Arc<dyn VisitHook>) -> Self {
        self.pre_visit = Some(hook);
        self
    }

    /// With a post-visit hook
    #[inline]
    #[must_use]
    pub fn with_post_visit(mut self, hook: Arc<dyn VisitHook>) -> Self {
        self.post_visit = Some(hook);
        self
    }

    /// Pre-visit hook
    #[inline]
    #[must_use]
    pub fn pre_visit(&self) -> Option<&Arc<dyn VisitHook>> {
        self.pre_visit.as_ref()
    }

    /// Post-visit hook
    #[inline]
    #[must_use]
    pub fn post_visit(&self) -> Option<&Arc<dyn VisitHook>> {
        self.post_visit.as_ref()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("pre_visit", &self.pre_visit.is_some())
            .field("post_visit", &self.post_visit.is_some())
            .finish()
    }
}

/// Persists coverage collected by an instrumented page
#[async_trait::async_trait]
pub trait CoverageSink: Send + Sync {
    /// Save the page's coverage snapshot
    async fn save_coverage(&self, page: &dyn StoryPage) -> Result<(), DriverError>;
}

/// Brings a fresh page to the point where stories can be visited
#[async_trait::async_trait]
pub trait PagePreparer: Send + Sync {
    /// Prepare the page
    async fn prepare(&self, page: &dyn StoryPage) -> Result<(), DriverError>;
}

/// Opens the preview iframe and waits until the page is ready
#[derive(Debug, Clone)]
pub struct StandardPreparer {
    iframe_url: String,
}

impl StandardPreparer {
    /// Create preparer for a story server base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            iframe_url: format!("{}/iframe.html", base_url.trim_end_matches('/')),
        }
    }

    /// URL the page is navigated to
    #[inline]
    #[must_use]
    pub fn iframe_url(&self) -> &str {
        &self.iframe_url
    }
}

#[async_trait::async_trait]
impl PagePreparer for StandardPreparer {
    async fn prepare(&self, page: &dyn StoryPage) -> Result<(), DriverError> {
        tracing::debug!(url = %self.iframe_url, "preparing page");
        page.goto(&self.iframe_url).await?;
        wait_for_page_ready(page).await
    }
}

/// Wait for DOM content, load, network idle and fonts, in that order
///
/// # Errors
/// Propagates the first driver error
pub async fn wait_for_page_ready(page: &dyn StoryPage) -> Result<(), DriverError> {
    page.wait_for_load_state(LoadState::DomContentLoaded).await?;
    page.wait_for_load_state(LoadState::Load).await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;
    page.fonts_ready().await
}
