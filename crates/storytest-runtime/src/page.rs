//! Browser page abstraction
//!
//! The runner never drives a browser itself; hosts implement
//! [`StoryPage`] over whatever automation library they use.

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use storytest_csf::StoryId;

/// Handle of a registered page error listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Uncaught error raised inside the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageErrorEvent {
    /// Error message
    pub message: String,
    /// Stack trace, when the page provided one
    pub stack: Option<String>,
}

impl PageErrorEvent {
    /// Create event without a stack
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// With a stack trace
    #[inline]
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Stack if present, else the message
    #[must_use]
    pub fn details(&self) -> &str {
        self.stack.as_deref().unwrap_or(&self.message)
    }
}

/// Callback receiving page errors
pub type PageErrorHandler = Box<dyn Fn(PageErrorEvent) + Send + Sync>;

/// Page lifecycle states the preparer waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// `DOMContentLoaded` fired
    DomContentLoaded,
    /// `load` fired
    Load,
    /// No network activity for a while
    NetworkIdle,
}

/// Browser page a story test runs against
#[async_trait::async_trait]
pub trait StoryPage: Send + Sync {
    /// Subscribe to uncaught page errors
    fn on_page_error(&self, handler: PageErrorHandler) -> ListenerId;

    /// Unsubscribe a listener (unknown ids are ignored)
    fn off_page_error(&self, id: ListenerId);

    /// Render a story by id, running its play function when asked
    async fn visit_story(&self, id: &StoryId, has_play_fn: bool) -> Result<serde_json::Value, DriverError>;

    /// Check for the coverage instrumentation marker
    async fn has_coverage_marker(&self) -> Result<bool, DriverError>;

    /// Replace the page with a fresh one
    async fn reset(&self) -> Result<(), DriverError>;

    /// Navigate to a URL
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Wait for a lifecycle state
    async fn wait_for_load_state(&self, state: LoadState) -> Result<(), DriverError>;

    /// Wait until web fonts are loaded
    async fn fonts_ready(&self) -> Result<(), DriverError>;

    /// Story context as the page's preview reports it
    async fn story_context(&self, id: &StoryId) -> Result<serde_json::Value, DriverError>;
}

/// Unsubscribes a page error listener when dropped
///
/// Covers every exit path of an attempt, including cancellation.
pub(crate) struct ListenerGuard<'p> {
    page: &'p dyn StoryPage,
    id: Option<ListenerId>,
}

impl<'p> ListenerGuard<'p> {
    pub(crate) fn register(page: &'p dyn StoryPage, handler: PageErrorHandler) -> Self {
        let id = page.on_page_error(handler);
        tracing::trace!(listener = id.0, "page error listener registered");
        Self { page, id: Some(id) }
    }

    pub(crate) fn release(mut self) {
        self.unsubscribe();
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.id.take() {
            self.page.off_page_error(id);
            tracing::trace!(listener = id.0, "page error listener removed");
        }
    }
}

impl Drop for ListenerGuard<'_> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_details_prefer_stack() {
        let event = PageErrorEvent::new("boom");
        assert_eq!(event.details(), "boom");

        let event = event.with_stack("Error: boom\n    at story.tsx:3");
        assert_eq!(event.details(), "Error: boom\n    at story.tsx:3");
    }
}
