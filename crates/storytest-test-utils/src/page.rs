//! Scripted browser page
//!
//! Records every call, fails visits on demand, and can raise uncaught
//! page errors through whatever listeners are registered.

use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use storytest_codegen::StoryContext;
use storytest_csf::StoryId;
use storytest_runtime::{
    CoverageSink, DriverError, ListenerId, LoadState, PageErrorEvent, PageErrorHandler, StoryPage,
    VisitHook,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCall {
    On(ListenerId),
    Off(ListenerId),
    Visit { id: String, has_play_fn: bool },
    CoverageProbe,
    Reset,
    Goto(String),
    WaitFor(LoadState),
    FontsReady,
    StoryContext(String),
    Hook(String),
    SaveCoverage,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<PageCall>,
    listeners: BTreeMap<ListenerId, PageErrorHandler>,
    next_listener: u64,
    visit_failures: VecDeque<DriverError>,
    uncaught_on_visit: Option<PageErrorEvent>,
    coverage_marker: bool,
}

#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page exposes the coverage marker
    pub fn with_coverage_marker(self) -> Self {
        self.state.lock().coverage_marker = true;
        self
    }

    /// Next visits fail with these errors, in order
    pub fn with_visit_failures<I: IntoIterator<Item = DriverError>>(self, errors: I) -> Self {
        self.state.lock().visit_failures.extend(errors);
        self
    }

    /// Every visit raises this uncaught error and never completes
    pub fn with_uncaught_on_visit(self, event: PageErrorEvent) -> Self {
        self.state.lock().uncaught_on_visit = Some(event);
        self
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.state.lock().calls.clone()
    }

    pub fn visits(&self) -> usize {
        self.count(|c| matches!(c, PageCall::Visit { .. }))
    }

    pub fn resets(&self) -> usize {
        self.count(|c| matches!(c, PageCall::Reset))
    }

    pub fn active_listeners(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn record(&self, call: PageCall) {
        self.state.lock().calls.push(call);
    }

    fn count(&self, pred: impl Fn(&PageCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait::async_trait]
impl StoryPage for FakePage {
    fn on_page_error(&self, handler: PageErrorHandler) -> ListenerId {
        let mut state = self.state.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.insert(id, handler);
        state.calls.push(PageCall::On(id));
        id
    }

    fn off_page_error(&self, id: ListenerId) {
        let mut state = self.state.lock();
        state.listeners.remove(&id);
        state.calls.push(PageCall::Off(id));
    }

    async fn visit_story(&self, id: &StoryId, has_play_fn: bool) -> Result<serde_json::Value, DriverError> {
        let uncaught = {
            let mut state = self.state.lock();
            state.calls.push(PageCall::Visit {
                id: id.to_string(),
                has_play_fn,
            });
            if let Some(error) = state.visit_failures.pop_front() {
                return Err(error);
            }
            match state.uncaught_on_visit.clone() {
                Some(event) => {
                    for handler in state.listeners.values() {
                        handler(event.clone());
                    }
                    true
                }
                None => false,
            }
        };

        if uncaught {
            futures::future::pending::<()>().await;
        }
        Ok(serde_json::json!({ "id": id.as_str(), "played": has_play_fn }))
    }

    async fn has_coverage_marker(&self) -> Result<bool, DriverError> {
        let mut state = self.state.lock();
        state.calls.push(PageCall::CoverageProbe);
        Ok(state.coverage_marker)
    }

    async fn reset(&self) -> Result<(), DriverError> {
        self.record(PageCall::Reset);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.record(PageCall::Goto(url.to_string()));
        Ok(())
    }

    async fn wait_for_load_state(&self, state: LoadState) -> Result<(), DriverError> {
        self.record(PageCall::WaitFor(state));
        Ok(())
    }

    async fn fonts_ready(&self) -> Result<(), DriverError> {
        self.record(PageCall::FontsReady);
        Ok(())
    }

    async fn story_context(&self, id: &StoryId) -> Result<serde_json::Value, DriverError> {
        self.record(PageCall::StoryContext(id.to_string()));
        Ok(serde_json::json!({ "id": id.as_str(), "parameters": {} }))
    }
}

/// Hook that records its label, optionally reading the story context
pub struct RecordingHook {
    label: String,
    page: Arc<FakePage>,
    read_context: bool,
}

impl RecordingHook {
    pub fn new(label: &str, page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            page,
            read_context: false,
        })
    }

    pub fn reading_context(label: &str, page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            page,
            read_context: true,
        })
    }
}

#[async_trait::async_trait]
impl VisitHook for RecordingHook {
    async fn call(&self, page: &dyn StoryPage, context: &StoryContext) -> Result<(), DriverError> {
        self.page.record(PageCall::Hook(self.label.clone()));
        if self.read_context {
            page.story_context(&context.id).await?;
        }
        Ok(())
    }
}

/// Coverage sink that records each save on the page's call log
pub struct RecordingCoverage {
    page: Arc<FakePage>,
}

impl RecordingCoverage {
    pub fn new(page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self { page })
    }
}

#[async_trait::async_trait]
impl CoverageSink for RecordingCoverage {
    async fn save_coverage(&self, _page: &dyn StoryPage) -> Result<(), DriverError> {
        self.page.record(PageCall::SaveCoverage);
        Ok(())
    }
}
