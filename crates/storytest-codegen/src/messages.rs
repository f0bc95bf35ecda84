//! User-facing failure texts
//!
//! Shared by the JavaScript renderer and the in-process runner so both
//! report identical messages.

/// Substring identifying a page navigation that raced the test
pub const TRANSIENT_NAVIGATION_SIGNATURE: &str = "Execution context was destroyed";

/// Coverage enabled but the page carries no instrumentation marker
pub const COVERAGE_MISCONFIGURED: &str = "[Test runner] An error occurred when evaluating code coverage:\n\
The code in this story is not instrumented, which means the coverage setup is likely not correct.\n\
More info: https://github.com/storybookjs/test-runner#setting-up-code-coverage";

/// In-page global set by coverage instrumentation
pub const COVERAGE_MARKER: &str = "__coverage__";

/// Navigable URL of a story under a base URL
#[must_use]
pub fn story_url(base_url: &str, story_id: &str) -> String {
    format!("{base_url}?path=/story/{story_id}")
}

/// Failure text for an uncaught page error
#[must_use]
pub fn uncaught_page_error(story_url: &str, message: &str) -> String {
    format!(
        "An uncaught error occurred when visiting the following story.\n\
Please access the link and check the logs in the browser:\n\
{story_url}\n\
\n\
Message:\n\
{message}\n"
    )
}

/// Log line printed before the single retry
#[must_use]
pub fn retry_notice(title: &str, name: &str) -> String {
    format!(
        "An error occurred in the following story, most likely because of a navigation: \"{title}/{name}\". Retrying..."
    )
}
