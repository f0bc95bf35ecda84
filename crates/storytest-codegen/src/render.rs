//! Rendering test plans to JavaScript
//!
//! Every page-side collaborator (hooks, coverage, page reset and
//! preparation, error construction) is reached through a single runtime
//! binding imported at the top of the module, never through globals.

use crate::js::{self, Arrow, Expr, Param, Stmt};
use crate::messages::{retry_notice, COVERAGE_MARKER, COVERAGE_MISCONFIGURED};
use crate::plan::{ModulePlan, Step, TestPlan};
use serde::{Deserialize, Serialize};

/// Name of the story context constant inside a test
const CONTEXT: &str = "context";
/// Name of the single-attempt function inside a test
const TEST_FN: &str = "testFn";
/// Name of the page error listener
const ON_PAGE_ERROR: &str = "onPageError";

/// Names the generated code binds to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestTemplate {
    /// Module specifier the runtime is imported from
    pub runtime_module: String,
    /// Local binding of the runtime
    pub runtime_binding: String,
    /// Page fixture in scope of every test
    pub page_binding: String,
}

impl Default for TestTemplate {
    fn default() -> Self {
        Self {
            runtime_module: "@storytest/runtime".to_string(),
            runtime_binding: "__storytest".to_string(),
            page_binding: "page".to_string(),
        }
    }
}

impl TestTemplate {
    /// With a different runtime module specifier
    #[inline]
    #[must_use]
    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    /// With a different runtime binding name
    #[inline]
    #[must_use]
    pub fn with_runtime_binding(mut self, binding: impl Into<String>) -> Self {
        self.runtime_binding = binding.into();
        self
    }

    /// Import line that brings the runtime into scope
    #[must_use]
    pub fn import_line(&self) -> String {
        format!(
            "import {{ runner as {} }} from {};",
            self.runtime_binding,
            js::quote(&self.runtime_module)
        )
    }

    fn runtime(&self, method: &str) -> Expr {
        Expr::ident(&self.runtime_binding).dot(method)
    }

    fn page(&self) -> Expr {
        Expr::ident(&self.page_binding)
    }
}

/// Render the `describe(title)` block for a module plan
///
/// Returns `None` when the plan has no tests.
#[must_use]
pub fn render_module(plan: &ModulePlan, template: &TestTemplate) -> Option<String> {
    if plan.tests.is_empty() {
        return None;
    }
    let stories = plan
        .tests
        .iter()
        .map(|test| render_story(test, template))
        .collect();
    Some(js::print(&[describe(&plan.title, stories)]))
}

/// Placeholder block for a module without emitted stories
#[must_use]
pub fn render_placeholder(title: &str) -> String {
    let test = Stmt::Expr(Expr::ident("it").call(vec![
        Expr::str("no stories"),
        Arrow::block(vec![], vec![]),
    ]));
    js::print(&[describe(title, vec![test])])
}

/// Render one story as `describe(name, () => { it(...) })`
#[must_use]
pub fn render_story(plan: &TestPlan, template: &TestTemplate) -> Stmt {
    let test_fn = if plan.is_skipped() {
        Expr::ident("it").dot("skip")
    } else {
        Expr::ident("it")
    };

    let mut body = vec![Stmt::Const(CONTEXT.to_string(), context_object(plan))];
    body.push(Stmt::Const(
        TEST_FN.to_string(),
        Arrow::async_block(vec![], attempt_body(plan, template)),
    ));
    body.extend(attempts(plan, template, plan.retry.max_attempts));

    let test = Stmt::Expr(test_fn.call(vec![
        Expr::str(plan.test_name()),
        Arrow::async_block(vec![], body),
    ]));
    describe(&plan.context.name, vec![test])
}

fn describe(name: &str, body: Vec<Stmt>) -> Stmt {
    Stmt::Expr(
        Expr::ident("describe").call(vec![Expr::str(name), Arrow::block(vec![], body)]),
    )
}

fn context_object(plan: &TestPlan) -> Expr {
    Expr::object([
        ("id", Expr::str(plan.context.id.as_str())),
        ("title", Expr::str(&plan.context.title)),
        ("name", Expr::str(&plan.context.name)),
    ])
}

/// Body of a single attempt: listener setup, steps, teardown in `finally`
fn attempt_body(plan: &TestPlan, template: &TestTemplate) -> Vec<Stmt> {
    let mut prelude = Vec::new();
    let mut protected = Vec::new();
    let mut teardown = Vec::new();
    let mut visits = false;

    for step in &plan.steps {
        match step {
            Step::RegisterErrorListener => {
                prelude.push(Stmt::Const(
                    ON_PAGE_ERROR.to_string(),
                    Arrow::concise(
                        vec![Param::Ident("err".to_string())],
                        template
                            .runtime("throwUncaughtPageError")
                            .call(vec![Expr::ident("err"), Expr::ident(CONTEXT)]),
                    ),
                ));
                prelude.push(Stmt::Expr(page_listener(template, "on")));
            }
            Step::PreVisit => protected.push(hook_call(template, "preVisit")),
            Step::VisitStory { has_play_fn } => {
                visits = true;
                protected.push(Stmt::Const("result".to_string(), visit(plan, template, *has_play_fn)));
            }
            Step::PostVisit => protected.push(hook_call(template, "postVisit")),
            Step::VerifyCoverage => protected.push(coverage_check(template)),
            Step::DeregisterErrorListener => teardown.push(Stmt::Expr(page_listener(template, "off"))),
        }
    }

    if visits {
        protected.push(Stmt::Return(Expr::ident("result")));
    }

    if teardown.is_empty() {
        prelude.extend(protected);
    } else {
        prelude.push(Stmt::Try {
            block: protected,
            handler: None,
            finalizer: teardown,
        });
    }
    prelude
}

fn page_listener(template: &TestTemplate, method: &str) -> Expr {
    template
        .page()
        .dot(method)
        .call(vec![Expr::str("pageerror"), Expr::ident(ON_PAGE_ERROR)])
}

fn hook_call(template: &TestTemplate, hook: &str) -> Stmt {
    Stmt::Expr(
        template
            .runtime(hook)
            .call(vec![template.page(), Expr::ident(CONTEXT)])
            .awaited(),
    )
}

fn visit(plan: &TestPlan, template: &TestTemplate, has_play_fn: bool) -> Expr {
    let in_page = Arrow::concise(
        vec![Param::Destructure(vec!["id".to_string(), "hasPlayFn".to_string()])],
        Expr::ident("__test").call(vec![Expr::ident("id"), Expr::ident("hasPlayFn")]),
    );
    let args = Expr::object([
        ("id", Expr::str(plan.context.id.as_str())),
        ("hasPlayFn", Expr::Bool(has_play_fn)),
    ]);
    template
        .page()
        .dot("evaluate")
        .call(vec![in_page, args])
        .awaited()
}

fn coverage_check(template: &TestTemplate) -> Stmt {
    let marker_probe = Arrow::concise(
        vec![],
        Expr::In(
            Box::new(Expr::str(COVERAGE_MARKER)),
            Box::new(Expr::ident("window")),
        ),
    );
    Stmt::If {
        test: template.runtime("coverageEnabled").call(vec![]),
        consequent: vec![
            Stmt::Const(
                "isCoverageSetupCorrectly".to_string(),
                template
                    .page()
                    .dot("evaluate")
                    .call(vec![marker_probe])
                    .awaited(),
            ),
            Stmt::If {
                test: Expr::ident("isCoverageSetupCorrectly").negate(),
                consequent: vec![Stmt::Throw(Expr::New(
                    Box::new(Expr::ident("Error")),
                    vec![Expr::str(COVERAGE_MISCONFIGURED)],
                ))],
                alternate: vec![],
            },
            Stmt::Expr(
                template
                    .runtime("saveCoverage")
                    .call(vec![template.page()])
                    .awaited(),
            ),
        ],
        alternate: vec![],
    }
}

/// `await testFn()` wrapped in one retry per remaining attempt
fn attempts(plan: &TestPlan, template: &TestTemplate, remaining: u32) -> Vec<Stmt> {
    let run = Stmt::Expr(Expr::ident(TEST_FN).call(vec![]).awaited());
    if remaining <= 1 {
        return vec![run];
    }

    let mut recover = vec![
        Stmt::Expr(Expr::ident("console").dot("log").call(vec![Expr::str(retry_notice(
            &plan.context.title,
            &plan.context.name,
        ))])),
        Stmt::Expr(
            template
                .runtime("resetPage")
                .call(vec![template.page()])
                .awaited(),
        ),
        Stmt::Expr(
            template
                .runtime("preparePage")
                .call(vec![template.page()])
                .awaited(),
        ),
    ];
    recover.extend(attempts(plan, template, remaining - 1));

    vec![Stmt::Try {
        block: vec![run],
        handler: Some((
            "err".to_string(),
            vec![Stmt::If {
                test: template
                    .runtime("isTransientNavigationError")
                    .call(vec![Expr::ident("err")]),
                consequent: recover,
                alternate: vec![Stmt::Throw(Expr::ident("err"))],
            }],
        )),
        finalizer: vec![],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RetryPolicy;
    use pretty_assertions::assert_eq;
    use storytest_csf::{StoryEntry, StoryId, TagDecision, TagSet};

    fn plan(has_play_fn: bool, decision: TagDecision) -> TestPlan {
        let entry = StoryEntry {
            id: StoryId::derive("Atoms/Button", "Primary").unwrap(),
            title: "Atoms/Button".to_string(),
            name: "Primary".to_string(),
            export_name: "Primary".to_string(),
            tags: TagSet::new(),
            has_play_fn,
        };
        TestPlan::for_story(&entry, decision).unwrap()
    }

    fn render(plan: &TestPlan) -> String {
        js::print(&[render_story(plan, &TestTemplate::default())])
    }

    #[test]
    fn renders_full_story_test() {
        let expected = r#"describe("Primary", () => {
  it("smoke-test", async () => {
    const context = { id: "atoms-button--primary", title: "Atoms/Button", name: "Primary" };
    const testFn = async () => {
      const onPageError = (err) => __storytest.throwUncaughtPageError(err, context);
      page.on("pageerror", onPageError);
      try {
        await __storytest.preVisit(page, context);
        const result = await page.evaluate(({ id, hasPlayFn }) => __test(id, hasPlayFn), { id: "atoms-button--primary", hasPlayFn: false });
        await __storytest.postVisit(page, context);
        if (__storytest.coverageEnabled()) {
          const isCoverageSetupCorrectly = await page.evaluate(() => "__coverage__" in window);
          if (!isCoverageSetupCorrectly) {
            throw new Error("[Test runner] An error occurred when evaluating code coverage:\nThe code in this story is not instrumented, which means the coverage setup is likely not correct.\nMore info: https://github.com/storybookjs/test-runner#setting-up-code-coverage");
          }
          await __storytest.saveCoverage(page);
        }
        return result;
      } finally {
        page.off("pageerror", onPageError);
      }
    };
    try {
      await testFn();
    } catch (err) {
      if (__storytest.isTransientNavigationError(err)) {
        console.log("An error occurred in the following story, most likely because of a navigation: \"Atoms/Button/Primary\". Retrying...");
        await __storytest.resetPage(page);
        await __storytest.preparePage(page);
        await testFn();
      } else {
        throw err;
      }
    }
  });
});
"#;
        assert_eq!(render(&plan(false, TagDecision::Run)), expected);
    }

    #[test]
    fn play_story_is_play_test() {
        let text = render(&plan(true, TagDecision::Run));
        assert!(text.contains("it(\"play-test\""));
        assert!(text.contains("hasPlayFn: true"));
    }

    #[test]
    fn skipped_story_uses_it_skip() {
        let text = render(&plan(false, TagDecision::RunSkipped));
        assert!(text.contains("it.skip(\"smoke-test\""));
    }

    #[test]
    fn no_retry_policy_runs_once() {
        let text = render(&plan(false, TagDecision::Run).with_retry(RetryPolicy::NONE));
        assert!(!text.contains("isTransientNavigationError"));
        assert_eq!(text.matches("await testFn();").count(), 1);
    }

    #[test]
    fn single_retry_calls_test_fn_twice() {
        let text = render(&plan(false, TagDecision::Run));
        assert_eq!(text.matches("await testFn();").count(), 2);
        assert_eq!(text.matches("resetPage").count(), 1);
    }

    #[test]
    fn custom_runtime_binding() {
        let template = TestTemplate::default()
            .with_runtime_module("./runtime.js")
            .with_runtime_binding("rt");
        assert_eq!(template.import_line(), "import { runner as rt } from \"./runtime.js\";");
        let text = js::print(&[render_story(&plan(false, TagDecision::Run), &template)]);
        assert!(text.contains("await rt.preVisit(page, context);"));
        assert!(!text.contains("__storytest"));
    }

    #[test]
    fn placeholder_block() {
        assert_eq!(
            render_placeholder("Empty"),
            "describe(\"Empty\", () => {\n  it(\"no stories\", () => {});\n});\n"
        );
    }
}
