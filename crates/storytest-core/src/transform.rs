//! Transform pipeline
//!
//! ```text
//! source + filename ─► extract ─► resolve title ─► tag filter ─► plan ─► emit ─► code
//! ```
//!
//! Synchronous and side-effect free apart from logging.

use crate::error::TransformError;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use storytest_codegen::{emit_module, EmitOptions, ModulePlan, PlannedStory, TestTemplate};
use storytest_csf::{
    extract, MalformedExport, ProjectLayout, SourceLanguage, TagFilterConfig, TitleResolver,
};

/// Title resolution callback: explicit module title in, display title out
pub type MakeTitle = Arc<dyn Fn(Option<&str>) -> String + Send + Sync>;

/// Options for one transform call
#[derive(Clone)]
pub struct TransformOptions {
    /// Runtime bindings for generated code
    pub template: TestTemplate,
    /// Emit a placeholder test for modules without stories
    pub insert_test_if_empty: bool,
    /// Drop original story declarations from the output
    pub clear_original_body: bool,
    /// Tag filter applied to every story
    pub tags: TagFilterConfig,
    make_title: MakeTitle,
}

impl TransformOptions {
    /// Create options with a title callback
    #[must_use]
    pub fn new(make_title: impl Fn(Option<&str>) -> String + Send + Sync + 'static) -> Self {
        Self {
            template: TestTemplate::default(),
            insert_test_if_empty: true,
            clear_original_body: true,
            tags: TagFilterConfig::default(),
            make_title: Arc::new(make_title),
        }
    }

    /// Create options whose titles resolve against `layout` for `file`
    #[must_use]
    pub fn for_file(layout: Arc<ProjectLayout>, file: &Path) -> Self {
        let relative = TitleResolver::for_file(&layout, file).relative_path().to_string();
        Self::new(move |explicit| {
            storytest_csf::resolve_title(&relative, layout.rules(), explicit)
        })
    }

    /// With a code template
    #[inline]
    #[must_use]
    pub fn with_template(mut self, template: TestTemplate) -> Self {
        self.template = template;
        self
    }

    /// With a tag filter
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: TagFilterConfig) -> Self {
        self.tags = tags;
        self
    }

    /// With placeholder insertion on or off
    #[inline]
    #[must_use]
    pub fn with_insert_test_if_empty(mut self, insert: bool) -> Self {
        self.insert_test_if_empty = insert;
        self
    }

    /// With original body clearing on or off
    #[inline]
    #[must_use]
    pub fn with_clear_original_body(mut self, clear: bool) -> Self {
        self.clear_original_body = clear;
        self
    }

    /// Resolve the display title for a module
    #[must_use]
    pub fn make_title(&self, explicit_user_title: Option<&str>) -> String {
        (self.make_title)(explicit_user_title)
    }

    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            clear_original_body: self.clear_original_body,
            insert_test_if_empty: self.insert_test_if_empty,
        }
    }
}

impl fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformOptions")
            .field("template", &self.template)
            .field("insert_test_if_empty", &self.insert_test_if_empty)
            .field("clear_original_body", &self.clear_original_body)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Read-only summary of one transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    /// Resolved module title
    pub title: String,
    /// Every story in export order with its tag decision
    pub stories: Vec<PlannedStory>,
    /// Exports excluded during extraction
    pub warnings: Vec<MalformedExport>,
    /// Number of generated tests
    pub tests: usize,
}

/// Output of one transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Reassembled module source
    pub code: String,
    /// Summary for logging and tooling
    pub report: TransformReport,
}

/// Extract, title and filter a module without emitting code
///
/// # Errors
/// Returns `TransformError::Extract` if the module cannot be analyzed
pub fn plan(
    source: &str,
    filename: &Path,
    options: &TransformOptions,
) -> Result<(ModulePlan, Vec<MalformedExport>), TransformError> {
    let module = extract(source, SourceLanguage::from_path(filename))?;
    let title = options.make_title(module.meta.title.as_deref());
    let (entries, id_warnings) = module.entries(&title);

    let mut warnings = module.warnings;
    warnings.extend(id_warnings);

    Ok((ModulePlan::build(&title, &entries, &options.tags), warnings))
}

/// Transform a story module into a test module
///
/// # Errors
/// - `TransformError::Extract` if the module cannot be analyzed
/// - `TransformError::Emit` if reassembly fails
pub fn transform(
    source: &str,
    filename: &Path,
    options: &TransformOptions,
) -> Result<TransformResult, TransformError> {
    let module = extract(source, SourceLanguage::from_path(filename))?;
    let title = options.make_title(module.meta.title.as_deref());
    let (entries, id_warnings) = module.entries(&title);
    let module_plan = ModulePlan::build(&title, &entries, &options.tags);

    let code = emit_module(
        source,
        &module.statements,
        &module.references,
        &module_plan,
        &options.template,
        options.emit_options(),
    )?;

    let mut warnings = module.warnings;
    warnings.extend(id_warnings);

    tracing::info!(
        file = %filename.display(),
        %title,
        tests = module_plan.tests.len(),
        omitted = module_plan.omitted(),
        warnings = warnings.len(),
        "transformed story module"
    );

    Ok(TransformResult {
        code,
        report: TransformReport {
            tests: module_plan.tests.len(),
            title: module_plan.title,
            stories: module_plan.stories,
            warnings,
        },
    })
}
