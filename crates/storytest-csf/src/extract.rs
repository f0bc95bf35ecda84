//! Static story-module extraction
//!
//! Reads the declaration structure of a story module with tree-sitter
//! without executing anything:
//! - the default export (module meta: title, id, tags, story filters)
//! - every named export that is a story, in declaration order
//! - member assignments such as `Primary.play = ...` that annotate a story
//!
//! Exports whose shape cannot be determined statically are dropped with a
//! [`MalformedExport`] warning; the rest of the module still extracts.

use crate::error::{ExtractError, ExtractResult, MalformedExport};
use crate::language::SourceLanguage;
use crate::story::{story_name_from_export, StoryEntry, StoryId, TagSet};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tree_sitter::{Node, Parser};

/// How deep identifier aliases (`export const A = B`) are followed
const MAX_ALIAS_DEPTH: usize = 4;

/// Exports that are never stories
const RESERVED_EXPORTS: &[&str] = &["default", "__namedExportsOrder", "__esModule"];

/// `includeStories` / `excludeStories` value
#[derive(Debug, Clone)]
pub enum ExportMatcher {
    /// Explicit export names
    Names(Vec<String>),
    /// Regular expression over export names
    Pattern(Regex),
}

impl ExportMatcher {
    /// Check if an export name matches
    #[must_use]
    pub fn matches(&self, export_name: &str) -> bool {
        match self {
            ExportMatcher::Names(names) => names.iter().any(|n| n == export_name),
            ExportMatcher::Pattern(re) => re.is_match(export_name),
        }
    }
}

/// Fields of the module's default export
#[derive(Debug, Clone, Default)]
pub struct ModuleMeta {
    /// Explicit title, if the author wrote one
    pub title: Option<String>,
    /// Explicit id prefix, replacing the title in story ids
    pub id: Option<String>,
    /// Tags applying to every story
    pub tags: TagSet,
    /// Only these exports are stories
    pub include_stories: Option<ExportMatcher>,
    /// These exports are not stories
    pub exclude_stories: Option<ExportMatcher>,
}

impl ModuleMeta {
    /// Check whether an export counts as a story
    #[must_use]
    pub fn is_story_export(&self, export_name: &str) -> bool {
        !RESERVED_EXPORTS.contains(&export_name)
            && self
                .include_stories
                .as_ref()
                .map_or(true, |m| m.matches(export_name))
            && !self
                .exclude_stories
                .as_ref()
                .is_some_and(|m| m.matches(export_name))
    }
}

/// Story-level data read from one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryExport {
    /// Exported name
    pub export_name: String,
    /// Local binding name (differs for `export { a as B }`)
    pub local_name: String,
    /// `name` annotation
    pub name: Option<String>,
    /// `storyName` annotation
    pub story_name: Option<String>,
    /// Story-level tags
    pub tags: TagSet,
    /// Whether a `play` function is attached
    pub has_play_fn: bool,
}

impl StoryExport {
    fn new(export_name: &str, local_name: &str) -> Self {
        Self {
            export_name: export_name.to_string(),
            local_name: local_name.to_string(),
            ..Self::default()
        }
    }

    /// Display name: `name`, then `storyName`, then start-cased export
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.story_name.clone())
            .unwrap_or_else(|| story_name_from_export(&self.export_name))
    }
}

/// A top-level statement that belongs to story exports
///
/// The emitter may drop it once every export it names has been replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryStatement {
    /// Byte range of the statement in the source
    pub range: Range<usize>,
    /// Export names the statement declares or annotates
    pub exports: Vec<String>,
    /// Local bindings the statement declares
    pub declares: Vec<String>,
}

/// Use of a story-declared binding somewhere in the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingReference {
    /// Referenced local name
    pub name: String,
    /// Byte offset of the identifier
    pub offset: usize,
}

/// Everything extraction learned about one module
#[derive(Debug, Clone)]
pub struct ExtractedModule {
    /// Default export fields
    pub meta: ModuleMeta,
    /// Story exports in declaration order
    pub exports: Vec<StoryExport>,
    /// Statements owned by exports
    pub statements: Vec<StoryStatement>,
    /// Exports dropped during extraction
    pub warnings: Vec<MalformedExport>,
    /// Every identifier naming a binding declared by a story statement
    pub references: Vec<BindingReference>,
}

impl ExtractedModule {
    /// Build story entries for a resolved title
    ///
    /// Exports whose id cannot be derived are returned as warnings.
    #[must_use]
    pub fn entries(&self, title: &str) -> (Vec<StoryEntry>, Vec<MalformedExport>) {
        let kind = self.meta.id.as_deref().unwrap_or(title);
        let mut entries = Vec::with_capacity(self.exports.len());
        let mut warnings = Vec::new();

        for export in &self.exports {
            match StoryId::derive(kind, &export.export_name) {
                Ok(id) => entries.push(StoryEntry {
                    id,
                    title: title.to_string(),
                    name: export.display_name(),
                    export_name: export.export_name.clone(),
                    tags: self.meta.tags.union(&export.tags),
                    has_play_fn: export.has_play_fn,
                }),
                Err(e) => {
                    tracing::warn!(export = %export.export_name, error = %e, "story id rejected");
                    warnings.push(MalformedExport::new(&export.export_name, e.to_string()));
                }
            }
        }

        (entries, warnings)
    }
}

/// Extract story metadata from module source
///
/// # Errors
/// - `ExtractError::Syntax` if the source does not parse
/// - `ExtractError::MalformedModule` if there is no default export or its
///   shape is not static
pub fn extract(source: &str, language: SourceLanguage) -> ExtractResult<ExtractedModule> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language())
        .map_err(|e| ExtractError::ParserInit(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ExtractError::ParseFailed)?;
    let root = tree.root_node();

    if root.has_error() {
        let (line, column) = first_error_position(root);
        return Err(ExtractError::Syntax { line, column });
    }

    ModuleWalker::scan(root, source).extract()
}

/// What a top-level name is bound to
#[derive(Debug, Clone, Copy)]
enum Binding<'t> {
    Value(Node<'t>),
    Function,
}

/// `Target.property = value;` at module level
#[derive(Debug, Clone)]
struct Assignment<'t> {
    target: &'t str,
    property: &'t str,
    value: Node<'t>,
    range: Range<usize>,
}

struct ModuleWalker<'t> {
    root: Node<'t>,
    source: &'t str,
    locals: HashMap<&'t str, Binding<'t>>,
    assignments: Vec<Assignment<'t>>,
    export_statements: Vec<Node<'t>>,
}

impl<'t> ModuleWalker<'t> {
    fn scan(root: Node<'t>, source: &'t str) -> Self {
        let mut walker = Self {
            root,
            source,
            locals: HashMap::new(),
            assignments: Vec::new(),
            export_statements: Vec::new(),
        };

        for node in named_children(root) {
            match node.kind() {
                "lexical_declaration" | "variable_declaration" => walker.bind_declarators(node),
                "function_declaration" | "generator_function_declaration" => {
                    walker.bind_function(node);
                }
                "expression_statement" => walker.record_assignment(node),
                "export_statement" => {
                    if let Some(decl) = node.child_by_field_name("declaration") {
                        match decl.kind() {
                            "lexical_declaration" | "variable_declaration" => {
                                walker.bind_declarators(decl);
                            }
                            "function_declaration" | "generator_function_declaration" => {
                                walker.bind_function(decl);
                            }
                            _ => {}
                        }
                    }
                    walker.export_statements.push(node);
                }
                _ => {}
            }
        }

        walker
    }

    fn text(&self, node: Node<'t>) -> &'t str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn bind_declarators(&mut self, declaration: Node<'t>) {
        for declarator in named_children(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let name = declarator.child_by_field_name("name");
            let value = declarator.child_by_field_name("value");
            if let (Some(name), Some(value)) = (name, value) {
                if name.kind() == "identifier" {
                    self.locals.insert(self.text(name), Binding::Value(value));
                }
            }
        }
    }

    fn bind_function(&mut self, declaration: Node<'t>) {
        if let Some(name) = declaration.child_by_field_name("name") {
            self.locals.insert(self.text(name), Binding::Function);
        }
    }

    fn record_assignment(&mut self, statement: Node<'t>) {
        let Some(expr) = statement.named_child(0) else {
            return;
        };
        if expr.kind() != "assignment_expression" {
            return;
        }
        let (Some(left), Some(right)) = (
            expr.child_by_field_name("left"),
            expr.child_by_field_name("right"),
        ) else {
            return;
        };
        if left.kind() != "member_expression" {
            return;
        }
        let (Some(object), Some(property)) = (
            left.child_by_field_name("object"),
            left.child_by_field_name("property"),
        ) else {
            return;
        };
        if object.kind() == "identifier" {
            self.assignments.push(Assignment {
                target: self.text(object),
                property: self.text(property),
                value: right,
                range: statement.byte_range(),
            });
        }
    }

    fn extract(self) -> ExtractResult<ExtractedModule> {
        let (default_export, meta_value) = self.find_meta()?;
        let meta = self.read_meta(meta_value)?;
        let mut module = ExtractedModule {
            meta,
            exports: Vec::new(),
            statements: Vec::new(),
            warnings: Vec::new(),
            references: Vec::new(),
        };

        for statement in self.export_statements.iter().copied() {
            if Some(statement.id()) != default_export {
                self.read_export_statement(statement, &mut module);
            }
        }

        self.record_assignment_statements(&mut module);
        module.references = self.references_to(&module.statements);

        tracing::debug!(
            stories = module.exports.len(),
            skipped = module.warnings.len(),
            "extracted story module"
        );
        Ok(module)
    }

    /// Locate the meta value
    ///
    /// Returns the id of an `export default ...` statement (clause exports
    /// are still read for stories) and the exported value node.
    fn find_meta(&self) -> ExtractResult<(Option<usize>, Node<'t>)> {
        if let Some(statement) = self
            .export_statements
            .iter()
            .copied()
            .find(|node| is_default_export(*node))
        {
            let value = statement
                .child_by_field_name("value")
                .ok_or_else(|| ExtractError::malformed("default export is not an object"))?;
            return Ok((Some(statement.id()), value));
        }

        // `export { meta as default }`
        let local = self
            .export_statements
            .iter()
            .filter(|node| node.child_by_field_name("source").is_none())
            .flat_map(|node| self.clause_names(*node))
            .find_map(|(exported, local)| (exported == "default").then_some(local))
            .ok_or_else(|| ExtractError::malformed("module has no default export"))?;

        match self.locals.get(local.as_str()) {
            Some(Binding::Value(value)) => Ok((None, *value)),
            _ => Err(ExtractError::malformed(format!(
                "default export '{local}' is not a static object"
            ))),
        }
    }

    fn read_meta(&self, value: Node<'t>) -> ExtractResult<ModuleMeta> {
        let object = self
            .resolve_object(value, 0)
            .ok_or_else(|| ExtractError::malformed("default export is not a static object"))?;

        let mut meta = ModuleMeta::default();
        for member in named_children(object) {
            match member.kind() {
                "spread_element" => {
                    return Err(ExtractError::malformed(
                        "spread in default export prevents static analysis",
                    ));
                }
                "shorthand_property_identifier" => {
                    let key = self.text(member);
                    if is_meta_key(key) {
                        return Err(ExtractError::malformed(format!("dynamic meta field '{key}'")));
                    }
                }
                "pair" => self.read_meta_pair(member, &mut meta)?,
                _ => {}
            }
        }
        Ok(meta)
    }

    fn read_meta_pair(&self, pair: Node<'t>, meta: &mut ModuleMeta) -> ExtractResult<()> {
        let (Some(key), Some(value)) = (
            pair.child_by_field_name("key").and_then(|k| self.property_key(k)),
            pair.child_by_field_name("value"),
        ) else {
            return Ok(());
        };

        let dynamic = || ExtractError::malformed(format!("dynamic meta field '{key}'"));
        match key.as_str() {
            "title" => meta.title = Some(self.string_value(value).ok_or_else(dynamic)?),
            "id" => meta.id = Some(self.string_value(value).ok_or_else(dynamic)?),
            "tags" => meta.tags = self.string_array(value).ok_or_else(dynamic)?.into_iter().collect(),
            "includeStories" => meta.include_stories = Some(self.export_matcher(value)?),
            "excludeStories" => meta.exclude_stories = Some(self.export_matcher(value)?),
            _ => {}
        }
        Ok(())
    }

    fn export_matcher(&self, value: Node<'t>) -> ExtractResult<ExportMatcher> {
        let value = unwrap_expression(value);
        match value.kind() {
            "array" => self
                .string_array(value)
                .map(ExportMatcher::Names)
                .ok_or_else(|| ExtractError::malformed("story filter must list string literals")),
            "regex" => {
                let pattern = value
                    .child_by_field_name("pattern")
                    .map(|p| self.text(p))
                    .unwrap_or_default();
                let flags = value
                    .child_by_field_name("flags")
                    .map(|f| self.text(f))
                    .unwrap_or_default();
                RegexBuilder::new(pattern)
                    .case_insensitive(flags.contains('i'))
                    .build()
                    .map(ExportMatcher::Pattern)
                    .map_err(|e| ExtractError::malformed(format!("invalid story filter regex: {e}")))
            }
            other => Err(ExtractError::malformed(format!(
                "story filter must be an array or regex, found {other}"
            ))),
        }
    }

    fn read_export_statement(&self, statement: Node<'t>, module: &mut ExtractedModule) {
        if statement.child_by_field_name("source").is_some() {
            for name in self.clause_names(statement) {
                if module.meta.is_story_export(&name.0) {
                    self.warn(module, &name.0, "re-exported from another module");
                }
            }
            return;
        }

        if let Some(decl) = statement.child_by_field_name("declaration") {
            self.read_declaration(statement, decl, module);
            return;
        }

        let names = self.clause_names(statement);
        for (exported, local) in &names {
            if !module.meta.is_story_export(exported) {
                continue;
            }
            match self.locals.get(local.as_str()) {
                Some(Binding::Value(value)) => self.push_story(module, exported, local, *value),
                Some(Binding::Function) => module.exports.push(self.annotate(StoryExport::new(exported, local))),
                None => self.warn(module, exported, "exported binding is not declared in this module"),
            }
        }
        module.statements.push(StoryStatement {
            range: statement.byte_range(),
            exports: names.into_iter().map(|(exported, _)| exported).collect(),
            declares: Vec::new(),
        });
    }

    fn read_declaration(&self, statement: Node<'t>, decl: Node<'t>, module: &mut ExtractedModule) {
        match decl.kind() {
            "lexical_declaration" | "variable_declaration" => {
                let mut names = Vec::new();
                for declarator in named_children(decl) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name_node) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let name = self.text(name_node);
                    if name_node.kind() != "identifier" {
                        self.warn(module, name, "destructured exports cannot be analyzed statically");
                        continue;
                    }
                    names.push(name.to_string());
                    if !module.meta.is_story_export(name) {
                        continue;
                    }
                    match declarator.child_by_field_name("value") {
                        Some(value) => self.push_story(module, name, name, value),
                        None => self.warn(module, name, "story has no initializer"),
                    }
                }
                module.statements.push(StoryStatement {
                    range: statement.byte_range(),
                    declares: names.clone(),
                    exports: names,
                });
            }
            "function_declaration" | "generator_function_declaration" => {
                let Some(name) = decl.child_by_field_name("name").map(|n| self.text(n)) else {
                    return;
                };
                if module.meta.is_story_export(name) {
                    module.exports.push(self.annotate(StoryExport::new(name, name)));
                }
                module.statements.push(StoryStatement {
                    range: statement.byte_range(),
                    exports: vec![name.to_string()],
                    declares: vec![name.to_string()],
                });
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = decl.child_by_field_name("name").map(|n| self.text(n)) {
                    if module.meta.is_story_export(name) {
                        self.warn(module, name, "class exports cannot be stories");
                    }
                }
            }
            // Type-level declarations never produce stories
            _ => {}
        }
    }

    fn push_story(&self, module: &mut ExtractedModule, exported: &str, local: &str, value: Node<'t>) {
        match self.story_from_value(StoryExport::new(exported, local), value, 0) {
            Ok(story) => module.exports.push(self.annotate(story)),
            Err(reason) => self.warn(module, exported, &reason),
        }
    }

    fn story_from_value(&self, mut story: StoryExport, value: Node<'t>, depth: usize) -> Result<StoryExport, String> {
        let value = unwrap_expression(value);
        match value.kind() {
            "object" => {
                self.read_story_object(&mut story, value)?;
                Ok(story)
            }
            "arrow_function" | "function_expression" | "function" | "generator_function"
            | "call_expression" => Ok(story),
            "identifier" => match self.locals.get(self.text(value)) {
                Some(Binding::Value(target)) if depth < MAX_ALIAS_DEPTH => {
                    self.story_from_value(story, *target, depth + 1)
                }
                Some(Binding::Function) => Ok(story),
                _ => Err(format!(
                    "'{}' cannot be resolved statically",
                    self.text(value)
                )),
            },
            other => Err(format!("unsupported story shape '{other}'")),
        }
    }

    fn read_story_object(&self, story: &mut StoryExport, object: Node<'t>) -> Result<(), String> {
        for member in named_children(object) {
            match member.kind() {
                "spread_element" => {
                    return Err("spread in story object prevents static analysis".to_string());
                }
                "shorthand_property_identifier" => match self.text(member) {
                    "play" => story.has_play_fn = true,
                    key @ ("name" | "storyName" | "tags") => {
                        return Err(format!("dynamic story field '{key}'"));
                    }
                    _ => {}
                },
                "method_definition" => {
                    if member.child_by_field_name("name").map(|n| self.text(n)) == Some("play") {
                        story.has_play_fn = true;
                    }
                }
                "pair" => {
                    let (Some(key), Some(value)) = (
                        member.child_by_field_name("key").and_then(|k| self.property_key(k)),
                        member.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    self.apply_story_field(story, &key, value)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_story_field(&self, story: &mut StoryExport, key: &str, value: Node<'t>) -> Result<(), String> {
        let dynamic = || format!("dynamic story field '{key}'");
        match key {
            "name" => story.name = Some(self.string_value(value).ok_or_else(dynamic)?),
            "storyName" => story.story_name = Some(self.string_value(value).ok_or_else(dynamic)?),
            "tags" => {
                for tag in self.string_array(value).ok_or_else(dynamic)? {
                    story.tags.insert(tag);
                }
            }
            "play" => story.has_play_fn = true,
            _ => {}
        }
        Ok(())
    }

    /// Merge `Local.prop = ...` annotations into a story
    fn annotate(&self, mut story: StoryExport) -> StoryExport {
        let local_name = story.local_name.clone();
        for assignment in self.assignments.iter().filter(|a| a.target == local_name) {
            let key = match assignment.property {
                "storyName" => "storyName",
                "tags" => "tags",
                "play" => "play",
                _ => continue,
            };
            if let Err(reason) = self.apply_story_field(&mut story, key, assignment.value) {
                tracing::warn!(export = %story.export_name, %reason, "story annotation ignored");
            }
        }
        story
    }

    fn record_assignment_statements(&self, module: &mut ExtractedModule) {
        let mut by_local: HashMap<&str, Vec<String>> = HashMap::new();
        for story in &module.exports {
            by_local
                .entry(story.local_name.as_str())
                .or_default()
                .push(story.export_name.clone());
        }

        let mut owned = Vec::new();
        for assignment in &self.assignments {
            if let Some(exports) = by_local.get(assignment.target) {
                owned.push(StoryStatement {
                    range: assignment.range.clone(),
                    exports: exports.clone(),
                    declares: Vec::new(),
                });
            }
        }
        module.statements.extend(owned);
    }

    /// Identifiers anywhere in the module that name a binding declared by
    /// one of `statements`, including the declaring identifiers themselves
    fn references_to(&self, statements: &[StoryStatement]) -> Vec<BindingReference> {
        let declared: HashSet<&str> = statements
            .iter()
            .flat_map(|s| s.declares.iter().map(String::as_str))
            .collect();
        if declared.is_empty() {
            return Vec::new();
        }

        let mut references = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if matches!(node.kind(), "identifier" | "shorthand_property_identifier") {
                let name = self.text(node);
                if declared.contains(name) {
                    references.push(BindingReference {
                        name: name.to_string(),
                        offset: node.start_byte(),
                    });
                }
                continue;
            }
            stack.extend(named_children(node));
        }
        references.sort_by_key(|r| r.offset);
        references
    }

    /// `(exported, local)` pairs of an export clause, or `*`
    fn clause_names(&self, statement: Node<'t>) -> Vec<(String, String)> {
        let Some(clause) = named_children(statement)
            .into_iter()
            .find(|n| n.kind() == "export_clause")
        else {
            return vec![("*".to_string(), "*".to_string())];
        };

        named_children(clause)
            .into_iter()
            .filter(|n| n.kind() == "export_specifier")
            .filter_map(|spec| {
                let local = spec.child_by_field_name("name").map(|n| self.name_text(n))?;
                let exported = spec
                    .child_by_field_name("alias")
                    .map_or_else(|| local.clone(), |n| self.name_text(n));
                Some((exported, local))
            })
            .collect()
    }

    fn name_text(&self, node: Node<'t>) -> String {
        if node.kind() == "string" {
            unquote(self.text(node))
        } else {
            self.text(node).to_string()
        }
    }

    fn warn(&self, module: &mut ExtractedModule, export_name: &str, reason: &str) {
        tracing::warn!(export = export_name, reason, "story export excluded");
        module.warnings.push(MalformedExport::new(export_name, reason));
    }

    fn resolve_object(&self, value: Node<'t>, depth: usize) -> Option<Node<'t>> {
        let value = unwrap_expression(value);
        match value.kind() {
            "object" => Some(value),
            "identifier" if depth < MAX_ALIAS_DEPTH => match self.locals.get(self.text(value)) {
                Some(Binding::Value(target)) => self.resolve_object(*target, depth + 1),
                _ => None,
            },
            _ => None,
        }
    }

    fn property_key(&self, key: Node<'t>) -> Option<String> {
        match key.kind() {
            "property_identifier" | "number" => Some(self.text(key).to_string()),
            "string" => Some(unquote(self.text(key))),
            _ => None,
        }
    }

    fn string_value(&self, node: Node<'t>) -> Option<String> {
        let node = unwrap_expression(node);
        match node.kind() {
            "string" => Some(unquote(self.text(node))),
            "template_string" => {
                let has_substitution = named_children(node)
                    .iter()
                    .any(|c| c.kind() == "template_substitution");
                (!has_substitution).then(|| unquote(self.text(node)))
            }
            _ => None,
        }
    }

    fn string_array(&self, node: Node<'t>) -> Option<Vec<String>> {
        let node = unwrap_expression(node);
        if node.kind() != "array" {
            return None;
        }
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .map(|c| self.string_value(c))
            .collect()
    }
}

fn is_meta_key(key: &str) -> bool {
    matches!(key, "title" | "id" | "tags" | "includeStories" | "excludeStories")
}

fn is_default_export(statement: Node<'_>) -> bool {
    children(statement).iter().any(|c| c.kind() == "default")
}

/// Strip `( )`, `as T`, `satisfies T`, `x!` and `<T>x` wrappers
fn unwrap_expression(mut node: Node<'_>) -> Node<'_> {
    loop {
        let inner = match node.kind() {
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" => node.named_child(0),
            "type_assertion" => node.named_child(node.named_child_count().saturating_sub(1)),
            _ => None,
        };
        match inner {
            Some(inner) => node = inner,
            None => return node,
        }
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn first_error_position(root: Node<'_>) -> (usize, usize) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let point = node.start_position();
            return (point.row + 1, point.column + 1);
        }
        let mut kids = children(node);
        kids.reverse();
        stack.extend(kids);
    }
    let point = root.start_position();
    (point.row + 1, point.column + 1)
}

/// Decode a JS string literal including its quotes
fn unquote(raw: &str) -> String {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();
    unescape(chars.as_str())
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|&h| h != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex);
            }
            // Line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str) {
    if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        out.push(c);
    }
}
