//! Module emission
//!
//! Reassembles a story module around its generated tests:
//!
//! ```text
//! <runtime import>
//! <original source, minus cleared story statements>
//! <describe(title) block>
//! ```
//!
//! Everything outside cleared statements is preserved byte for byte. A
//! story statement is only cleared when no kept code still names a binding
//! it declares.

use crate::plan::ModulePlan;
use crate::render::{render_module, render_placeholder, TestTemplate};
use std::collections::HashSet;
use std::ops::Range;
use storytest_csf::{BindingReference, StoryStatement};

/// Emission errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// Statement span does not fit the source
    #[error("statement span {start}..{end} is outside the source or splits a character")]
    InvalidSpan { start: usize, end: usize },
}

/// Emission switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Drop the original declarations of emitted stories
    pub clear_original_body: bool,
    /// Add a placeholder test when no story is emitted
    pub insert_test_if_empty: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            clear_original_body: true,
            insert_test_if_empty: true,
        }
    }
}

/// Emit the transformed module
///
/// `references` lists the identifiers naming story-declared bindings, so
/// declarations still used by kept code survive clearing.
///
/// # Errors
/// Returns `EmitError::InvalidSpan` if a statement range does not index `source`
pub fn emit_module(
    source: &str,
    statements: &[StoryStatement],
    references: &[BindingReference],
    plan: &ModulePlan,
    template: &TestTemplate,
    options: EmitOptions,
) -> Result<String, EmitError> {
    let Some(block) = render_module(plan, template) else {
        if options.insert_test_if_empty {
            tracing::debug!(title = %plan.title, "no emitted stories, inserting placeholder");
            return Ok(append_block(source.to_string(), &render_placeholder(&plan.title)));
        }
        return Ok(source.to_string());
    };

    let removed = if options.clear_original_body {
        cleared_spans(source, statements, references, plan)?
    } else {
        Vec::new()
    };

    let mut out = String::with_capacity(source.len() + block.len() + 128);
    out.push_str(&template.import_line());
    out.push('\n');
    out.push_str(&without_spans(source, &removed));

    tracing::debug!(
        title = %plan.title,
        tests = plan.tests.len(),
        cleared = removed.len(),
        "emitted module"
    );
    Ok(append_block(out, &block))
}

/// Spans owned entirely by emitted stories and unused by kept code,
/// sorted and non-overlapping
fn cleared_spans(
    source: &str,
    statements: &[StoryStatement],
    references: &[BindingReference],
    plan: &ModulePlan,
) -> Result<Vec<Range<usize>>, EmitError> {
    let mut cleared: Vec<&StoryStatement> = statements
        .iter()
        .filter(|s| !s.exports.is_empty() && s.exports.iter().all(|e| plan.emits(e)))
        .collect();

    // Keeping a statement keeps its own references, so iterate to a fixpoint
    loop {
        let used: HashSet<&str> = references
            .iter()
            .filter(|r| !cleared.iter().any(|s| s.range.contains(&r.offset)))
            .map(|r| r.name.as_str())
            .collect();

        let before = cleared.len();
        cleared.retain(|s| {
            let kept = s.declares.iter().find(|d| used.contains(d.as_str()));
            if let Some(binding) = kept {
                tracing::debug!(%binding, "story declaration still referenced, keeping it");
            }
            kept.is_none()
        });
        if cleared.len() == before {
            break;
        }
    }

    let mut spans: Vec<Range<usize>> = cleared.iter().map(|s| s.range.clone()).collect();

    for span in &spans {
        let valid = span.start <= span.end
            && span.end <= source.len()
            && source.is_char_boundary(span.start)
            && source.is_char_boundary(span.end);
        if !valid {
            return Err(EmitError::InvalidSpan {
                start: span.start,
                end: span.end,
            });
        }
    }

    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    Ok(merged)
}

/// Copy `source` skipping spans and the line break right after each
fn without_spans(source: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..span.start]);
        let rest = &source[span.end..];
        cursor = span.end
            + if rest.starts_with("\r\n") {
                2
            } else if rest.starts_with('\n') {
                1
            } else {
                0
            };
    }
    out.push_str(&source[cursor..]);
    out
}

fn append_block(mut out: String, block: &str) -> String {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(block);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::TestPlan;
    use storytest_csf::{StoryEntry, StoryId, TagDecision, TagSet};

    fn plan_for(exports: &[(&str, TagDecision)]) -> ModulePlan {
        let mut plan = ModulePlan {
            title: "Demo".to_string(),
            ..ModulePlan::default()
        };
        for (name, decision) in exports {
            let entry = StoryEntry {
                id: StoryId::derive("Demo", name).unwrap(),
                title: "Demo".to_string(),
                name: (*name).to_string(),
                export_name: (*name).to_string(),
                tags: TagSet::new(),
                has_play_fn: false,
            };
            plan.tests.extend(TestPlan::for_story(&entry, *decision));
        }
        plan
    }

    fn statement(source: &str, text: &str, exports: &[&str]) -> StoryStatement {
        let start = source.find(text).unwrap();
        StoryStatement {
            range: start..start + text.len(),
            exports: exports.iter().map(|e| (*e).to_string()).collect(),
            declares: exports.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    #[test]
    fn clears_emitted_story_statements() {
        let source = "export default { title: 'Demo' };\nexport const A = {};\nexport const B = {};\n";
        let statements = vec![
            statement(source, "export const A = {};", &["A"]),
            statement(source, "export const B = {};", &["B"]),
        ];
        let plan = plan_for(&[("A", TagDecision::Run)]);

        let out = emit_module(source, &statements, &[], &plan, &TestTemplate::default(), EmitOptions::default()).unwrap();
        assert!(out.starts_with("import { runner as __storytest } from \"@storytest/runtime\";\n"));
        assert!(out.contains("export default { title: 'Demo' };\nexport const B = {};\n"));
        assert!(!out.contains("export const A"));
        assert!(out.contains("describe(\"Demo\""));
    }

    #[test]
    fn keeps_bodies_when_not_clearing() {
        let source = "export default {};\nexport const A = {};\n";
        let statements = vec![statement(source, "export const A = {};", &["A"])];
        let plan = plan_for(&[("A", TagDecision::Run)]);
        let options = EmitOptions {
            clear_original_body: false,
            ..EmitOptions::default()
        };

        let out = emit_module(source, &statements, &[], &plan, &TestTemplate::default(), options).unwrap();
        assert!(out.contains(source));
    }

    #[test]
    fn shared_statement_kept_unless_all_cleared() {
        let source = "export default {};\nexport const A = {}, helper = 1;\n";
        let statements = vec![statement(source, "export const A = {}, helper = 1;", &["A", "helper"])];
        let plan = plan_for(&[("A", TagDecision::Run)]);

        let out = emit_module(source, &statements, &[], &plan, &TestTemplate::default(), EmitOptions::default()).unwrap();
        assert!(out.contains("export const A = {}, helper = 1;"));
    }

    #[test]
    fn empty_module_gets_placeholder() {
        let source = "export default { title: 'Demo' };";
        let plan = plan_for(&[]);

        let out = emit_module(source, &[], &[], &plan, &TestTemplate::default(), EmitOptions::default()).unwrap();
        assert_eq!(
            out,
            "export default { title: 'Demo' };\n\ndescribe(\"Demo\", () => {\n  it(\"no stories\", () => {});\n});\n"
        );
    }

    #[test]
    fn empty_module_untouched_without_placeholder() {
        let source = "export default {};\n";
        let plan = plan_for(&[]);
        let options = EmitOptions {
            insert_test_if_empty: false,
            ..EmitOptions::default()
        };

        let out = emit_module(source, &[], &[], &plan, &TestTemplate::default(), options).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn invalid_span_is_rejected() {
        let source = "export default {};";
        let statements = vec![StoryStatement {
            range: 5..500,
            exports: vec!["A".to_string()],
            declares: Vec::new(),
        }];
        let plan = plan_for(&[("A", TagDecision::Run)]);

        let result = emit_module(source, &statements, &[], &plan, &TestTemplate::default(), EmitOptions::default());
        assert_eq!(result, Err(EmitError::InvalidSpan { start: 5, end: 500 }));
    }

    fn reference(source: &str, needle: &str, nth: usize) -> BindingReference {
        let offset = source.match_indices(needle).nth(nth).unwrap().0;
        BindingReference {
            name: needle.to_string(),
            offset,
        }
    }

    #[test]
    fn referenced_declaration_is_kept() {
        let source = "export default {};\nexport const A = {};\nconst helper = { ...A };\n";
        let statements = vec![statement(source, "export const A = {};", &["A"])];
        let references = vec![reference(source, "A", 0), reference(source, "A", 1)];
        let plan = plan_for(&[("A", TagDecision::Run)]);

        let out = emit_module(source, &statements, &references, &plan, &TestTemplate::default(), EmitOptions::default()).unwrap();
        assert!(out.contains("export const A = {};\nconst helper = { ...A };"));
    }

    #[test]
    fn references_inside_cleared_statements_do_not_keep() {
        let source = "export default {};\nexport const A = {};\nexport const B = { ...A };\n";
        let statements = vec![
            statement(source, "export const A = {};", &["A"]),
            statement(source, "export const B = { ...A };", &["B"]),
        ];
        let references = vec![
            reference(source, "A", 0),
            reference(source, "B", 0),
            reference(source, "A", 1),
        ];
        let plan = plan_for(&[("A", TagDecision::Run), ("B", TagDecision::Run)]);

        let out = emit_module(source, &statements, &references, &plan, &TestTemplate::default(), EmitOptions::default()).unwrap();
        assert!(!out.contains("export const A"));
        assert!(!out.contains("export const B"));
    }

    #[test]
    fn kept_statement_keeps_its_own_references() {
        // C is omitted and reads B, which reads A
        let source = "export default {};\nexport const A = {};\nexport const B = { ...A };\nexport const C = { ...B };\n";
        let statements = vec![
            statement(source, "export const A = {};", &["A"]),
            statement(source, "export const B = { ...A };", &["B"]),
            statement(source, "export const C = { ...B };", &["C"]),
        ];
        let references = vec![
            reference(source, "A", 0),
            reference(source, "B", 0),
            reference(source, "A", 1),
            reference(source, "C", 0),
            reference(source, "B", 1),
        ];
        let plan = plan_for(&[("A", TagDecision::Run), ("B", TagDecision::Run), ("C", TagDecision::Omit)]);

        let out = emit_module(source, &statements, &references, &plan, &TestTemplate::default(), EmitOptions::default()).unwrap();
        assert!(out.contains("export const A = {};\nexport const B = { ...A };\nexport const C = { ...B };"));
    }

    #[test]
    fn removal_strips_trailing_crlf() {
        let out = without_spans("a\r\nb\r\nc", &[3..4]);
        assert_eq!(out, "a\r\nc");
    }
}
