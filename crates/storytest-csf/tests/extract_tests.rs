use pretty_assertions::assert_eq;
use storytest_csf::{extract, ProjectLayout, SourceLanguage, StoryLocationRule, TitleResolver};
use std::path::Path;

const BUTTON_STORIES: &str = r#"
import type { Meta, StoryObj } from '@storybook/react';
import { Button } from './Button';

const meta: Meta<typeof Button> = {
  component: Button,
  tags: ['autodocs'],
};
export default meta;

type Story = StoryObj<typeof Button>;

export const Primary: Story = {
  args: { primary: true, label: 'Button' },
};

export const WithInteraction: Story = {
  tags: ['interaction'],
  play: async ({ canvasElement }) => {
    await userEvent.click(canvasElement);
  },
};

export const Flaky: Story = { tags: ['flaky'] };
"#;

#[test]
fn test_path_title_and_entries() {
    let layout = ProjectLayout::new("/work")
        .with_rule(StoryLocationRule::from_directory("./src/components", None, "Components").unwrap());
    let file = Path::new("/work/src/components/Button.stories.ts");

    let module = extract(BUTTON_STORIES, SourceLanguage::from_path(file)).unwrap();
    let resolver = TitleResolver::for_file(&layout, file);
    let title = resolver.resolve(module.meta.title.as_deref());
    assert_eq!(title, "Components/Button");

    let (entries, warnings) = module.entries(&title);
    assert!(warnings.is_empty());

    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "components-button--primary",
            "components-button--with-interaction",
            "components-button--flaky",
        ]
    );

    assert!(!entries[0].has_play_fn);
    assert!(entries[1].has_play_fn);
    assert_eq!(entries[1].name, "With Interaction");

    let tags: Vec<&str> = entries[1].tags.iter().collect();
    assert_eq!(tags, vec!["autodocs", "interaction"]);
}

#[test]
fn test_malformed_export_does_not_fail_module() {
    let source = r#"
export default { title: 'Mixed' };
const shared = { args: {} };
export const Good = {};
export const Bad = { ...shared, name: 'Bad' };
export const AlsoGood = () => null;
"#;

    let module = extract(source, SourceLanguage::Tsx).unwrap();
    let (entries, _) = module.entries("Mixed");

    let names: Vec<&str> = entries.iter().map(|e| e.export_name.as_str()).collect();
    assert_eq!(names, vec!["Good", "AlsoGood"]);
    assert_eq!(module.warnings.len(), 1);
    assert_eq!(module.warnings[0].export_name, "Bad");
}

#[test]
fn test_module_without_stories() {
    let module = extract("export default { title: 'Empty' };", SourceLanguage::Tsx).unwrap();
    assert!(module.exports.is_empty());
    assert!(module.statements.is_empty());
}

#[test]
fn test_story_statement_ranges_cover_exports() {
    let source = "export default { title: 'R' };\nexport const A = {}, B = {};\n";
    let module = extract(source, SourceLanguage::Tsx).unwrap();

    assert_eq!(module.statements.len(), 1);
    let statement = &module.statements[0];
    assert_eq!(&source[statement.range.clone()], "export const A = {}, B = {};");
    assert_eq!(statement.exports, vec!["A".to_string(), "B".to_string()]);
}
