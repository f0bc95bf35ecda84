use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use storytest_core::{
    transform, ServiceError, StoriesEntry, StorytestConfig, TransformOptions, TransformService,
};
use storytest_csf::{ProjectLayout, StoryLocationRule, TagDecision, TagFilterConfig};
use storytest_test_utils::{BUTTON_STORIES, EMPTY_STORIES, LEGACY_STORIES, SPREAD_STORIES, TAGGED_STORIES};

fn components_layout() -> Arc<ProjectLayout> {
    Arc::new(
        ProjectLayout::new("/repo")
            .with_rule(StoryLocationRule::new("src/components/**", "Components").unwrap()),
    )
}

fn options_for(file: &str) -> TransformOptions {
    TransformOptions::for_file(components_layout(), Path::new(file))
}

#[test]
fn test_explicit_title_two_tests_in_order() {
    let file = "/repo/src/components/Button.stories.tsx";
    let result = transform(BUTTON_STORIES, Path::new(file), &options_for(file)).unwrap();

    assert_eq!(result.report.title, "Atoms/Button");
    assert_eq!(result.report.tests, 2);

    let code = &result.code;
    assert!(code.starts_with("import { runner as __storytest } from \"@storytest/runtime\";\n"));
    assert!(code.contains("describe(\"Atoms/Button\", () => {"));
    let primary = code.find("describe(\"Primary\"").unwrap();
    let secondary = code.find("describe(\"Secondary\"").unwrap();
    assert!(primary < secondary);
    assert!(code.contains("id: \"atoms-button--primary\""));
    assert!(code.contains("id: \"atoms-button--secondary\""));
}

#[test]
fn test_title_from_path_rule() {
    let file = "/repo/src/components/Header.stories.jsx";
    let result = transform(TAGGED_STORIES, Path::new(file), &options_for(file)).unwrap();

    assert_eq!(result.report.title, "Components/Header");
    assert!(result.code.contains("id: \"components-header--logged-in\""));
}

#[test]
fn test_tag_filter_omits_and_skips() {
    let file = "/repo/src/components/Header.stories.jsx";
    let tags = TagFilterConfig::new()
        .with_exclude(["flaky"])
        .with_skip(["skip-test"]);
    let result = transform(TAGGED_STORIES, Path::new(file), &options_for(file).with_tags(tags)).unwrap();

    let decisions: Vec<(&str, TagDecision)> = result
        .report
        .stories
        .iter()
        .map(|s| (s.export_name.as_str(), s.decision))
        .collect();
    assert_eq!(
        decisions,
        vec![
            ("LoggedOut", TagDecision::Run),
            ("LoggedIn", TagDecision::Run),
            ("Flaky", TagDecision::Omit),
            ("Later", TagDecision::RunSkipped),
        ]
    );
    assert_eq!(result.report.tests, 3);

    let code = &result.code;
    assert!(!code.contains("describe(\"Flaky\""));
    assert!(code.contains("export const Flaky"));
    assert!(code.contains("it.skip(\"smoke-test\""));
    assert!(code.contains("it(\"play-test\""));
}

#[test]
fn test_include_filter_keeps_module_tags() {
    let file = "/repo/src/components/Header.stories.jsx";
    let tags = TagFilterConfig::new().with_include(["autodocs"]);
    let result = transform(TAGGED_STORIES, Path::new(file), &options_for(file).with_tags(tags)).unwrap();

    // module-level `autodocs` reaches every story
    assert_eq!(result.report.tests, 4);
}

#[test]
fn test_malformed_export_does_not_fail_module() {
    let file = "/repo/src/components/Spread.stories.ts";
    let result = transform(SPREAD_STORIES, Path::new(file), &options_for(file)).unwrap();

    assert_eq!(result.report.tests, 1);
    assert_eq!(result.report.warnings.len(), 1);
    assert_eq!(result.report.warnings[0].export_name, "Spread");
    assert!(result.code.contains("describe(\"Plain\""));
    assert!(result.code.contains("export const Spread = { ...base };"));
}

const COMPOSED_STORIES: &str = r#"export default { title: 'Atoms/Toggle' };

export const Primary = { args: { primary: true } };

export const Secondary = { ...Primary, args: { primary: false } };
"#;

#[test]
fn test_story_spread_into_excluded_story_keeps_its_declaration() {
    let file = "/repo/src/components/Toggle.stories.tsx";
    let result = transform(COMPOSED_STORIES, Path::new(file), &options_for(file)).unwrap();

    assert_eq!(result.report.tests, 1);
    assert_eq!(result.report.warnings[0].export_name, "Secondary");

    let code = &result.code;
    let primary = code.find("export const Primary = { args: { primary: true } };").unwrap();
    let secondary = code.find("export const Secondary = { ...Primary").unwrap();
    assert!(primary < secondary);
    assert!(code.contains("describe(\"Primary\""));
}

#[test]
fn test_omitted_story_reading_emitted_story_keeps_its_declaration() {
    let source = r#"export default { title: 'Atoms/Toggle' };

export const Primary = { args: { primary: true } };

export const Flaky = { tags: ['flaky'], args: { ...Primary.args } };

export const Plain = {};
"#;
    let file = "/repo/src/components/Toggle.stories.tsx";
    let options = options_for(file).with_tags(TagFilterConfig::new().with_exclude(["flaky"]));
    let result = transform(source, Path::new(file), &options).unwrap();

    assert_eq!(result.report.tests, 2);

    let code = &result.code;
    assert!(code.contains("export const Primary = { args: { primary: true } };"));
    assert!(code.contains("export const Flaky = { tags: ['flaky'], args: { ...Primary.args } };"));
    // nothing refers to Plain, so its declaration is still cleared
    assert!(!code.contains("export const Plain"));
    assert!(code.contains("describe(\"Plain\""));
}

#[test]
fn test_default_export_clause() {
    let source = "const meta = { title: 'Atoms/Chip' };\nexport const Small = {};\nexport { meta as default };\n";
    let file = "/repo/src/components/Chip.stories.ts";
    let result = transform(source, Path::new(file), &options_for(file)).unwrap();

    assert_eq!(result.report.title, "Atoms/Chip");
    assert_eq!(result.report.tests, 1);
    assert!(result.code.contains("export { meta as default };"));
    assert!(!result.code.contains("export const Small"));
}

#[test]
fn test_empty_module_placeholder() {
    let file = "/repo/src/components/Empty.stories.ts";
    let result = transform(EMPTY_STORIES, Path::new(file), &options_for(file)).unwrap();

    assert_eq!(result.report.tests, 0);
    assert!(result.code.starts_with(EMPTY_STORIES));
    assert!(result.code.contains("it(\"no stories\", () => {})"));
    assert!(!result.code.contains("@storytest/runtime"));
}

#[test]
fn test_empty_module_without_placeholder_is_unchanged() {
    let file = "/repo/src/components/Empty.stories.ts";
    let options = options_for(file).with_insert_test_if_empty(false);
    let result = transform(EMPTY_STORIES, Path::new(file), &options).unwrap();

    assert_eq!(result.code, EMPTY_STORIES);
}

#[test]
fn test_keep_body_preserves_story_declarations() {
    let file = "/repo/src/components/Button.stories.tsx";
    let options = options_for(file).with_clear_original_body(false);
    let result = transform(BUTTON_STORIES, Path::new(file), &options).unwrap();

    assert!(result.code.contains(BUTTON_STORIES));
    assert_eq!(result.report.tests, 2);
}

#[test]
fn test_legacy_assignments_are_cleared_with_their_story() {
    let file = "/repo/src/pages/Page.stories.jsx";
    let result = transform(LEGACY_STORIES, Path::new(file), &options_for(file)).unwrap();

    let code = &result.code;
    assert!(code.contains("describe(\"Default page\""));
    assert!(code.contains("it(\"play-test\""));
    assert!(!code.contains("Default.storyName"));
    assert!(!code.contains("WithPlay.play"));
    assert!(code.contains("const Template = (args) => <Page {...args} />;"));
}

#[tokio::test]
async fn test_service_reads_and_caches_files() {
    let dir = tempfile::tempdir().unwrap();
    let stories = dir.path().join("stories/atoms");
    tokio::fs::create_dir_all(&stories).await.unwrap();
    let file = stories.join("Badge.stories.tsx");
    tokio::fs::write(&file, "export default {};\nexport const Small = {};\n")
        .await
        .unwrap();

    let config = StorytestConfig::new()
        .with_working_dir(dir.path())
        .with_stories(vec![StoriesEntry::Directory {
            directory: "stories/atoms".to_string(),
            files: None,
            title_prefix: "Atoms".to_string(),
        }]);
    let service = TransformService::from_config(&config, dir.path()).unwrap();

    assert!(service.is_story_file(&file));
    let first = service.transform_file(&file).await.unwrap();
    let second = service.transform_file(&file).await.unwrap();

    assert_eq!(first.report.title, "Atoms/Badge");
    assert!(first.code.contains("id: \"atoms-badge--small\""));
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_service_rejects_large_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Big.stories.ts");
    tokio::fs::write(&file, BUTTON_STORIES).await.unwrap();

    let service = TransformService::new(ProjectLayout::new(dir.path())).with_max_file_size(16);
    let err = service.transform_file(&file).await.unwrap_err();
    assert!(matches!(err, ServiceError::FileTooLarge { max: 16, .. }));
}

#[tokio::test]
async fn test_service_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = TransformService::new(ProjectLayout::new(dir.path()));
    let err = service
        .transform_file(&dir.path().join("Missing.stories.ts"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Io { .. }));
}

#[tokio::test]
async fn test_config_file_resolves_relative_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storytest.toml");
    tokio::fs::write(
        &path,
        r#"
working_dir = "app"
stories = [{ directory = "src", title_prefix = "App" }]

[tags]
skip = ["skip-test"]

[transform]
clear_original_body = false
"#,
    )
    .await
    .unwrap();

    let config = StorytestConfig::load(&path).await.unwrap();
    assert_eq!(config.working_dir.as_deref(), Some(dir.path().join("app").as_path()));
    assert!(!config.transform.clear_original_body);
    assert!(config.transform.insert_test_if_empty);

    let service = TransformService::from_config(&config, Path::new("/unused")).unwrap();
    let file = dir.path().join("app/src/Card.stories.tsx");
    let options = service.options_for(&file);
    assert_eq!(options.make_title(None), "App/Card");
    assert!(!options.clear_original_body);
}
