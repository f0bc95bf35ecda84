use proptest::prelude::*;
use storytest_csf::{resolve_title, StoryLocationRule};

fn component_rules() -> Vec<StoryLocationRule> {
    vec![
        StoryLocationRule::new("src/components/**", "Components").unwrap(),
        StoryLocationRule::from_directory("stories", None, "Stories").unwrap(),
    ]
}

#[test]
fn test_directory_rule_title() {
    let title = resolve_title("stories/atoms/Button.stories.tsx", &component_rules(), None);
    assert_eq!(title, "Stories/atoms/Button");
}

#[test]
fn test_prefix_with_levels() {
    let rules = vec![StoryLocationRule::new("src/**", "Design System/Core").unwrap()];
    let title = resolve_title("src/Card.stories.tsx", &rules, None);
    assert_eq!(title, "Design System/Core/Card");
}

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,8}"
}

proptest! {
    #[test]
    fn prop_title_is_deterministic(
        dirs in proptest::collection::vec(segment(), 0..4),
        file in segment(),
        explicit in proptest::option::of("[A-Za-z/ ]{1,20}"),
    ) {
        let mut parts = vec!["src".to_string(), "components".to_string()];
        parts.extend(dirs);
        parts.push(format!("{file}.stories.tsx"));
        let path = parts.join("/");
        let rules = component_rules();

        let first = resolve_title(&path, &rules, explicit.as_deref());
        let second = resolve_title(&path, &rules, explicit.as_deref());
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn prop_explicit_title_is_returned_unchanged(
        path in "[a-z]{1,6}/[A-Za-z]{1,8}\\.stories\\.tsx",
        explicit in "[A-Za-z][A-Za-z/ ]{0,20}",
    ) {
        let title = resolve_title(&path, &component_rules(), Some(&explicit));
        prop_assert_eq!(title, explicit);
    }

    #[test]
    fn prop_matched_title_starts_with_prefix(
        dirs in proptest::collection::vec(segment(), 0..3),
        file in segment(),
    ) {
        // a file named after the prefix collapses into it
        prop_assume!(!file.eq_ignore_ascii_case("components"));
        let mut parts = vec!["src".to_string(), "components".to_string()];
        parts.extend(dirs);
        parts.push(format!("{file}.stories.tsx"));

        let title = resolve_title(&parts.join("/"), &component_rules(), None);
        prop_assert!(title.starts_with("Components/"));
        prop_assert!(!title.contains(".stories"));
    }
}
