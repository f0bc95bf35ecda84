//! Testing utilities for the storytest workspace
//!
//! Story module fixtures, plan builders and a scripted browser page.

#![allow(missing_docs)]

pub mod page;

pub use page::{FakePage, PageCall, RecordingCoverage, RecordingHook};

use storytest_codegen::TestPlan;
use storytest_csf::{StoryEntry, StoryId, TagDecision, TagSet};

/// Two untagged stories under an explicit title
pub const BUTTON_STORIES: &str = r#"import { Button } from './Button';

export default {
  title: 'Atoms/Button',
  component: Button,
};

export const Primary = {
  args: { primary: true, label: 'Button' },
};

export const Secondary = {
  args: { label: 'Button' },
};
"#;

/// Stories carrying tags and a play function, no explicit title
pub const TAGGED_STORIES: &str = r#"import { expect } from '@storybook/test';
import { Header } from './Header';

export default {
  component: Header,
  tags: ['autodocs'],
};

export const LoggedOut = {};

export const LoggedIn = {
  tags: ['interaction'],
  play: async ({ canvasElement }) => {
    await expect(canvasElement).toBeTruthy();
  },
};

export const Flaky = {
  tags: ['flaky'],
};

export const Later = {
  tags: ['skip-test'],
};
"#;

/// CSF2 style module with template-bound stories
pub const LEGACY_STORIES: &str = r#"import React from 'react';
import { Page } from './Page';

export default {
  title: 'Pages/Page',
  component: Page,
};

const Template = (args) => <Page {...args} />;

export const Default = Template.bind({});
Default.storyName = 'Default page';

export const WithPlay = Template.bind({});
WithPlay.play = async () => {};
"#;

/// Module whose default export contains no stories
pub const EMPTY_STORIES: &str = "export default { title: 'Empty' };\n";

/// Module with one story that cannot be analyzed statically
pub const SPREAD_STORIES: &str = r#"export default { title: 'Spread' };

const base = { args: { size: 'small' } };

export const Spread = { ...base };

export const Plain = {};
"#;

pub fn story_entry(title: &str, export_name: &str, has_play_fn: bool) -> StoryEntry {
    StoryEntry {
        id: StoryId::derive(title, export_name).unwrap(),
        title: title.to_string(),
        name: storytest_csf::story_name_from_export(export_name),
        export_name: export_name.to_string(),
        tags: TagSet::new(),
        has_play_fn,
    }
}

pub fn run_plan(has_play_fn: bool) -> TestPlan {
    TestPlan::for_story(&story_entry("Atoms/Button", "Primary", has_play_fn), TagDecision::Run).unwrap()
}

pub fn skipped_plan() -> TestPlan {
    TestPlan::for_story(&story_entry("Atoms/Button", "Primary", false), TagDecision::RunSkipped).unwrap()
}
