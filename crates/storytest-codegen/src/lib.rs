//! Story test generation
//!
//! Turns story entries into structured test plans and renders them as
//! JavaScript test code:
//! - [`plan`]: `TestPlan` / `ModulePlan` with the fixed step order
//! - [`js`]: syntax tree and printer for the generated code
//! - [`render`]: plan → `describe`/`it` blocks bound to an injected runtime
//! - [`emit`]: reassembly of the original module around the tests
//! - [`messages`]: failure texts shared with the in-process runner

#![warn(missing_docs)]

pub mod emit;
pub mod js;
pub mod messages;
pub mod plan;
pub mod render;

// Re-exports
pub use emit::{emit_module, EmitError, EmitOptions};
pub use plan::{standard_steps, ModulePlan, PlannedStory, RetryPolicy, Step, StoryContext, TestPlan};
pub use render::{render_module, render_placeholder, render_story, TestTemplate};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for test generation
    pub use crate::{
        emit_module, EmitOptions, ModulePlan, RetryPolicy, Step, StoryContext, TestPlan,
        TestTemplate,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
