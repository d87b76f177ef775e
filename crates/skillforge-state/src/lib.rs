#![warn(missing_docs)]

//! SkillForge State Updates
//!
//! Applies the builder's patch DSL to a draft document: dotted and indexed
//! paths, `_push`/`_delete`/`_update`/`_rename` operations, and protected
//! arrays that merge by element id instead of being replaced wholesale.

pub mod engine;
mod engine_properties;
pub mod error;

pub use engine::{StateUpdateEngine, UpdateOutcome};
pub use error::StateError;
