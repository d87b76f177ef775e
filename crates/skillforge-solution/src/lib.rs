#![warn(missing_docs)]

//! SkillForge Solution Validation
//!
//! Cross-skill checks over a solution document: grant economy, handoff
//! reachability, routing coverage, security-contract propagation, and cycle
//! detection. When full skill and connector context is supplied, the
//! connector bindings are checked against the MCP source store as well.

pub mod connectors;
pub mod validator;

pub use validator::{SolutionReport, SolutionSummary, SolutionValidator};
