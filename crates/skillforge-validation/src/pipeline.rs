//! Orchestrates the validation stages and computes the export gate.
//!
//! Stage order is fixed: schema, references, completeness, security.
//! `valid` is derived from the error count and nothing else;
//! `ready_to_export` is a separate rule combining errors, unresolved
//! references, required sections, and mock testing.

use serde_json::Value;
use tracing::debug;

use skillforge_domain::decode::{skill_from_value, DocumentError};
use skillforge_domain::issue::{Issue, Report, Severity};
use skillforge_domain::skill::SkillDoc;

use crate::{completeness, references, schema, security};

/// Fixed-order orchestrator over the four validators
pub struct ValidationPipeline;

impl ValidationPipeline {
    /// Decode a raw draft and run the full pipeline.
    ///
    /// Only a non-object draft is an `Err`; any decodable draft, however
    /// sparse or broken, yields a usable report.
    pub fn validate_value(value: &Value) -> Result<Report, DocumentError> {
        let (doc, decode_issues) = skill_from_value(value)?;
        Ok(Self::run(&doc, decode_issues))
    }

    /// Run the full pipeline over an already-typed document.
    pub fn validate(skill: &SkillDoc) -> Report {
        Self::run(skill, Vec::new())
    }

    /// Schema-only pass for interactive feedback while the author types.
    pub fn quick_validate(skill: &SkillDoc) -> Vec<Issue> {
        schema::validate_schema(skill)
    }

    fn run(skill: &SkillDoc, mut issues: Vec<Issue>) -> Report {
        let schema_issues = schema::validate_schema(skill);
        debug!(count = schema_issues.len(), "schema stage finished");
        issues.extend(schema_issues);

        let resolution = references::resolve_references(skill);
        debug!(
            count = resolution.issues.len(),
            unresolved_tools = resolution.unresolved.tools.len(),
            "reference stage finished"
        );
        issues.extend(resolution.issues);

        let completeness = completeness::check_completeness(skill);
        debug!(progress = completeness.overall_progress(), "completeness stage finished");

        let security_issues = security::validate_security(skill);
        debug!(count = security_issues.len(), "security stage finished");
        issues.extend(security_issues);

        let (errors, warnings): (Vec<Issue>, Vec<Issue>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);

        let valid = errors.is_empty();
        let ready_to_export = valid
            && !resolution.unresolved.blocks_export()
            && completeness.problem
            && completeness.role
            && completeness.tools
            && completeness.mocks_tested;

        Report {
            valid,
            ready_to_export,
            errors,
            warnings,
            unresolved: resolution.unresolved,
            completeness,
        }
    }
}
