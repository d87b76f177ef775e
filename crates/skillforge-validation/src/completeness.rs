//! Stage 3: per-section "is this meaningfully filled" predicates.
//!
//! Produces boolean flags, not issues; the export gate consumes them. The
//! canonical section list is the ten-field variant including identity and
//! security; progress is the rounded percentage of complete sections.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use skillforge_domain::issue::Completeness;
use skillforge_domain::skill::SkillDoc;

use crate::security;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Compute the per-section completion flags.
pub fn check_completeness(skill: &SkillDoc) -> Completeness {
    Completeness {
        problem: problem_complete(skill),
        scenarios: scenarios_complete(skill),
        role: role_complete(skill),
        intents: intents_complete(skill),
        tools: tools_complete(skill),
        policy: policy_complete(skill),
        engine: true, // engine defaults always apply
        mocks_tested: mocks_tested(skill),
        identity: identity_complete(skill),
        security: security::is_security_complete(skill),
    }
}

fn problem_complete(skill: &SkillDoc) -> bool {
    skill.problem.statement.trim().len() >= 10
}

fn scenarios_complete(skill: &SkillDoc) -> bool {
    skill.scenarios.iter().any(|s| !s.title.trim().is_empty())
}

fn role_complete(skill: &SkillDoc) -> bool {
    !skill.role.name.trim().is_empty() && !skill.role.persona.trim().is_empty()
}

fn intents_complete(skill: &SkillDoc) -> bool {
    skill
        .intents
        .supported
        .iter()
        .any(|i| !i.description.trim().is_empty() && !i.examples.is_empty())
}

fn tools_complete(skill: &SkillDoc) -> bool {
    skill.tools.iter().any(|t| {
        !t.name.trim().is_empty()
            && !t.description.trim().is_empty()
            && !t.output.description.trim().is_empty()
    })
}

fn policy_complete(skill: &SkillDoc) -> bool {
    let guardrails = &skill.policy.guardrails;
    guardrails.never.iter().chain(&guardrails.always).any(|g| !g.trim().is_empty())
}

/// False with zero tools: a skill whose mocks were never exercised has not
/// been tested, and a tool-less skill cannot have been. Deliberately
/// asymmetric with the vacuously-true security predicate.
fn mocks_tested(skill: &SkillDoc) -> bool {
    !skill.tools.is_empty() && skill.tools.iter().all(|t| t.mock.status != "untested")
}

fn identity_complete(skill: &SkillDoc) -> bool {
    !skill.identity.display_name.trim().is_empty()
        && EMAIL_RE.is_match(skill.identity.from_email.trim())
}

/// Raw counts behind the flags, for builder-UI display
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    /// The per-section flags
    pub sections: Completeness,
    /// Rounded percentage of complete sections
    pub overall_progress: u8,
    /// Scenario count
    pub scenario_count: usize,
    /// Supported intent count
    pub intent_count: usize,
    /// Tool count
    pub tool_count: usize,
    /// Guardrail count across both kinds
    pub guardrail_count: usize,
    /// Declared workflow count
    pub workflow_count: usize,
    /// Tools whose mock is still untested
    pub untested_mock_count: usize,
    /// High-risk tools not covered by any access-policy rule
    pub uncovered_high_risk_count: usize,
}

/// Compute the detailed report a builder UI renders.
pub fn detailed_report(skill: &SkillDoc) -> CompletenessReport {
    let sections = check_completeness(skill);
    let coverage = security::coverage_report(skill);
    CompletenessReport {
        sections,
        overall_progress: sections.overall_progress(),
        scenario_count: skill.scenarios.len(),
        intent_count: skill.intents.supported.len(),
        tool_count: skill.tools.len(),
        guardrail_count: skill.policy.guardrails.never.len() + skill.policy.guardrails.always.len(),
        workflow_count: skill.policy.workflows.len(),
        untested_mock_count: skill
            .tools
            .iter()
            .filter(|t| t.mock.status == "untested")
            .count(),
        uncovered_high_risk_count: coverage.high_risk - coverage.high_risk_covered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> SkillDoc {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_skill_is_mostly_incomplete() {
        let c = check_completeness(&doc(json!({})));
        assert!(!c.problem);
        assert!(!c.scenarios);
        assert!(!c.role);
        assert!(!c.intents);
        assert!(!c.tools);
        assert!(!c.policy);
        assert!(c.engine);
        assert!(!c.mocks_tested);
        assert!(!c.identity);
        assert!(c.security); // vacuously true with zero tools
        assert_eq!(c.complete_sections(), 2);
        assert_eq!(c.overall_progress(), 20);
    }

    #[test]
    fn test_problem_needs_ten_chars() {
        assert!(!check_completeness(&doc(json!({"problem": {"statement": "short"}}))).problem);
        assert!(
            check_completeness(&doc(json!({"problem": {"statement": "Customers need help"}})))
                .problem
        );
    }

    #[test]
    fn test_role_needs_name_and_persona() {
        assert!(!check_completeness(&doc(json!({"role": {"name": "Agent"}}))).role);
        let c = check_completeness(&doc(json!({
            "role": {"name": "Agent", "persona": "Helpful support rep"}
        })));
        assert!(c.role);
    }

    #[test]
    fn test_intents_need_description_and_example() {
        let missing_example = doc(json!({
            "intents": {"supported": [{"id": "a", "description": "track orders"}]}
        }));
        assert!(!check_completeness(&missing_example).intents);

        let complete = doc(json!({
            "intents": {"supported": [
                {"id": "a", "description": "track orders", "examples": ["where is my order"]}
            ]}
        }));
        assert!(check_completeness(&complete).intents);
    }

    #[test]
    fn test_tools_need_descriptions() {
        let undocumented = doc(json!({
            "tools": [{"id": "t", "name": "T", "description": "does things"}]
        }));
        assert!(!check_completeness(&undocumented).tools);

        let documented = doc(json!({
            "tools": [{
                "id": "t", "name": "T", "description": "does things",
                "output": {"type": "object", "description": "a record"}
            }]
        }));
        assert!(check_completeness(&documented).tools);
    }

    #[test]
    fn test_policy_counts_either_guardrail_kind() {
        assert!(check_completeness(&doc(json!({
            "policy": {"guardrails": {"never": ["share PII"]}}
        })))
        .policy);
        assert!(check_completeness(&doc(json!({
            "policy": {"guardrails": {"always": ["confirm identity"]}}
        })))
        .policy);
        assert!(!check_completeness(&doc(json!({
            "policy": {"guardrails": {"never": ["  "]}}
        })))
        .policy);
    }

    #[test]
    fn test_mocks_tested_false_with_zero_tools() {
        assert!(!check_completeness(&doc(json!({}))).mocks_tested);
    }

    #[test]
    fn test_mocks_tested_requires_every_tool() {
        let mixed = doc(json!({
            "tools": [
                {"id": "a", "name": "A", "mock": {"status": "passed"}},
                {"id": "b", "name": "B", "mock": {"status": "untested"}}
            ]
        }));
        assert!(!check_completeness(&mixed).mocks_tested);

        let all = doc(json!({
            "tools": [
                {"id": "a", "name": "A", "mock": {"status": "passed"}},
                {"id": "b", "name": "B", "mock": {"status": "failed"}}
            ]
        }));
        // failed is still "exercised"
        assert!(check_completeness(&all).mocks_tested);
    }

    #[test]
    fn test_identity_needs_plausible_email() {
        let bad = doc(json!({
            "identity": {"display_name": "Order Support", "from_email": "not-an-email"}
        }));
        assert!(!check_completeness(&bad).identity);

        let good = doc(json!({
            "identity": {"display_name": "Order Support", "from_email": "support@acme.com"}
        }));
        assert!(check_completeness(&good).identity);
    }

    #[test]
    fn test_security_follows_policy_coverage() {
        let uncovered = doc(json!({
            "tools": [{"id": "t", "name": "T", "security": {"classification": "pii_write"}}]
        }));
        assert!(!check_completeness(&uncovered).security);

        let covered = doc(json!({
            "tools": [{"id": "t", "name": "T", "security": {"classification": "pii_write"}}],
            "access_policy": {"rules": [{"tools": ["*"], "effect": "allow"}]}
        }));
        assert!(check_completeness(&covered).security);
    }

    #[test]
    fn test_detailed_report_counts() {
        let skill = doc(json!({
            "scenarios": [{"id": "s", "title": "t"}],
            "tools": [
                {"id": "a", "name": "A", "mock": {"status": "untested"},
                 "security": {"classification": "destructive"}},
                {"id": "b", "name": "B", "mock": {"status": "passed"}}
            ],
            "policy": {
                "guardrails": {"never": ["x"], "always": ["y"]},
                "workflows": [{"id": "wf", "steps": []}]
            }
        }));
        let report = detailed_report(&skill);
        assert_eq!(report.scenario_count, 1);
        assert_eq!(report.tool_count, 2);
        assert_eq!(report.guardrail_count, 2);
        assert_eq!(report.workflow_count, 1);
        assert_eq!(report.untested_mock_count, 1);
        assert_eq!(report.uncovered_high_risk_count, 1);
    }
}
