//! Stage 4: security classification, access-policy coverage, and filter
//! syntax.
//!
//! High-risk tools without policy coverage are hard errors, since they
//! represent real access-control gaps rather than authoring debt; an
//! unclassified tool only warns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use skillforge_domain::enums::{is_system_tool, AccessEffect, RiskLevel, SecurityClassification};
use skillforge_domain::issue::{codes, Issue};
use skillforge_domain::skill::{SkillDoc, Tool};

/// Dotted identifiers, optional numeric or wildcard bracket index per
/// segment, optional leading `$.` JSONPath marker.
static FIELD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\$\.)?[A-Za-z_][A-Za-z0-9_]*(\[(\d+|\*)\])?(\.[A-Za-z_][A-Za-z0-9_]*(\[(\d+|\*)\])?)*$")
        .unwrap()
});

/// True when any access-policy rule covers the tool, by wildcard `*`,
/// exact name, or exact id.
pub fn policy_covers(skill: &SkillDoc, tool: &Tool) -> bool {
    skill.access_policy.rules.iter().any(|rule| {
        rule.tools
            .iter()
            .any(|entry| entry == "*" || entry == &tool.name || entry == &tool.id)
    })
}

fn classification_of(tool: &Tool) -> Option<Result<SecurityClassification, ()>> {
    let raw = tool.security.classification.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.parse().map_err(|_| ()))
}

fn tool_matches(tool_ref: &str, skill: &SkillDoc) -> bool {
    skill
        .tools
        .iter()
        .any(|t| t.id == tool_ref || t.name == tool_ref)
}

/// Validate tool security metadata and the cross-cutting policy sections.
pub fn validate_security(skill: &SkillDoc) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (idx, tool) in skill.tools.iter().enumerate() {
        check_tool_security(skill, idx, tool, &mut issues);
    }

    check_grant_mappings(skill, &mut issues);
    check_access_rules(skill, &mut issues);
    check_response_filters(skill, &mut issues);

    issues
}

fn check_tool_security(skill: &SkillDoc, idx: usize, tool: &Tool, issues: &mut Vec<Issue>) {
    let path = format!("tools[{idx}]");

    let classification = match classification_of(tool) {
        None => {
            issues.push(
                Issue::warning(
                    codes::TOOL_UNCLASSIFIED,
                    format!("{path}.security.classification"),
                    format!("tool '{}' has no security classification", tool.id),
                )
                .with_suggestion("classify the tool so access policies can be enforced"),
            );
            return; // nothing further can be checked without a classification
        }
        Some(Err(())) => {
            issues.push(Issue::error(
                codes::INVALID_CLASSIFICATION,
                format!("{path}.security.classification"),
                format!(
                    "invalid classification '{}', allowed: {}",
                    tool.security.classification.as_deref().unwrap_or(""),
                    SecurityClassification::VARIANTS.join(", ")
                ),
            ));
            check_risk_level(idx, tool, issues);
            return;
        }
        Some(Ok(c)) => c,
    };

    check_risk_level(idx, tool, issues);

    let covered = policy_covers(skill, tool);

    if classification.is_high_risk() && !covered {
        issues.push(
            Issue::error(
                codes::HIGH_RISK_NO_POLICY,
                format!("{path}.security"),
                format!(
                    "high-risk tool '{}' ({}) is not covered by any access-policy rule",
                    tool.id, classification
                ),
            )
            .with_suggestion("add an access_policy rule naming the tool, or a '*' rule"),
        );
    }

    if classification.is_pii() && skill.response_filters.is_empty() && !covered {
        issues.push(
            Issue::warning(
                codes::PII_NO_FILTER,
                format!("{path}.security"),
                format!(
                    "PII tool '{}' has neither response filters nor access-policy coverage",
                    tool.id
                ),
            )
            .with_suggestion("strip or mask PII fields, or cover the tool with a rule"),
        );
    }

    if let Some(owner_field) = tool.data_owner_field.as_deref().filter(|f| !f.is_empty()) {
        if !data_owner_constrained(skill, tool, owner_field) {
            issues.push(
                Issue::warning(
                    codes::DATA_OWNER_NO_CONSTRAIN,
                    format!("{path}.data_owner_field"),
                    format!(
                        "tool '{}' declares data owner field '{owner_field}' but nothing constrains it",
                        tool.id
                    ),
                )
                .with_suggestion("add a constrain rule or a grant mapping binding the field"),
            );
        }
    }
}

fn check_risk_level(idx: usize, tool: &Tool, issues: &mut Vec<Issue>) {
    let Some(raw) = tool.security.risk_level.as_deref().map(str::trim) else {
        return;
    };
    if raw.is_empty() {
        return;
    }
    if raw.parse::<RiskLevel>().is_err() {
        issues.push(Issue::error(
            codes::INVALID_RISK_LEVEL,
            format!("tools[{idx}].security.risk_level"),
            format!(
                "invalid risk level '{raw}', allowed: {}",
                RiskLevel::VARIANTS.join(", ")
            ),
        ));
    }
}

/// A data owner field counts as constrained when a `constrain` rule covering
/// the tool mentions the field, or a grant mapping binds it.
fn data_owner_constrained(skill: &SkillDoc, tool: &Tool, field: &str) -> bool {
    let constrain_rule = skill.access_policy.rules.iter().any(|rule| {
        rule.effect == "constrain"
            && rule
                .tools
                .iter()
                .any(|entry| entry == "*" || entry == &tool.name || entry == &tool.id)
            && rule
                .condition
                .as_ref()
                .map(|c| c.to_string().contains(field))
                .unwrap_or(false)
    });

    let grant_mapping = skill
        .grant_mappings
        .iter()
        .any(|m| (m.tool == tool.id || m.tool == tool.name) && m.field == field);

    constrain_rule || grant_mapping
}

fn check_grant_mappings(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, mapping) in skill.grant_mappings.iter().enumerate() {
        if mapping.tool.is_empty() {
            continue;
        }
        if !tool_matches(&mapping.tool, skill) && !is_system_tool(&mapping.tool) {
            issues.push(Issue::error(
                codes::GRANT_TOOL_NOT_FOUND,
                format!("grant_mappings[{idx}].tool"),
                format!("grant mapping references unknown tool '{}'", mapping.tool),
            ));
        }
    }
}

fn check_access_rules(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, rule) in skill.access_policy.rules.iter().enumerate() {
        let path = format!("access_policy.rules[{idx}]");

        for (entry_idx, entry) in rule.tools.iter().enumerate() {
            if entry == "*" || entry.is_empty() {
                continue;
            }
            if !tool_matches(entry, skill) {
                issues.push(Issue::error(
                    codes::POLICY_TOOL_NOT_FOUND,
                    format!("{path}.tools[{entry_idx}]"),
                    format!("access-policy rule references unknown tool '{entry}'"),
                ));
            }
        }

        if rule.effect.parse::<AccessEffect>().is_err() {
            issues.push(Issue::error(
                codes::INVALID_POLICY_EFFECT,
                format!("{path}.effect"),
                format!(
                    "invalid effect '{}', allowed: {}",
                    rule.effect,
                    AccessEffect::VARIANTS.join(", ")
                ),
            ));
        }
    }
}

fn check_response_filters(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, filter) in skill.response_filters.iter().enumerate() {
        let fields = filter
            .strip_fields
            .iter()
            .enumerate()
            .map(|(i, f)| (format!("response_filters[{idx}].strip_fields[{i}]"), f))
            .chain(
                filter
                    .mask_fields
                    .iter()
                    .enumerate()
                    .map(|(i, f)| (format!("response_filters[{idx}].mask_fields[{i}]"), f)),
            );

        for (path, field) in fields {
            if !FIELD_PATH_RE.is_match(field) {
                issues.push(
                    Issue::error(
                        codes::INVALID_FILTER_PATH,
                        path,
                        format!("'{field}' is not a valid field path"),
                    )
                    .with_suggestion("use dotted identifiers like customer.address or items[*].sku"),
                );
            }
        }
    }
}

/// Vacuously true with zero tools; otherwise true iff every high-risk tool
/// is covered by an access-policy rule.
pub fn is_security_complete(skill: &SkillDoc) -> bool {
    skill.tools.iter().all(|tool| {
        match classification_of(tool) {
            Some(Ok(c)) if c.is_high_risk() => policy_covers(skill, tool),
            _ => true,
        }
    })
}

/// Numeric coverage summary for UI display
#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityCoverage {
    /// Tools with a valid classification
    pub classified: usize,
    /// Tools with no classification at all
    pub unclassified: usize,
    /// Tools classified high-risk
    pub high_risk: usize,
    /// High-risk tools covered by an access-policy rule
    pub high_risk_covered: usize,
    /// Tools classified pii_read or pii_write
    pub pii: usize,
    /// PII tools with response filters or policy coverage
    pub pii_filtered: usize,
}

/// Compute the coverage summary.
pub fn coverage_report(skill: &SkillDoc) -> SecurityCoverage {
    let mut coverage = SecurityCoverage::default();
    for tool in &skill.tools {
        match classification_of(tool) {
            None => coverage.unclassified += 1,
            Some(Err(())) => {}
            Some(Ok(c)) => {
                coverage.classified += 1;
                let covered = policy_covers(skill, tool);
                if c.is_high_risk() {
                    coverage.high_risk += 1;
                    if covered {
                        coverage.high_risk_covered += 1;
                    }
                }
                if c.is_pii() {
                    coverage.pii += 1;
                    if covered || !skill.response_filters.is_empty() {
                        coverage.pii_filtered += 1;
                    }
                }
            }
        }
    }
    coverage
}
