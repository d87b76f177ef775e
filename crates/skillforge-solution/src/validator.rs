//! Structural validation of a solution document.
//!
//! Every check appends to the issue list and keeps going; a solution with
//! fifty violations yields fifty issues. Dangling skill references and
//! dropped contract grants are errors; reachability gaps and undeclared
//! mechanisms warn, since they may be intentional or enforced elsewhere.

use std::collections::{HashMap, HashSet, VecDeque};

use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use skillforge_domain::decode::{solution_from_value, DocumentError};
use skillforge_domain::enums::SkillRole;
use skillforge_domain::issue::{codes, Issue, Severity};
use skillforge_domain::solution::{SolutionContext, SolutionDoc};

use crate::connectors;

/// The result of one solution validation run
#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    /// True iff no error-severity issue was produced
    pub valid: bool,
    /// All error-severity issues
    pub errors: Vec<Issue>,
    /// All warning-severity issues
    pub warnings: Vec<Issue>,
    /// Counts for UI display
    pub summary: SolutionSummary,
}

/// Headline counts for UI display
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolutionSummary {
    /// Skills in the solution
    pub skills: usize,
    /// Declared grants
    pub grants: usize,
    /// Declared handoffs
    pub handoffs: usize,
    /// Declared security contracts
    pub contracts: usize,
    /// Error count
    pub errors: usize,
    /// Warning count
    pub warnings: usize,
}

/// Validates the composition of skills inside a solution
pub struct SolutionValidator;

impl SolutionValidator {
    /// Decode a raw solution draft and validate it.
    pub fn validate_value(
        value: &Value,
        context: Option<&SolutionContext>,
    ) -> Result<SolutionReport, DocumentError> {
        let (doc, decode_issues) = solution_from_value(value)?;
        Ok(Self::run(&doc, context, decode_issues))
    }

    /// Validate an already-typed solution document.
    pub fn validate(solution: &SolutionDoc, context: Option<&SolutionContext>) -> SolutionReport {
        Self::run(solution, context, Vec::new())
    }

    fn run(
        solution: &SolutionDoc,
        context: Option<&SolutionContext>,
        mut issues: Vec<Issue>,
    ) -> SolutionReport {
        check_identity(solution, &mut issues);
        check_skills(solution, &mut issues);
        check_grants(solution, &mut issues);
        check_handoffs(solution, &mut issues);
        check_contracts(solution, &mut issues);
        check_routing(solution, &mut issues);
        check_mechanisms(solution, &mut issues);
        check_orphans(solution, &mut issues);
        detect_handoff_cycles(solution, &mut issues);

        if let Some(ctx) = context {
            connectors::validate_connector_bindings(solution, ctx, &mut issues);
        }
        debug!(count = issues.len(), "solution validation finished");

        let (errors, warnings): (Vec<Issue>, Vec<Issue>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);

        SolutionReport {
            valid: errors.is_empty(),
            summary: SolutionSummary {
                skills: solution.skills.len(),
                grants: solution.grants.len(),
                handoffs: solution.handoffs.len(),
                contracts: solution.security_contracts.len(),
                errors: errors.len(),
                warnings: warnings.len(),
            },
            errors,
            warnings,
        }
    }
}

fn check_identity(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    let identity = &solution.identity;

    if identity.actor_types.is_empty() {
        issues.push(Issue::warning(
            codes::NO_ACTOR_TYPES,
            "identity.actor_types",
            "solution declares no actor types",
        ));
        return;
    }

    if identity.admin_roles.is_empty() {
        issues.push(Issue::warning(
            codes::NO_ADMIN_ROLES,
            "identity.admin_roles",
            "solution declares actor types but no admin roles",
        ));
    }

    if !identity.default_actor_type.is_empty()
        && !identity.actor_types.contains(&identity.default_actor_type)
    {
        issues.push(Issue::error(
            codes::UNKNOWN_DEFAULT_ACTOR,
            "identity.default_actor_type",
            format!(
                "default actor type '{}' is not a declared actor type",
                identity.default_actor_type
            ),
        ));
    }

    for (idx, role) in identity.admin_roles.iter().enumerate() {
        if !identity.actor_types.contains(role) {
            issues.push(Issue::warning(
                codes::UNKNOWN_ADMIN_ROLE,
                format!("identity.admin_roles[{idx}]"),
                format!("admin role '{role}' is not a declared actor type"),
            ));
        }
    }
}

fn check_skills(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    for (idx, skill) in solution.skills.iter().enumerate() {
        if skill.id.is_empty() {
            issues.push(Issue::error(
                codes::MISSING_FIELD,
                format!("skills[{idx}].id"),
                "skill id is required",
            ));
        }
        if !skill.role.is_empty() && skill.role.parse::<SkillRole>().is_err() {
            issues.push(Issue::error(
                codes::INVALID_ENUM,
                format!("skills[{idx}].role"),
                format!(
                    "invalid skill role '{}', allowed: {}",
                    skill.role,
                    SkillRole::VARIANTS.join(", ")
                ),
            ));
        }
    }
}

fn check_grants(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    for (idx, grant) in solution.grants.iter().enumerate() {
        for (i, issuer) in grant.issued_by.iter().enumerate() {
            if !solution.has_skill(issuer) {
                issues.push(Issue::error(
                    codes::GRANT_ISSUER_UNKNOWN,
                    format!("grants[{idx}].issued_by[{i}]"),
                    format!("grant '{}' names unknown issuer '{issuer}'", grant.key),
                ));
            }
        }
        for (i, consumer) in grant.consumed_by.iter().enumerate() {
            if !solution.has_skill(consumer) {
                issues.push(Issue::error(
                    codes::GRANT_CONSUMER_UNKNOWN,
                    format!("grants[{idx}].consumed_by[{i}]"),
                    format!("grant '{}' names unknown consumer '{consumer}'", grant.key),
                ));
            }
        }
        if !grant.consumed_by.is_empty() && grant.issued_by.is_empty() {
            issues.push(Issue::error(
                codes::GRANT_NO_ISSUER,
                format!("grants[{idx}]"),
                format!("grant '{}' has consumers but no issuer", grant.key),
            ));
        }
    }
}

fn check_handoffs(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    for (idx, handoff) in solution.handoffs.iter().enumerate() {
        for (field, endpoint) in [("from", &handoff.from), ("to", &handoff.to)] {
            if !endpoint.is_empty() && !solution.has_skill(endpoint) {
                issues.push(Issue::error(
                    codes::HANDOFF_SKILL_UNKNOWN,
                    format!("handoffs[{idx}].{field}"),
                    format!("handoff '{}' names unknown skill '{endpoint}'", handoff.id),
                ));
            }
        }
    }
}

/// Shortest provider-to-consumer path by hop count, as handoff indices.
fn handoff_path(solution: &SolutionDoc, from: &str, to: &str) -> Option<Vec<usize>> {
    if from == to {
        return Some(Vec::new());
    }

    let mut adjacency: HashMap<&str, Vec<(usize, &str)>> = HashMap::new();
    for (idx, handoff) in solution.handoffs.iter().enumerate() {
        adjacency
            .entry(handoff.from.as_str())
            .or_default()
            .push((idx, handoff.to.as_str()));
    }

    let mut predecessor: HashMap<&str, (&str, usize)> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    let mut visited: HashSet<&str> = HashSet::from([from]);

    while let Some(node) = queue.pop_front() {
        for &(edge, next) in adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            if !visited.insert(next) {
                continue;
            }
            predecessor.insert(next, (node, edge));
            if next == to {
                // walk predecessors back to the provider
                let mut path = Vec::new();
                let mut cursor = to;
                while cursor != from {
                    let (prev, edge) = predecessor[cursor];
                    path.push(edge);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

fn check_contracts(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    for (idx, contract) in solution.security_contracts.iter().enumerate() {
        let path = format!("security_contracts[{idx}]");
        let mut endpoints_ok = true;

        for (field, endpoint) in [("consumer", &contract.consumer), ("provider", &contract.provider)]
        {
            if endpoint.is_empty() || !solution.has_skill(endpoint) {
                issues.push(Issue::error(
                    codes::CONTRACT_SKILL_UNKNOWN,
                    format!("{path}.{field}"),
                    format!("security contract names unknown {field} '{endpoint}'"),
                ));
                endpoints_ok = false;
            }
        }
        if !endpoints_ok {
            continue;
        }

        let Some(hops) = handoff_path(solution, &contract.provider, &contract.consumer) else {
            issues.push(Issue::warning(
                codes::CONTRACT_NO_PATH,
                path.clone(),
                format!(
                    "no handoff path from provider '{}' to consumer '{}'",
                    contract.provider, contract.consumer
                ),
            ));
            continue;
        };

        // every hop on the one found path must carry every required grant
        for &edge in &hops {
            let handoff = &solution.handoffs[edge];
            for grant in &contract.requires_grants {
                if !handoff.grants_passed.contains(grant) {
                    issues.push(Issue::error(
                        codes::CONTRACT_GRANT_NOT_PASSED,
                        format!("handoffs[{edge}].grants_passed"),
                        format!(
                            "handoff '{}' drops grant '{grant}' required by the {} -> {} contract",
                            handoff.id, contract.provider, contract.consumer
                        ),
                    ));
                }
            }
        }
    }
}

fn check_routing(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    for (idx, skill) in solution.skills.iter().enumerate() {
        for (i, channel) in skill.entry_channels.iter().enumerate() {
            if !solution.routing.contains_key(channel) {
                issues.push(Issue::warning(
                    codes::CHANNEL_NOT_ROUTED,
                    format!("skills[{idx}].entry_channels[{i}]"),
                    format!("channel '{channel}' has no routing entry"),
                ));
            }
        }
    }

    for (channel, target) in &solution.routing {
        if !solution.has_skill(target) {
            issues.push(Issue::error(
                codes::ROUTING_TARGET_UNKNOWN,
                format!("routing.{channel}"),
                format!("routing for channel '{channel}' targets unknown skill '{target}'"),
            ));
        }
    }
}

fn check_mechanisms(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    for (idx, handoff) in solution.handoffs.iter().enumerate() {
        let mechanism = handoff.mechanism.as_str();
        if mechanism.is_empty() || mechanism == "internal-message" {
            continue;
        }
        if !solution.platform_connectors.iter().any(|c| c == mechanism) {
            issues.push(Issue::warning(
                codes::HANDOFF_MECHANISM_UNDECLARED,
                format!("handoffs[{idx}].mechanism"),
                format!("mechanism '{mechanism}' is not a declared platform connector"),
            ));
        }
    }
}

fn check_orphans(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    let mut reachable: HashSet<&str> = solution.routing.values().map(String::as_str).collect();
    for handoff in &solution.handoffs {
        reachable.insert(handoff.from.as_str());
        reachable.insert(handoff.to.as_str());
    }

    for (idx, skill) in solution.skills.iter().enumerate() {
        if !skill.id.is_empty() && !reachable.contains(skill.id.as_str()) {
            issues.push(
                Issue::warning(
                    codes::SKILL_UNREACHABLE,
                    format!("skills[{idx}]"),
                    format!("skill '{}' is reachable by no routing entry or handoff", skill.id),
                )
                .with_suggestion("route a channel to the skill or hand off to it"),
            );
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Same three-color iterative DFS as workflow cycle detection, over
/// `from -> to` handoff edges.
fn detect_handoff_cycles(solution: &SolutionDoc, issues: &mut Vec<Issue>) {
    let skill_ids: HashSet<&str> = solution.skills.iter().map(|s| s.id.as_str()).collect();

    let mut order: Vec<&str> = Vec::new();
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for skill in &solution.skills {
        if skill.id.is_empty() || graph.contains_key(skill.id.as_str()) {
            continue;
        }
        order.push(skill.id.as_str());
        graph.insert(skill.id.as_str(), Vec::new());
    }
    for handoff in &solution.handoffs {
        if !skill_ids.contains(handoff.from.as_str()) || !skill_ids.contains(handoff.to.as_str()) {
            continue; // dangling endpoints already reported
        }
        let targets = graph.entry(handoff.from.as_str()).or_default();
        if !targets.contains(&handoff.to.as_str()) {
            targets.push(handoff.to.as_str());
        }
    }

    let mut color: HashMap<&str, Color> = order.iter().map(|id| (*id, Color::White)).collect();

    for &root in &order {
        if color[root] != Color::White {
            continue;
        }
        color.insert(root, Color::Gray);
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        let mut path: Vec<&str> = vec![root];

        while let Some(&(node, next)) = stack.last() {
            let children = graph.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if next >= children.len() {
                color.insert(node, Color::Black);
                stack.pop();
                path.pop();
                continue;
            }
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }

            let child = children[next];
            match color[child] {
                Color::White => {
                    color.insert(child, Color::Gray);
                    stack.push((child, 0));
                    path.push(child);
                }
                Color::Gray => {
                    let start = path.iter().position(|n| *n == child).unwrap_or(0);
                    let rendered = path[start..]
                        .iter()
                        .chain(std::iter::once(&child))
                        .join(" -> ");
                    issues.push(Issue::error(
                        codes::HANDOFF_CIRCULAR,
                        "handoffs",
                        format!("Handoff cycle detected: {rendered}"),
                    ));
                }
                Color::Black => {}
            }
        }
    }
}
