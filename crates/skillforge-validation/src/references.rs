//! Stage 2: cross-reference resolution within one skill.
//!
//! Pure: instead of stamping `*_resolved` flags onto the document, the
//! resolver returns a [`ResolutionOutcome`] whose map downstream stages
//! consume. Dangling references are warnings (export readiness is the hard
//! gate) while duplicate ids and workflow cycles are errors.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;

use skillforge_domain::enums::is_system_tool;
use skillforge_domain::issue::{codes, Issue, UnresolvedRefs};
use skillforge_domain::skill::SkillDoc;

/// Per-reference resolution results keyed by document location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionMap {
    /// Workflow id → one flag per step
    pub workflow_steps: BTreeMap<String, Vec<bool>>,
    /// Intent id → whether its `maps_to_workflow` resolved
    /// (absent for intents that declare no workflow)
    pub intents: BTreeMap<String, bool>,
    /// One flag per approval rule, by index
    pub approvals: Vec<bool>,
}

impl ResolutionMap {
    /// True when every recorded reference resolved
    pub fn fully_resolved(&self) -> bool {
        self.workflow_steps.values().all(|steps| steps.iter().all(|b| *b))
            && self.intents.values().all(|b| *b)
            && self.approvals.iter().all(|b| *b)
    }
}

/// Everything stage 2 produces
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Reference warnings, duplicate and cycle errors
    pub issues: Vec<Issue>,
    /// Per-reference resolution flags
    pub resolution: ResolutionMap,
    /// Deduplicated dangling references
    pub unresolved: UnresolvedRefs,
}

struct Lookup {
    tool_ids: HashSet<String>,
    tool_names_lower: HashSet<String>,
    workflow_ids: HashSet<String>,
}

impl Lookup {
    fn build(skill: &SkillDoc) -> Self {
        Self {
            tool_ids: skill.tools.iter().map(|t| t.id.clone()).collect(),
            tool_names_lower: skill
                .tools
                .iter()
                .map(|t| t.name.to_lowercase())
                .collect(),
            workflow_ids: skill
                .policy
                .workflows
                .iter()
                .map(|w| w.id.clone())
                .collect(),
        }
    }

    /// Tool id, tool name (case-insensitive), or system prefix
    fn tool_resolves(&self, reference: &str) -> bool {
        self.tool_ids.contains(reference)
            || self.tool_names_lower.contains(&reference.to_lowercase())
            || is_system_tool(reference)
    }

    /// A workflow step may additionally name a sub-workflow
    fn step_resolves(&self, reference: &str) -> bool {
        self.tool_resolves(reference) || self.workflow_ids.contains(reference)
    }
}

/// Resolve every cross-reference in the skill.
pub fn resolve_references(skill: &SkillDoc) -> ResolutionOutcome {
    let lookup = Lookup::build(skill);
    let mut outcome = ResolutionOutcome::default();

    resolve_workflow_steps(skill, &lookup, &mut outcome);
    resolve_intent_workflows(skill, &lookup, &mut outcome);
    resolve_approvals(skill, &lookup, &mut outcome);
    scan_duplicates(skill, &mut outcome.issues);
    check_intent_connectivity(skill, &mut outcome);
    detect_workflow_cycles(skill, &mut outcome.issues);

    outcome
}

fn resolve_workflow_steps(skill: &SkillDoc, lookup: &Lookup, outcome: &mut ResolutionOutcome) {
    for (wf_idx, workflow) in skill.policy.workflows.iter().enumerate() {
        let mut flags = Vec::with_capacity(workflow.steps.len());
        for (step_idx, step) in workflow.steps.iter().enumerate() {
            let resolved = !step.is_empty() && lookup.step_resolves(step);
            flags.push(resolved);
            if !resolved && !step.is_empty() {
                outcome.issues.push(
                    Issue::warning(
                        codes::TOOL_NOT_FOUND,
                        format!("policy.workflows[{wf_idx}].steps[{step_idx}]"),
                        format!("step '{step}' matches no tool, system tool, or workflow"),
                    )
                    .with_suggestion("define the tool or correct the step reference"),
                );
                outcome.unresolved.add_tool(step);
            }
        }
        outcome
            .resolution
            .workflow_steps
            .entry(workflow.id.clone())
            .or_insert(flags);
    }
}

fn resolve_intent_workflows(skill: &SkillDoc, lookup: &Lookup, outcome: &mut ResolutionOutcome) {
    for (idx, intent) in skill.intents.supported.iter().enumerate() {
        let Some(target) = intent.maps_to_workflow.as_deref() else {
            continue;
        };
        if target.is_empty() {
            continue;
        }
        let resolved = lookup.workflow_ids.contains(target);
        outcome.resolution.intents.insert(intent.id.clone(), resolved);
        if !resolved {
            outcome.issues.push(Issue::warning(
                codes::WORKFLOW_NOT_FOUND,
                format!("intents.supported[{idx}].maps_to_workflow"),
                format!("intent '{}' maps to unknown workflow '{target}'", intent.id),
            ));
            outcome.unresolved.add_workflow(target);
        }
    }
}

fn resolve_approvals(skill: &SkillDoc, lookup: &Lookup, outcome: &mut ResolutionOutcome) {
    for (idx, approval) in skill.policy.approvals.iter().enumerate() {
        let resolved = !approval.tool_id.is_empty() && lookup.tool_resolves(&approval.tool_id);
        outcome.resolution.approvals.push(resolved);
        if !resolved && !approval.tool_id.is_empty() {
            outcome.issues.push(Issue::warning(
                codes::APPROVAL_TOOL_NOT_FOUND,
                format!("policy.approvals[{idx}].tool_id"),
                format!("approval rule references unknown tool '{}'", approval.tool_id),
            ));
            outcome.unresolved.add_tool(&approval.tool_id);
        }
    }
}

/// One issue per distinct duplicated key; the first occurrence is never
/// flagged, and N copies of one id produce exactly one issue.
fn find_duplicates(keys: impl Iterator<Item = (usize, String)>) -> Vec<(usize, String)> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for (idx, key) in keys {
        if key.is_empty() {
            continue;
        }
        if !seen.insert(key.clone()) && reported.insert(key.clone()) {
            duplicates.push((idx, key));
        }
    }
    duplicates
}

fn scan_duplicates(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, id) in find_duplicates(
        skill.tools.iter().enumerate().map(|(i, t)| (i, t.id.clone())),
    ) {
        issues.push(Issue::error(
            codes::DUPLICATE_TOOL_ID,
            format!("tools[{idx}].id"),
            format!("duplicate tool id '{id}'"),
        ));
    }

    for (idx, name) in find_duplicates(
        skill
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.name.to_lowercase())),
    ) {
        issues.push(Issue::warning(
            codes::DUPLICATE_TOOL_NAME,
            format!("tools[{idx}].name"),
            format!("duplicate tool name '{name}'"),
        ));
    }

    for (idx, id) in find_duplicates(
        skill
            .policy
            .workflows
            .iter()
            .enumerate()
            .map(|(i, w)| (i, w.id.clone())),
    ) {
        issues.push(Issue::error(
            codes::DUPLICATE_WORKFLOW_ID,
            format!("policy.workflows[{idx}].id"),
            format!("duplicate workflow id '{id}'"),
        ));
    }

    for (idx, id) in find_duplicates(
        skill
            .intents
            .supported
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.id.clone())),
    ) {
        issues.push(Issue::error(
            codes::DUPLICATE_INTENT_ID,
            format!("intents.supported[{idx}].id"),
            format!("duplicate intent id '{id}'"),
        ));
    }

    for (idx, id) in find_duplicates(
        skill
            .scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.id.clone())),
    ) {
        issues.push(Issue::error(
            codes::DUPLICATE_SCENARIO_ID,
            format!("scenarios[{idx}].id"),
            format!("duplicate scenario id '{id}'"),
        ));
    }
}

/// Heuristic, deliberately loose: an intent counts as connected if some
/// workflow trigger names it, or any keyword of its id (split on `_`/`-`/`.`,
/// length > 2) appears in the concatenated tool names and ids. False
/// negatives and positives are both acceptable; authors react to the
/// warning, they are not blocked by it.
fn check_intent_connectivity(skill: &SkillDoc, outcome: &mut ResolutionOutcome) {
    let haystack: String = skill
        .tools
        .iter()
        .flat_map(|t| [t.name.to_lowercase(), t.id.to_lowercase()])
        .join(" ");

    for (idx, intent) in skill.intents.supported.iter().enumerate() {
        if intent.id.is_empty() {
            continue;
        }
        // a resolved workflow mapping already fulfills the intent
        if outcome.resolution.intents.get(&intent.id).copied() == Some(true) {
            continue;
        }

        let trigger_match = skill
            .policy
            .workflows
            .iter()
            .any(|w| w.trigger.as_deref() == Some(intent.id.as_str()));

        let keyword_match = intent
            .id
            .split(['_', '-', '.'])
            .filter(|k| k.len() > 2)
            .any(|k| haystack.contains(&k.to_lowercase()));

        if !trigger_match && !keyword_match {
            outcome.issues.push(
                Issue::warning(
                    codes::INTENT_NO_TOOLS,
                    format!("intents.supported[{idx}]"),
                    format!("nothing visibly fulfills intent '{}'", intent.id),
                )
                .with_suggestion("map the intent to a workflow or add a matching tool"),
            );
            outcome.unresolved.add_intent(&intent.id);
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS over the workflow reference graph, iterative so that
/// user-authored graphs of arbitrary depth cannot overflow the stack.
/// Colors persist across roots, so each distinct cycle is reported once.
fn detect_workflow_cycles(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    let ids: HashSet<&str> = skill
        .policy
        .workflows
        .iter()
        .filter(|w| !w.id.is_empty())
        .map(|w| w.id.as_str())
        .collect();

    let mut order: Vec<&str> = Vec::new();
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for workflow in &skill.policy.workflows {
        if workflow.id.is_empty() || graph.contains_key(workflow.id.as_str()) {
            continue; // duplicate workflow id, first definition wins
        }
        let targets: Vec<&str> = workflow
            .steps
            .iter()
            .filter(|step| *step != &workflow.id && ids.contains(step.as_str()))
            .map(String::as_str)
            .collect();
        order.push(workflow.id.as_str());
        graph.insert(workflow.id.as_str(), targets);
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
                    // back edge; render the cycle starting from its target
                    let start = path.iter().position(|n| *n == child).unwrap_or(0);
                    let rendered = path[start..]
                        .iter()
                        .chain(std::iter::once(&child))
                        .join(" -> ");
                    issues.push(Issue::error(
                        codes::WORKFLOW_CIRCULAR,
                        "policy.workflows",
                        format!("Workflow cycle detected: {rendered}"),
                    ));
                }
                Color::Black => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> SkillDoc {
        serde_json::from_value(value).unwrap()
    }

    // ============================================================================
    // Step Resolution Tests
    // ============================================================================

    #[test]
    fn test_steps_resolve_by_id_name_and_case_insensitive_name() {
        let skill = doc(json!({
            "tools": [{"id": "lookup_order", "name": "Lookup Order"}],
            "policy": {"workflows": [
                {"id": "wf", "steps": ["lookup_order", "Lookup Order", "LOOKUP ORDER"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.resolution.workflow_steps["wf"], vec![true, true, true]);
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_system_tools_never_produce_tool_not_found() {
        let skill = doc(json!({
            "policy": {"workflows": [
                {"id": "wf", "steps": ["sys.emitUserMessage", "ui.listPlugins", "cp.admin_api"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::TOOL_NOT_FOUND));
        assert_eq!(outcome.resolution.workflow_steps["wf"], vec![true, true, true]);
    }

    #[test]
    fn test_dangling_step_is_single_warning() {
        let skill = doc(json!({
            "tools": [{"id": "a", "name": "A"}],
            "policy": {"workflows": [{"id": "wf", "steps": ["a", "ghost_tool"]}]}
        }));
        let outcome = resolve_references(&skill);
        let hits: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.code == codes::TOOL_NOT_FOUND)
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_error());
        assert_eq!(outcome.unresolved.tools, vec!["ghost_tool"]);
        assert_eq!(outcome.resolution.workflow_steps["wf"], vec![true, false]);
    }

    #[test]
    fn test_sub_workflow_steps_resolve() {
        let skill = doc(json!({
            "policy": {"workflows": [
                {"id": "wf_outer", "steps": ["wf_inner"]},
                {"id": "wf_inner", "steps": ["sys.emitUserMessage"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_unresolved_references_deduplicate() {
        let skill = doc(json!({
            "policy": {"workflows": [
                {"id": "wf1", "steps": ["ghost", "ghost"]},
                {"id": "wf2", "steps": ["ghost"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        assert_eq!(outcome.unresolved.tools, vec!["ghost"]);
        // but each dangling step location still warns
        assert_eq!(
            outcome.issues.iter().filter(|i| i.code == codes::TOOL_NOT_FOUND).count(),
            3
        );
    }

    // ============================================================================
    // Intent and Approval Resolution Tests
    // ============================================================================

    #[test]
    fn test_intent_workflow_resolution() {
        let skill = doc(json!({
            "intents": {"supported": [
                {"id": "refund", "maps_to_workflow": "wf_refund"},
                {"id": "track", "maps_to_workflow": "wf_missing"}
            ]},
            "policy": {"workflows": [{"id": "wf_refund", "steps": []}]}
        }));
        let outcome = resolve_references(&skill);
        assert_eq!(outcome.resolution.intents["refund"], true);
        assert_eq!(outcome.resolution.intents["track"], false);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.code == codes::WORKFLOW_NOT_FOUND && !i.is_error()));
        assert_eq!(outcome.unresolved.workflows, vec!["wf_missing"]);
    }

    #[test]
    fn test_approval_resolution_does_not_accept_workflows() {
        let skill = doc(json!({
            "tools": [{"id": "refund_order", "name": "Refund Order"}],
            "policy": {
                "workflows": [{"id": "wf_refund", "steps": ["refund_order"]}],
                "approvals": [
                    {"tool_id": "refund_order"},
                    {"tool_id": "wf_refund"}
                ]
            }
        }));
        let outcome = resolve_references(&skill);
        assert_eq!(outcome.resolution.approvals, vec![true, false]);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.code == codes::APPROVAL_TOOL_NOT_FOUND));
    }

    // ============================================================================
    // Duplicate Detection Tests
    // ============================================================================

    #[test]
    fn test_three_tools_one_id_exactly_one_error() {
        let skill = doc(json!({
            "tools": [
                {"id": "dup", "name": "A"},
                {"id": "dup", "name": "B"},
                {"id": "dup", "name": "C"},
                {"id": "unique", "name": "D"}
            ]
        }));
        let outcome = resolve_references(&skill);
        let dups: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.code == codes::DUPLICATE_TOOL_ID)
            .collect();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].path, "tools[1].id");
        assert!(dups[0].is_error());
    }

    #[test]
    fn test_duplicate_names_warn_case_insensitively() {
        let skill = doc(json!({
            "tools": [
                {"id": "a", "name": "Lookup Order"},
                {"id": "b", "name": "LOOKUP ORDER"}
            ]
        }));
        let outcome = resolve_references(&skill);
        let hits: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.code == codes::DUPLICATE_TOOL_NAME)
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_error());
    }

    #[test]
    fn test_duplicate_workflow_intent_scenario_ids_are_errors() {
        let skill = doc(json!({
            "scenarios": [{"id": "s1", "title": "a"}, {"id": "s1", "title": "b"}],
            "intents": {"supported": [{"id": "i1"}, {"id": "i1"}]},
            "policy": {"workflows": [{"id": "w1", "steps": []}, {"id": "w1", "steps": []}]}
        }));
        let outcome = resolve_references(&skill);
        for code in [
            codes::DUPLICATE_SCENARIO_ID,
            codes::DUPLICATE_INTENT_ID,
            codes::DUPLICATE_WORKFLOW_ID,
        ] {
            let hits: Vec<_> = outcome.issues.iter().filter(|i| i.code == code).collect();
            assert_eq!(hits.len(), 1, "{code}");
            assert!(hits[0].is_error());
        }
    }

    #[test]
    fn test_empty_ids_are_not_duplicates() {
        let skill = doc(json!({
            "tools": [{"id": "", "name": "A"}, {"id": "", "name": "B"}]
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::DUPLICATE_TOOL_ID));
    }

    // ============================================================================
    // Intent Connectivity Heuristic Tests
    // ============================================================================

    #[test]
    fn test_intent_connected_via_trigger() {
        let skill = doc(json!({
            "intents": {"supported": [{"id": "track_order"}]},
            "policy": {"workflows": [{"id": "wf", "trigger": "track_order", "steps": []}]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::INTENT_NO_TOOLS));
    }

    #[test]
    fn test_intent_connected_via_keyword_substring() {
        // "order" (len 5) appears in the tool id "lookup_order"
        let skill = doc(json!({
            "intents": {"supported": [{"id": "track_order"}]},
            "tools": [{"id": "lookup_order", "name": "Lookup"}]
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::INTENT_NO_TOOLS));
    }

    #[test]
    fn test_intent_keywords_shorter_than_three_chars_are_ignored() {
        // every keyword of "do_it" is <= 2 chars, so nothing can match
        let skill = doc(json!({
            "intents": {"supported": [{"id": "do_it"}]},
            "tools": [{"id": "do", "name": "it"}]
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().any(|i| i.code == codes::INTENT_NO_TOOLS));
        assert_eq!(outcome.unresolved.intents, vec!["do_it"]);
    }

    #[test]
    fn test_unfulfilled_intent_warns() {
        let skill = doc(json!({
            "intents": {"supported": [{"id": "cancel_subscription"}]},
            "tools": [{"id": "lookup_order", "name": "Lookup Order"}]
        }));
        let outcome = resolve_references(&skill);
        let hits: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.code == codes::INTENT_NO_TOOLS)
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_error());
    }

    #[test]
    fn test_resolved_workflow_mapping_suppresses_heuristic() {
        let skill = doc(json!({
            "intents": {"supported": [{"id": "zzz", "maps_to_workflow": "wf"}]},
            "policy": {"workflows": [{"id": "wf", "steps": []}]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::INTENT_NO_TOOLS));
    }

    // ============================================================================
    // Workflow Cycle Tests
    // ============================================================================

    #[test]
    fn test_two_node_cycle_exactly_one_error() {
        let skill = doc(json!({
            "policy": {"workflows": [
                {"id": "a", "steps": ["b"]},
                {"id": "b", "steps": ["a"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        let cycles: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.code == codes::WORKFLOW_CIRCULAR)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].is_error());
        assert!(cycles[0].message.contains("a"));
        assert!(cycles[0].message.contains("b"));
        assert!(cycles[0].message.contains("->"));
    }

    #[test]
    fn test_chain_to_tool_is_not_a_cycle() {
        let skill = doc(json!({
            "tools": [{"id": "tool", "name": "Tool"}],
            "policy": {"workflows": [
                {"id": "a", "steps": ["b"]},
                {"id": "b", "steps": ["tool"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::WORKFLOW_CIRCULAR));
    }

    #[test]
    fn test_self_loop_is_excluded() {
        let skill = doc(json!({
            "policy": {"workflows": [{"id": "a", "steps": ["a"]}]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.issues.iter().all(|i| i.code != codes::WORKFLOW_CIRCULAR));
    }

    #[test]
    fn test_cycle_in_disconnected_component_is_found() {
        let skill = doc(json!({
            "policy": {"workflows": [
                {"id": "root", "steps": ["sys.emitUserMessage"]},
                {"id": "x", "steps": ["y"]},
                {"id": "y", "steps": ["z"]},
                {"id": "z", "steps": ["x"]}
            ]}
        }));
        let outcome = resolve_references(&skill);
        let cycles: Vec<_> = outcome
            .issues
            .iter()
            .filter(|i| i.code == codes::WORKFLOW_CIRCULAR)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].message.contains("x -> y -> z -> x"));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut workflows = Vec::new();
        for i in 0..5000 {
            workflows.push(json!({"id": format!("wf{i}"), "steps": [format!("wf{}", i + 1)]}));
        }
        workflows.push(json!({"id": "wf5000", "steps": ["wf0"]}));
        let skill = doc(json!({"policy": {"workflows": workflows}}));
        let outcome = resolve_references(&skill);
        assert_eq!(
            outcome
                .issues
                .iter()
                .filter(|i| i.code == codes::WORKFLOW_CIRCULAR)
                .count(),
            1
        );
    }

    #[test]
    fn test_fully_resolved_map() {
        let skill = doc(json!({
            "tools": [{"id": "a", "name": "A"}],
            "policy": {"workflows": [{"id": "wf", "steps": ["a"]}]}
        }));
        let outcome = resolve_references(&skill);
        assert!(outcome.resolution.fully_resolved());

        let broken = doc(json!({
            "policy": {"workflows": [{"id": "wf", "steps": ["ghost"]}]}
        }));
        assert!(!resolve_references(&broken).resolution.fully_resolved());
    }
}
