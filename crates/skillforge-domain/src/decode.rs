//! Lenient decoding of builder drafts into typed documents.
//!
//! Drafts arrive sparse and possibly malformed. Each section decodes
//! independently: a section (or array element) whose JSON shape does not fit
//! the model yields one `INVALID_TYPE` issue at that path and is replaced by
//! its default (elements are dropped), so one broken section never blocks
//! validation of the rest. Only a non-object top level is a hard error;
//! that is caller misuse, not draft content.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::issue::{codes, Issue};
use crate::skill::{AccessPolicy, Intents, Policy, SkillDoc};
use crate::solution::SolutionDoc;

/// Boundary misuse of the decoder; never produced for draft content
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The top-level value was not a JSON object
    #[error("expected a JSON object document, got {0}")]
    NotAnObject(&'static str),
}

/// Human-readable name of a JSON value's type, for messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_type(path: &str, expected: &str, got: &Value) -> Issue {
    Issue::error(
        codes::INVALID_TYPE,
        path,
        format!("expected {expected}, got {}", json_type_name(got)),
    )
}

/// Decode a string field; missing yields an empty string, a non-string
/// value yields an issue plus the empty string.
fn decode_string(obj: &Map<String, Value>, key: &str, issues: &mut Vec<Issue>) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            issues.push(invalid_type(key, "string", other));
            String::new()
        }
    }
}

/// Decode an object-shaped section into `T`; missing yields the default,
/// a wrong shape yields an issue plus the default.
fn decode_section<T: DeserializeOwned + Default>(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<Issue>,
) -> T {
    match obj.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => match serde_json::from_value::<T>(value.clone()) {
            Ok(section) => section,
            Err(err) => {
                issues.push(Issue::error(
                    codes::INVALID_TYPE,
                    path,
                    format!("section has an unexpected shape: {err}"),
                ));
                T::default()
            }
        },
    }
}

/// Decode an array section element-wise; malformed elements are reported
/// and dropped rather than aborting the array.
fn decode_array<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Vec<T> {
    let items = match obj.get(key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            issues.push(invalid_type(path, "array", other));
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(element) => out.push(element),
            Err(err) => issues.push(Issue::error(
                codes::INVALID_TYPE,
                format!("{path}[{idx}]"),
                format!("element has an unexpected shape: {err}"),
            )),
        }
    }
    out
}

/// Sub-object accessor; present-but-not-object is reported once.
fn section_object<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    issues: &mut Vec<Issue>,
) -> Option<&'a Map<String, Value>> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            issues.push(invalid_type(key, "object", other));
            None
        }
    }
}

/// Decode a skill draft.
///
/// Returns the typed document plus any `INVALID_TYPE` issues describing
/// sections that could not be decoded and were defaulted.
pub fn skill_from_value(value: &Value) -> Result<(SkillDoc, Vec<Issue>), DocumentError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DocumentError::NotAnObject(json_type_name(value)))?;

    let mut issues = Vec::new();
    let mut doc = SkillDoc {
        id: decode_string(obj, "id", &mut issues),
        name: decode_string(obj, "name", &mut issues),
        phase: decode_string(obj, "phase", &mut issues),
        problem: decode_section(obj, "problem", "problem", &mut issues),
        scenarios: decode_array(obj, "scenarios", "scenarios", &mut issues),
        role: decode_section(obj, "role", "role", &mut issues),
        tools: decode_array(obj, "tools", "tools", &mut issues),
        engine: decode_section(obj, "engine", "engine", &mut issues),
        identity: decode_section(obj, "identity", "identity", &mut issues),
        grant_mappings: decode_array(obj, "grant_mappings", "grant_mappings", &mut issues),
        response_filters: decode_array(obj, "response_filters", "response_filters", &mut issues),
        triggers: decode_array(obj, "triggers", "triggers", &mut issues),
        ..SkillDoc::default()
    };

    if let Some(intents) = section_object(obj, "intents", &mut issues) {
        doc.intents = Intents {
            supported: decode_array(intents, "supported", "intents.supported", &mut issues),
            thresholds: decode_section(intents, "thresholds", "intents.thresholds", &mut issues),
            out_of_domain: decode_section(
                intents,
                "out_of_domain",
                "intents.out_of_domain",
                &mut issues,
            ),
        };
    }

    if let Some(policy) = section_object(obj, "policy", &mut issues) {
        doc.policy = Policy {
            guardrails: decode_section(policy, "guardrails", "policy.guardrails", &mut issues),
            workflows: decode_array(policy, "workflows", "policy.workflows", &mut issues),
            approvals: decode_array(policy, "approvals", "policy.approvals", &mut issues),
        };
    }

    if let Some(access) = section_object(obj, "access_policy", &mut issues) {
        doc.access_policy = AccessPolicy {
            rules: decode_array(access, "rules", "access_policy.rules", &mut issues),
        };
    }

    Ok((doc, issues))
}

/// Decode a solution draft, with the same leniency as [`skill_from_value`].
pub fn solution_from_value(value: &Value) -> Result<(SolutionDoc, Vec<Issue>), DocumentError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DocumentError::NotAnObject(json_type_name(value)))?;

    let mut issues = Vec::new();
    let mut doc = SolutionDoc {
        id: decode_string(obj, "id", &mut issues),
        name: decode_string(obj, "name", &mut issues),
        identity: decode_section(obj, "identity", "identity", &mut issues),
        skills: decode_array(obj, "skills", "skills", &mut issues),
        grants: decode_array(obj, "grants", "grants", &mut issues),
        handoffs: decode_array(obj, "handoffs", "handoffs", &mut issues),
        platform_connectors: decode_array(
            obj,
            "platform_connectors",
            "platform_connectors",
            &mut issues,
        ),
        security_contracts: decode_array(
            obj,
            "security_contracts",
            "security_contracts",
            &mut issues,
        ),
        ..SolutionDoc::default()
    };

    if let Some(routing) = section_object(obj, "routing", &mut issues) {
        for (channel, target) in routing {
            match target {
                Value::String(skill) => {
                    doc.routing.insert(channel.clone(), skill.clone());
                }
                other => issues.push(invalid_type(&format!("routing.{channel}"), "string", other)),
            }
        }
    }

    Ok((doc, issues))
}
