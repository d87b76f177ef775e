//! The patch engine.
//!
//! A patch is a flat map of `dotted.paths` (with optional `[n]` indices) to
//! values. A value that is an object carrying one of the operation keys
//! (`_push`, `_delete`, `_update`, `_rename`) is an operation; anything else
//! is an assignment. Unreachable paths are skipped with a reason, never a
//! hard failure.

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::StateError;

/// Arrays that direct assignment may not destructively replace; an array
/// assigned at one of these paths is merged by element `id` instead.
const PROTECTED_ARRAYS: &[&str] = &[
    "tools",
    "scenarios",
    "policy.workflows",
    "policy.approvals",
    "intents.supported",
    "access_policy.rules",
    "response_filters",
    "grant_mappings",
    "triggers",
];

/// What one patch application did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Number of patch entries applied
    pub applied: usize,
    /// Entries that could not be applied, with the reason
    pub skipped: Vec<String>,
}

/// One parsed path segment: a key with an optional array index
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    key: String,
    index: Option<usize>,
}

fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    for raw in path.split('.') {
        if raw.is_empty() {
            return None;
        }
        let (key, index) = match raw.find('[') {
            None => (raw, None),
            Some(open) => {
                let close = raw.rfind(']')?;
                if close != raw.len() - 1 || open == 0 {
                    return None;
                }
                let idx: usize = raw[open + 1..close].parse().ok()?;
                (&raw[..open], Some(idx))
            }
        };
        segments.push(Segment {
            key: key.to_string(),
            index,
        });
    }
    Some(segments)
}

/// The keys-only form of a path, used for the protected-array check
fn normalized(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.key.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// Applies builder patches to draft documents
pub struct StateUpdateEngine;

impl StateUpdateEngine {
    /// Apply a patch to a draft document.
    ///
    /// Entries are applied independently; one unreachable path does not
    /// abort the rest.
    pub fn apply(document: &mut Value, patch: &Value) -> Result<UpdateOutcome, StateError> {
        if !document.is_object() {
            return Err(StateError::DocumentNotAnObject(type_name(document)));
        }
        let patch_map = patch
            .as_object()
            .ok_or_else(|| StateError::PatchNotAnObject(type_name(patch)))?;

        let mut outcome = UpdateOutcome::default();
        for (path, value) in patch_map {
            match apply_entry(document, path, value) {
                Ok(()) => {
                    trace!(path, "patch entry applied");
                    outcome.applied += 1;
                }
                Err(reason) => {
                    trace!(path, reason, "patch entry skipped");
                    outcome.skipped.push(format!("{path}: {reason}"));
                }
            }
        }
        Ok(outcome)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn operation_of(value: &Value) -> Option<(&'static str, &Value)> {
    let obj = value.as_object()?;
    for op in ["_push", "_delete", "_update", "_rename"] {
        if let Some(operand) = obj.get(op) {
            return Some((op, operand));
        }
    }
    None
}

fn apply_entry(document: &mut Value, path: &str, value: &Value) -> Result<(), &'static str> {
    let segments = parse_path(path).ok_or("malformed path")?;

    match operation_of(value) {
        Some(("_push", item)) => apply_push(document, &segments, item),
        Some(("_delete", flag)) => {
            if flag != &Value::Bool(true) {
                return Err("_delete requires the literal true");
            }
            apply_delete(document, &segments)
        }
        Some(("_update", fields)) => apply_update(document, &segments, fields),
        Some(("_rename", new_key)) => {
            let new_key = new_key.as_str().ok_or("_rename requires a string")?;
            apply_rename(document, &segments, new_key)
        }
        _ => apply_set(document, &segments, value),
    }
}

/// Walk to the value addressed by `segments`, optionally creating missing
/// intermediate objects. Indexed segments never create elements.
fn navigate<'a>(
    document: &'a mut Value,
    segments: &[Segment],
    create: bool,
) -> Result<&'a mut Value, &'static str> {
    let mut current = document;
    for segment in segments {
        let obj = current.as_object_mut().ok_or("path traverses a non-object")?;
        if !obj.contains_key(&segment.key) {
            // never create for indexed segments: there is no element to index
            if !create || segment.index.is_some() {
                return Err("path does not exist");
            }
            obj.insert(segment.key.clone(), Value::Object(Map::new()));
        }
        current = obj.get_mut(&segment.key).expect("key just ensured");

        if let Some(idx) = segment.index {
            let arr = current.as_array_mut().ok_or("indexed path into a non-array")?;
            current = arr.get_mut(idx).ok_or("index out of bounds")?;
        }
    }
    Ok(current)
}

fn apply_set(document: &mut Value, segments: &[Segment], value: &Value) -> Result<(), &'static str> {
    let (last, parents) = segments.split_last().ok_or("empty path")?;
    let parent = navigate(document, parents, true)?;
    let obj = parent.as_object_mut().ok_or("path traverses a non-object")?;

    match last.index {
        Some(idx) => {
            let arr = obj
                .get_mut(&last.key)
                .and_then(Value::as_array_mut)
                .ok_or("indexed path into a non-array")?;
            let slot = arr.get_mut(idx).ok_or("index out of bounds")?;
            *slot = value.clone();
        }
        None => {
            let protected = PROTECTED_ARRAYS.contains(&normalized(segments).as_str());
            if let (true, Value::Array(incoming)) = (protected, value) {
                if let Some(Value::Array(existing)) = obj.get_mut(&last.key) {
                    merge_by_id(existing, incoming);
                    return Ok(());
                }
            }
            obj.insert(last.key.clone(), value.clone());
        }
    }
    Ok(())
}

/// Upsert incoming elements into an existing protected array: elements whose
/// `id` matches are shallow-merged, new ids are appended, and existing
/// elements absent from the incoming array are kept.
fn merge_by_id(existing: &mut Vec<Value>, incoming: &[Value]) {
    for item in incoming {
        let id = item.get("id").and_then(Value::as_str);
        let position = id.and_then(|id| {
            existing
                .iter()
                .position(|e| e.get("id").and_then(Value::as_str) == Some(id))
        });
        match position {
            Some(pos) => {
                if let (Some(target), Some(fields)) =
                    (existing[pos].as_object_mut(), item.as_object())
                {
                    for (k, v) in fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
            None => existing.push(item.clone()),
        }
    }
}

fn apply_push(document: &mut Value, segments: &[Segment], item: &Value) -> Result<(), &'static str> {
    let (last, parents) = segments.split_last().ok_or("empty path")?;
    if last.index.is_some() {
        return Err("_push targets an array, not an element");
    }
    let parent = navigate(document, parents, true)?;
    let obj = parent.as_object_mut().ok_or("path traverses a non-object")?;

    match obj.get_mut(&last.key) {
        None => {
            obj.insert(last.key.clone(), Value::Array(vec![item.clone()]));
        }
        Some(Value::Array(arr)) => arr.push(item.clone()),
        Some(_) => return Err("_push into a non-array"),
    }
    Ok(())
}

fn apply_delete(document: &mut Value, segments: &[Segment]) -> Result<(), &'static str> {
    let (last, parents) = segments.split_last().ok_or("empty path")?;
    let parent = navigate(document, parents, false)?;
    let obj = parent.as_object_mut().ok_or("path traverses a non-object")?;

    match last.index {
        Some(idx) => {
            let arr = obj
                .get_mut(&last.key)
                .and_then(Value::as_array_mut)
                .ok_or("indexed path into a non-array")?;
            if idx >= arr.len() {
                return Err("index out of bounds");
            }
            arr.remove(idx);
        }
        None => {
            obj.remove(&last.key).ok_or("path does not exist")?;
        }
    }
    Ok(())
}

fn apply_update(document: &mut Value, segments: &[Segment], fields: &Value) -> Result<(), &'static str> {
    let (last, parents) = segments.split_last().ok_or("empty path")?;
    if last.index.is_some() {
        return Err("_update targets an array, not an element");
    }
    let fields = fields.as_object().ok_or("_update requires an object")?;
    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .ok_or("_update requires an id to match on")?;

    let parent = navigate(document, parents, false)?;
    let arr = parent
        .as_object_mut()
        .and_then(|o| o.get_mut(&last.key))
        .and_then(Value::as_array_mut)
        .ok_or("_update into a non-array")?;

    let target = arr
        .iter_mut()
        .find(|e| e.get("id").and_then(Value::as_str) == Some(id))
        .and_then(Value::as_object_mut)
        .ok_or("no element with matching id")?;

    for (k, v) in fields {
        target.insert(k.clone(), v.clone());
    }
    Ok(())
}

fn apply_rename(
    document: &mut Value,
    segments: &[Segment],
    new_key: &str,
) -> Result<(), &'static str> {
    let (last, parents) = segments.split_last().ok_or("empty path")?;
    if last.index.is_some() || new_key.is_empty() {
        return Err("_rename targets an object key");
    }
    let parent = navigate(document, parents, false)?;
    let obj = parent.as_object_mut().ok_or("path traverses a non-object")?;
    if obj.contains_key(new_key) {
        return Err("target key already exists");
    }
    let value = obj.remove(&last.key).ok_or("path does not exist")?;
    obj.insert(new_key.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(doc: &mut Value, patch: Value) -> UpdateOutcome {
        StateUpdateEngine::apply(doc, &patch).unwrap()
    }

    #[test]
    fn test_dotted_assignment_creates_intermediates() {
        let mut doc = json!({});
        let outcome = apply(&mut doc, json!({"problem.statement": "Customers need help"}));
        assert_eq!(outcome.applied, 1);
        assert_eq!(doc["problem"]["statement"], "Customers need help");
    }

    #[test]
    fn test_indexed_assignment() {
        let mut doc = json!({"tools": [{"id": "a"}, {"id": "b"}]});
        apply(&mut doc, json!({"tools[1].name": "Tool B"}));
        assert_eq!(doc["tools"][1]["name"], "Tool B");
        assert!(doc["tools"][0].get("name").is_none());
    }

    #[test]
    fn test_out_of_bounds_index_is_skipped() {
        let mut doc = json!({"tools": [{"id": "a"}]});
        let outcome = apply(&mut doc, json!({"tools[5].name": "Ghost"}));
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].contains("out of bounds"));
    }

    #[test]
    fn test_push_creates_and_appends() {
        let mut doc = json!({});
        apply(&mut doc, json!({"scenarios": {"_push": {"id": "s1", "title": "first"}}}));
        apply(&mut doc, json!({"scenarios": {"_push": {"id": "s2", "title": "second"}}}));
        assert_eq!(doc["scenarios"].as_array().unwrap().len(), 2);
        assert_eq!(doc["scenarios"][1]["id"], "s2");
    }

    #[test]
    fn test_delete_key_and_element() {
        let mut doc = json!({
            "identity": {"signature": "old"},
            "tools": [{"id": "a"}, {"id": "b"}]
        });
        apply(&mut doc, json!({"identity.signature": {"_delete": true}}));
        apply(&mut doc, json!({"tools[0]": {"_delete": true}}));
        assert!(doc["identity"].get("signature").is_none());
        assert_eq!(doc["tools"].as_array().unwrap().len(), 1);
        assert_eq!(doc["tools"][0]["id"], "b");
    }

    #[test]
    fn test_delete_requires_literal_true() {
        let mut doc = json!({"identity": {"signature": "old"}});
        let outcome = apply(&mut doc, json!({"identity.signature": {"_delete": "yes"}}));
        assert_eq!(outcome.applied, 0);
        assert_eq!(doc["identity"]["signature"], "old");
    }

    #[test]
    fn test_update_merges_matching_element() {
        let mut doc = json!({"tools": [
            {"id": "lookup", "name": "Lookup", "description": "old"},
            {"id": "refund", "name": "Refund"}
        ]});
        let outcome = apply(
            &mut doc,
            json!({"tools": {"_update": {"id": "lookup", "description": "fetch an order"}}}),
        );
        assert_eq!(outcome.applied, 1);
        assert_eq!(doc["tools"][0]["description"], "fetch an order");
        assert_eq!(doc["tools"][0]["name"], "Lookup");
        assert_eq!(doc["tools"][1]["name"], "Refund");
    }

    #[test]
    fn test_update_without_match_is_skipped() {
        let mut doc = json!({"tools": [{"id": "a"}]});
        let outcome = apply(&mut doc, json!({"tools": {"_update": {"id": "ghost", "name": "X"}}}));
        assert_eq!(outcome.applied, 0);
        assert!(outcome.skipped[0].contains("matching id"));
    }

    #[test]
    fn test_rename_key() {
        let mut doc = json!({"policy": {"guardrails": {"never": ["x"]}}});
        apply(&mut doc, json!({"policy.guardrails.never": {"_rename": "forbidden"}}));
        assert!(doc["policy"]["guardrails"].get("never").is_none());
        assert_eq!(doc["policy"]["guardrails"]["forbidden"][0], "x");
    }

    #[test]
    fn test_rename_refuses_to_clobber() {
        let mut doc = json!({"a": 1, "b": 2});
        let outcome = apply(&mut doc, json!({"a": {"_rename": "b"}}));
        assert_eq!(outcome.applied, 0);
        assert_eq!(doc["b"], 2);
    }

    #[test]
    fn test_protected_array_merges_instead_of_replacing() {
        let mut doc = json!({"tools": [
            {"id": "lookup", "name": "Lookup", "description": "fetch"},
            {"id": "refund", "name": "Refund"}
        ]});
        apply(
            &mut doc,
            json!({"tools": [{"id": "lookup", "name": "Lookup Order"}, {"id": "notify"}]}),
        );

        let tools = doc["tools"].as_array().unwrap();
        // refund survived, lookup was merged, notify was appended
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0]["name"], "Lookup Order");
        assert_eq!(tools[0]["description"], "fetch");
        assert_eq!(tools[1]["id"], "refund");
        assert_eq!(tools[2]["id"], "notify");
    }

    #[test]
    fn test_nested_protected_array() {
        let mut doc = json!({"policy": {"workflows": [{"id": "wf", "steps": ["a"]}]}});
        apply(&mut doc, json!({"policy.workflows": [{"id": "wf2", "steps": []}]}));
        assert_eq!(doc["policy"]["workflows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_unprotected_array_is_replaced() {
        let mut doc = json!({"problem": {"goals": ["old goal"]}});
        apply(&mut doc, json!({"problem.goals": ["new goal"]}));
        assert_eq!(doc["problem"]["goals"], json!(["new goal"]));
    }

    #[test]
    fn test_entries_apply_independently() {
        let mut doc = json!({"name": "Old"});
        let outcome = apply(
            &mut doc,
            json!({
                "name": "New",
                "tools[9].id": "ghost",
                "phase": "testing"
            }),
        );
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(doc["name"], "New");
        assert_eq!(doc["phase"], "testing");
    }

    #[test]
    fn test_boundary_errors() {
        let mut not_obj = json!([]);
        assert!(StateUpdateEngine::apply(&mut not_obj, &json!({})).is_err());

        let mut doc = json!({});
        assert!(StateUpdateEngine::apply(&mut doc, &json!("patch")).is_err());
    }

    #[test]
    fn test_malformed_paths_are_skipped() {
        let mut doc = json!({"a": 1});
        for bad in ["", "a..b", "a[", "a[x]", "[0]", "a[0"] {
            let outcome = apply(&mut doc, json!({bad: 1}));
            assert_eq!(outcome.applied, 0, "path={bad:?}");
        }
    }
}
