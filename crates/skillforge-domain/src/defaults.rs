//! Default filling for drafts.
//!
//! Deep-merges the canonical empty skeleton (the serialized `Default` of the
//! typed model) underneath a draft: missing or null keys are filled, present
//! values always win, arrays are never overwritten. Idempotent by
//! construction; runs before validation so required top-level keys exist.

use serde_json::Value;

use crate::skill::SkillDoc;
use crate::solution::SolutionDoc;

fn merge_defaults(target: &mut Value, skeleton: &Value) {
    let (Value::Object(target_map), Value::Object(skeleton_map)) = (&mut *target, skeleton) else {
        return; // draft value wins over the skeleton
    };

    for (key, default_value) in skeleton_map {
        match target_map.get_mut(key) {
            None => {
                target_map.insert(key.clone(), default_value.clone());
            }
            Some(existing) if existing.is_null() => {
                *existing = default_value.clone();
            }
            Some(existing) => merge_defaults(existing, default_value),
        }
    }
}

fn ensure_defaults(draft: &mut Value, skeleton: Value) {
    if draft.is_null() {
        *draft = skeleton;
        return;
    }
    if draft.is_object() {
        merge_defaults(draft, &skeleton);
    }
    // anything else is left for the validator to report at the boundary
}

/// Fill a skill draft with the canonical skeleton's missing keys.
pub fn ensure_skill_defaults(draft: &mut Value) {
    let skeleton =
        serde_json::to_value(SkillDoc::default()).expect("default skill document serializes");
    ensure_defaults(draft, skeleton);
}

/// Fill a solution draft with the canonical skeleton's missing keys.
pub fn ensure_solution_defaults(draft: &mut Value) {
    let skeleton =
        serde_json::to_value(SolutionDoc::default()).expect("default solution document serializes");
    ensure_defaults(draft, skeleton);
}
