//! Stage 1: type, shape, and enum checks over every section.
//!
//! Per-section checks are independent; absence of one section never blocks
//! checking another that is present. Enum-valued strings parse against the
//! closed domains in `skillforge_domain::enums`; a failed parse becomes an
//! `INVALID_ENUM` issue carrying the allowed set.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use skillforge_domain::enums::{
    AutonomyLevel, CriticStrictness, DataType, InvalidEnum, MockMode, MockStatus, OnMaxIterations,
    SkillPhase, Tone, ToolPolicyAllowed, TriggerType, Verbosity, WorkflowDeviation,
};
use skillforge_domain::issue::{codes, Issue};
use skillforge_domain::skill::{SkillDoc, Trigger};

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$").unwrap());

static ISO_DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P(\d+D)?(T(\d+H)?(\d+M)?(\d+S)?)?$").unwrap());

/// Validate types, shapes, and enum domains across the whole document.
pub fn validate_schema(skill: &SkillDoc) -> Vec<Issue> {
    let mut issues = Vec::new();

    check_identity_fields(skill, &mut issues);
    check_role(skill, &mut issues);
    check_scenarios(skill, &mut issues);
    check_intents(skill, &mut issues);
    check_tools(skill, &mut issues);
    check_policy(skill, &mut issues);
    check_engine(skill, &mut issues);
    check_triggers(skill, &mut issues);

    issues
}

fn check_enum<T>(value: &str, path: &str, issues: &mut Vec<Issue>)
where
    T: FromStr<Err = InvalidEnum>,
{
    if value.is_empty() {
        return;
    }
    if let Err(err) = value.parse::<T>() {
        issues.push(Issue::error(codes::INVALID_ENUM, path, err.to_string()));
    }
}

fn check_data_type(value: &str, path: &str, issues: &mut Vec<Issue>) {
    if value.is_empty() {
        return;
    }
    if let Err(err) = DataType::parse_with_aliases(value) {
        issues.push(Issue::error(codes::INVALID_ENUM, path, err.to_string()));
    }
}

fn check_ident(value: &str, path: &str, issues: &mut Vec<Issue>) {
    if value.is_empty() || IDENT_RE.is_match(value) {
        return;
    }
    issues.push(Issue::error(
        codes::INVALID_ID,
        path,
        format!("'{value}' is not a valid identifier (letters, digits, '_', '.', '-', starting with a letter)"),
    ));
}

fn check_required(value: &str, path: &str, what: &str, issues: &mut Vec<Issue>) {
    if value.trim().is_empty() {
        issues.push(Issue::error(
            codes::MISSING_FIELD,
            path,
            format!("{what} is required"),
        ));
    }
}

fn check_identity_fields(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    check_required(&skill.id, "id", "skill id", issues);
    check_ident(&skill.id, "id", issues);
    check_required(&skill.name, "name", "skill name", issues);
    check_enum::<SkillPhase>(&skill.phase, "phase", issues);
}

fn check_role(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    check_enum::<Tone>(&skill.role.communication.tone, "role.communication.tone", issues);
    check_enum::<Verbosity>(
        &skill.role.communication.verbosity,
        "role.communication.verbosity",
        issues,
    );
}

fn check_scenarios(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, scenario) in skill.scenarios.iter().enumerate() {
        let path = format!("scenarios[{idx}]");
        check_required(&scenario.id, &format!("{path}.id"), "scenario id", issues);
        check_ident(&scenario.id, &format!("{path}.id"), issues);
    }
}

fn check_intents(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, intent) in skill.intents.supported.iter().enumerate() {
        let path = format!("intents.supported[{idx}]");
        check_required(&intent.id, &format!("{path}.id"), "intent id", issues);
        check_ident(&intent.id, &format!("{path}.id"), issues);
    }

    check_threshold(
        skill.intents.thresholds.confirm,
        "intents.thresholds.confirm",
        issues,
    );
    check_threshold(
        skill.intents.thresholds.clarify,
        "intents.thresholds.clarify",
        issues,
    );
}

fn check_threshold(value: Option<f64>, path: &str, issues: &mut Vec<Issue>) {
    if let Some(v) = value {
        if !(0.0..=1.0).contains(&v) {
            issues.push(Issue::error(
                codes::OUT_OF_RANGE,
                path,
                format!("threshold {v} must be between 0.0 and 1.0"),
            ));
        }
    }
}

fn check_tools(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, tool) in skill.tools.iter().enumerate() {
        let path = format!("tools[{idx}]");

        check_required(&tool.id, &format!("{path}.id"), "tool id", issues);
        check_ident(&tool.id, &format!("{path}.id"), issues);
        check_required(&tool.name, &format!("{path}.name"), "tool name", issues);

        if tool.description.trim().is_empty() {
            issues.push(
                Issue::warning(
                    codes::MISSING_DESCRIPTION,
                    format!("{path}.description"),
                    "tool has no description",
                )
                .with_suggestion("describe what the tool does so the engine can pick it"),
            );
        }

        for (input_idx, input) in tool.inputs.iter().enumerate() {
            let input_path = format!("{path}.inputs[{input_idx}]");
            check_required(&input.name, &format!("{input_path}.name"), "input name", issues);
            check_data_type(&input.data_type, &format!("{input_path}.type"), issues);
        }

        check_data_type(&tool.output.data_type, &format!("{path}.output.type"), issues);
        if tool.output.description.trim().is_empty() {
            issues.push(
                Issue::warning(
                    codes::MISSING_DESCRIPTION,
                    format!("{path}.output.description"),
                    "tool output has no description",
                )
                .with_suggestion("describe the output so responses can be grounded in it"),
            );
        }

        check_enum::<ToolPolicyAllowed>(
            &tool.policy.allowed,
            &format!("{path}.policy.allowed"),
            issues,
        );
        check_enum::<MockMode>(&tool.mock.mode, &format!("{path}.mock.mode"), issues);
        check_enum::<MockStatus>(&tool.mock.status, &format!("{path}.mock.status"), issues);
    }
}

fn check_policy(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, workflow) in skill.policy.workflows.iter().enumerate() {
        let path = format!("policy.workflows[{idx}]");
        check_required(&workflow.id, &format!("{path}.id"), "workflow id", issues);
        check_ident(&workflow.id, &format!("{path}.id"), issues);

        for (step_idx, step) in workflow.steps.iter().enumerate() {
            if step.trim().is_empty() {
                issues.push(Issue::error(
                    codes::MISSING_FIELD,
                    format!("{path}.steps[{step_idx}]"),
                    "workflow step must name a tool, system tool, or workflow",
                ));
            }
        }
    }

    for (idx, approval) in skill.policy.approvals.iter().enumerate() {
        check_required(
            &approval.tool_id,
            &format!("policy.approvals[{idx}].tool_id"),
            "approval tool_id",
            issues,
        );
    }
}

fn check_engine(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    if let Some(t) = skill.engine.temperature {
        if !(0.0..=2.0).contains(&t) {
            issues.push(Issue::error(
                codes::OUT_OF_RANGE,
                "engine.temperature",
                format!("temperature {t} must be between 0.0 and 2.0"),
            ));
        }
    }
    if let Some(iters) = skill.engine.max_iterations {
        if iters < 1 {
            issues.push(Issue::error(
                codes::OUT_OF_RANGE,
                "engine.max_iterations",
                "max_iterations must be at least 1",
            ));
        }
    }

    check_enum::<AutonomyLevel>(&skill.engine.autonomy, "engine.autonomy", issues);
    check_enum::<OnMaxIterations>(
        &skill.engine.on_max_iterations,
        "engine.on_max_iterations",
        issues,
    );
    check_enum::<CriticStrictness>(
        &skill.engine.critic.strictness,
        "engine.critic.strictness",
        issues,
    );
    check_enum::<WorkflowDeviation>(
        &skill.engine.workflow_deviation,
        "engine.workflow_deviation",
        issues,
    );
}

fn check_triggers(skill: &SkillDoc, issues: &mut Vec<Issue>) {
    for (idx, trigger) in skill.triggers.iter().enumerate() {
        let path = format!("triggers[{idx}]");
        check_required(&trigger.id, &format!("{path}.id"), "trigger id", issues);
        check_ident(&trigger.id, &format!("{path}.id"), issues);
        check_enum::<TriggerType>(&trigger.trigger_type, &format!("{path}.type"), issues);

        match trigger.trigger_type.parse::<TriggerType>() {
            Ok(TriggerType::Schedule) => check_schedule_trigger(trigger, &path, issues),
            Ok(TriggerType::Event) => check_event_trigger(trigger, &path, issues),
            Err(_) => {} // already reported above
        }
    }
}

fn check_schedule_trigger(trigger: &Trigger, path: &str, issues: &mut Vec<Issue>) {
    let every = trigger.schedule.as_ref().map(|s| s.every.as_str()).unwrap_or("");
    // "P" or "PT" alone pass the regex but carry no component
    let well_formed = ISO_DURATION_RE.is_match(every) && every.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        issues.push(
            Issue::error(
                codes::INVALID_TRIGGER_SCHEDULE,
                format!("{path}.schedule.every"),
                format!("'{every}' is not an ISO-8601 duration"),
            )
            .with_suggestion("use a duration like PT6H, PT30M, or P1D"),
        );
    }
}

fn check_event_trigger(trigger: &Trigger, path: &str, issues: &mut Vec<Issue>) {
    let Some(event) = trigger.event.as_ref() else {
        issues.push(Issue::error(
            codes::INVALID_TRIGGER_EVENT,
            format!("{path}.event"),
            "event triggers require an event block",
        ));
        return;
    };

    if event.name.trim().is_empty() {
        issues.push(Issue::error(
            codes::INVALID_TRIGGER_EVENT,
            format!("{path}.event.name"),
            "event triggers require an event name",
        ));
    }
    if let Some(filter) = &event.filter {
        if !filter.is_object() {
            issues.push(Issue::error(
                codes::INVALID_TRIGGER_EVENT,
                format!("{path}.event.filter"),
                "event filter must be an object",
            ));
        }
    }
}
