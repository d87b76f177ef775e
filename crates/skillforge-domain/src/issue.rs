//! Validation issues, severity partitioning, and the report contract

use serde::Serialize;

/// Stable machine-readable issue codes.
///
/// Consumers (builder UIs, CI tooling) match on these constants rather than
/// on message text, so the strings here are part of the public contract.
pub mod codes {
    /// A section or element has an unexpected JSON shape
    pub const INVALID_TYPE: &str = "INVALID_TYPE";
    /// A required scalar field is missing or empty
    pub const MISSING_FIELD: &str = "MISSING_FIELD";
    /// An identifier does not match the identifier grammar
    pub const INVALID_ID: &str = "INVALID_ID";
    /// A value is outside its closed enum domain
    pub const INVALID_ENUM: &str = "INVALID_ENUM";
    /// A value is outside its numeric range
    pub const OUT_OF_RANGE: &str = "OUT_OF_RANGE";
    /// A recommended description is absent
    pub const MISSING_DESCRIPTION: &str = "MISSING_DESCRIPTION";
    /// A schedule trigger's `every` is not an ISO-8601 duration
    pub const INVALID_TRIGGER_SCHEDULE: &str = "INVALID_TRIGGER_SCHEDULE";
    /// An event trigger is missing its event name or has a non-object filter
    pub const INVALID_TRIGGER_EVENT: &str = "INVALID_TRIGGER_EVENT";

    /// A workflow step references no known tool, system tool, or workflow
    pub const TOOL_NOT_FOUND: &str = "TOOL_NOT_FOUND";
    /// An intent's `maps_to_workflow` references no known workflow
    pub const WORKFLOW_NOT_FOUND: &str = "WORKFLOW_NOT_FOUND";
    /// An approval rule's `tool_id` references no known tool
    pub const APPROVAL_TOOL_NOT_FOUND: &str = "APPROVAL_TOOL_NOT_FOUND";
    /// Two tools share an id
    pub const DUPLICATE_TOOL_ID: &str = "DUPLICATE_TOOL_ID";
    /// Two tools share a name (case-insensitive)
    pub const DUPLICATE_TOOL_NAME: &str = "DUPLICATE_TOOL_NAME";
    /// Two workflows share an id
    pub const DUPLICATE_WORKFLOW_ID: &str = "DUPLICATE_WORKFLOW_ID";
    /// Two intents share an id
    pub const DUPLICATE_INTENT_ID: &str = "DUPLICATE_INTENT_ID";
    /// Two scenarios share an id
    pub const DUPLICATE_SCENARIO_ID: &str = "DUPLICATE_SCENARIO_ID";
    /// An intent has no workflow, trigger, or keyword-matching tool
    pub const INTENT_NO_TOOLS: &str = "INTENT_NO_TOOLS";
    /// The workflow reference graph contains a cycle
    pub const WORKFLOW_CIRCULAR: &str = "WORKFLOW_CIRCULAR";

    /// A tool carries no security classification
    pub const TOOL_UNCLASSIFIED: &str = "TOOL_UNCLASSIFIED";
    /// A tool's security classification is not in the enum
    pub const INVALID_CLASSIFICATION: &str = "INVALID_CLASSIFICATION";
    /// A tool's risk level is not in the enum
    pub const INVALID_RISK_LEVEL: &str = "INVALID_RISK_LEVEL";
    /// A high-risk tool is not covered by any access-policy rule
    pub const HIGH_RISK_NO_POLICY: &str = "HIGH_RISK_NO_POLICY";
    /// A PII tool has neither response filters nor policy coverage
    pub const PII_NO_FILTER: &str = "PII_NO_FILTER";
    /// A tool declares a data owner field nothing constrains
    pub const DATA_OWNER_NO_CONSTRAIN: &str = "DATA_OWNER_NO_CONSTRAIN";
    /// A grant mapping references no known tool
    pub const GRANT_TOOL_NOT_FOUND: &str = "GRANT_TOOL_NOT_FOUND";
    /// An access-policy rule references no known tool
    pub const POLICY_TOOL_NOT_FOUND: &str = "POLICY_TOOL_NOT_FOUND";
    /// An access-policy rule's effect is not allow/deny/constrain
    pub const INVALID_POLICY_EFFECT: &str = "INVALID_POLICY_EFFECT";
    /// A response-filter field path does not parse
    pub const INVALID_FILTER_PATH: &str = "INVALID_FILTER_PATH";

    /// The solution declares no actor types
    pub const NO_ACTOR_TYPES: &str = "NO_ACTOR_TYPES";
    /// The solution declares actor types but no admin roles
    pub const NO_ADMIN_ROLES: &str = "NO_ADMIN_ROLES";
    /// The default actor type is not among declared actor types
    pub const UNKNOWN_DEFAULT_ACTOR: &str = "UNKNOWN_DEFAULT_ACTOR";
    /// An admin role is not among declared actor types
    pub const UNKNOWN_ADMIN_ROLE: &str = "UNKNOWN_ADMIN_ROLE";
    /// A grant issuer is not a skill in the solution
    pub const GRANT_ISSUER_UNKNOWN: &str = "GRANT_ISSUER_UNKNOWN";
    /// A grant consumer is not a skill in the solution
    pub const GRANT_CONSUMER_UNKNOWN: &str = "GRANT_CONSUMER_UNKNOWN";
    /// A grant has consumers but no issuer
    pub const GRANT_NO_ISSUER: &str = "GRANT_NO_ISSUER";
    /// A handoff endpoint is not a skill in the solution
    pub const HANDOFF_SKILL_UNKNOWN: &str = "HANDOFF_SKILL_UNKNOWN";
    /// A security contract names an unknown consumer or provider
    pub const CONTRACT_SKILL_UNKNOWN: &str = "CONTRACT_SKILL_UNKNOWN";
    /// No handoff path connects a contract's provider to its consumer
    pub const CONTRACT_NO_PATH: &str = "CONTRACT_NO_PATH";
    /// A handoff on the provider-consumer path drops a required grant
    pub const CONTRACT_GRANT_NOT_PASSED: &str = "CONTRACT_GRANT_NOT_PASSED";
    /// A declared entry channel has no routing entry
    pub const CHANNEL_NOT_ROUTED: &str = "CHANNEL_NOT_ROUTED";
    /// A routing entry targets an unknown skill
    pub const ROUTING_TARGET_UNKNOWN: &str = "ROUTING_TARGET_UNKNOWN";
    /// A handoff mechanism is not a declared platform connector
    pub const HANDOFF_MECHANISM_UNDECLARED: &str = "HANDOFF_MECHANISM_UNDECLARED";
    /// A skill is reachable neither by routing nor by handoff
    pub const SKILL_UNREACHABLE: &str = "SKILL_UNREACHABLE";
    /// The handoff graph contains a cycle
    pub const HANDOFF_CIRCULAR: &str = "HANDOFF_CIRCULAR";

    /// An mcp_bridge tool binds to an undeclared connector
    pub const CONNECTOR_NOT_FOUND: &str = "CONNECTOR_NOT_FOUND";
    /// A stdio connector has no source code in the store
    pub const CONNECTOR_SOURCE_MISSING: &str = "CONNECTOR_SOURCE_MISSING";
    /// Connector source imports a module no manifest declares
    pub const CONNECTOR_DEP_MISSING: &str = "CONNECTOR_DEP_MISSING";
    /// Connector launch args use the retired filesystem layout
    pub const CONNECTOR_DEPRECATED_PATH: &str = "CONNECTOR_DEPRECATED_PATH";
    /// Connector script path disagrees with the connector id
    pub const CONNECTOR_PATH_MISMATCH: &str = "CONNECTOR_PATH_MISMATCH";
    /// A UI-capable connector does not use stdio transport
    pub const UI_TRANSPORT_NOT_STDIO: &str = "UI_TRANSPORT_NOT_STDIO";
    /// A UI-capable connector is missing a required ui.* tool
    pub const UI_TOOL_MISSING: &str = "UI_TOOL_MISSING";
    /// A UI tool appears to return a bare array instead of a wrapper object
    pub const UI_RESPONSE_SHAPE: &str = "UI_RESPONSE_SHAPE";
    /// A UI-capable connector references no asset directory
    pub const UI_ASSETS_MISSING: &str = "UI_ASSETS_MISSING";
}

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before the document is valid
    Error,
    /// Should be fixed; never blocks validity
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Stable machine-readable identifier from [`codes`]
    pub code: &'static str,
    /// Error or warning
    pub severity: Severity,
    /// Dotted/bracketed location in the document (`tools[2].security`)
    pub path: String,
    /// Human-readable description
    pub message: String,
    /// Optional remediation hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    /// Create an error-severity issue
    pub fn error(code: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Create a warning-severity issue
    pub fn warning(
        code: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach a remediation hint
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether this issue blocks validity
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} [{}] at {}: {}",
            self.severity, self.code, self.path, self.message
        )
    }
}

/// Dangling references collected during resolution, deduplicated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnresolvedRefs {
    /// Step / approval references that match no tool
    pub tools: Vec<String>,
    /// Intent targets that match no workflow
    pub workflows: Vec<String>,
    /// Intents with nothing visibly fulfilling them
    pub intents: Vec<String>,
}

impl UnresolvedRefs {
    /// Record an unresolved tool reference (idempotent)
    pub fn add_tool(&mut self, name: &str) {
        if !self.tools.iter().any(|t| t == name) {
            self.tools.push(name.to_string());
        }
    }

    /// Record an unresolved workflow reference (idempotent)
    pub fn add_workflow(&mut self, name: &str) {
        if !self.workflows.iter().any(|w| w == name) {
            self.workflows.push(name.to_string());
        }
    }

    /// Record an unfulfilled intent (idempotent)
    pub fn add_intent(&mut self, name: &str) {
        if !self.intents.iter().any(|i| i == name) {
            self.intents.push(name.to_string());
        }
    }

    /// True when no reference of any kind is dangling
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.workflows.is_empty() && self.intents.is_empty()
    }

    /// True when a reference that blocks export is dangling.
    ///
    /// Unfulfilled intents warn but do not gate export; dangling tool and
    /// workflow references do.
    pub fn blocks_export(&self) -> bool {
        !self.tools.is_empty() || !self.workflows.is_empty()
    }
}

/// Per-section completion flags.
///
/// The canonical section list is the ten fields below; `engine` is always
/// complete because engine defaults always apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completeness {
    /// Problem statement is meaningfully filled
    pub problem: bool,
    /// At least one titled scenario exists
    pub scenarios: bool,
    /// Role has a name and a persona
    pub role: bool,
    /// At least one described intent with an example exists
    pub intents: bool,
    /// At least one fully described tool exists
    pub tools: bool,
    /// At least one guardrail exists
    pub policy: bool,
    /// Always true; engine defaults always apply
    pub engine: bool,
    /// Every tool mock has been exercised. False with zero tools,
    /// deliberately asymmetric with `security`.
    pub mocks_tested: bool,
    /// Display name and sender e-mail are present
    pub identity: bool,
    /// Every high-risk tool is covered by an access-policy rule.
    /// Vacuously true with zero tools.
    pub security: bool,
}

impl Completeness {
    /// Number of sections tracked by the canonical list
    pub const SECTION_COUNT: usize = 10;

    /// Count of sections currently complete
    pub fn complete_sections(&self) -> usize {
        [
            self.problem,
            self.scenarios,
            self.role,
            self.intents,
            self.tools,
            self.policy,
            self.engine,
            self.mocks_tested,
            self.identity,
            self.security,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }

    /// Rounded percentage of complete sections
    pub fn overall_progress(&self) -> u8 {
        let pct = self.complete_sections() as f64 / Self::SECTION_COUNT as f64 * 100.0;
        pct.round() as u8
    }
}

/// The result of one full pipeline run over a skill document
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// True iff no error-severity issue was produced
    pub valid: bool,
    /// The terminal export gate; never inferred from `valid` alone
    pub ready_to_export: bool,
    /// All error-severity issues, in stage order
    pub errors: Vec<Issue>,
    /// All warning-severity issues, in stage order
    pub warnings: Vec<Issue>,
    /// Dangling references found during resolution
    pub unresolved: UnresolvedRefs,
    /// Per-section completion flags
    pub completeness: Completeness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_builders() {
        let err = Issue::error(codes::MISSING_FIELD, "problem.statement", "statement required");
        assert_eq!(err.severity, Severity::Error);
        assert!(err.is_error());
        assert!(err.suggestion.is_none());

        let warn = Issue::warning(codes::TOOL_NOT_FOUND, "policy.workflows[0].steps[1]", "no such tool")
            .with_suggestion("define the tool or use a sys.* step");
        assert_eq!(warn.severity, Severity::Warning);
        assert!(!warn.is_error());
        assert!(warn.suggestion.is_some());
    }

    #[test]
    fn test_issue_serializes_without_empty_suggestion() {
        let err = Issue::error(codes::INVALID_ENUM, "phase", "bad phase");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_ENUM");
        assert_eq!(json["severity"], "error");
        assert!(json.get("suggestion").is_none());
    }

    #[test]
    fn test_unresolved_refs_deduplicate() {
        let mut refs = UnresolvedRefs::default();
        refs.add_tool("lookup_order");
        refs.add_tool("lookup_order");
        refs.add_workflow("wf_refund");
        assert_eq!(refs.tools.len(), 1);
        assert_eq!(refs.workflows.len(), 1);
        assert!(!refs.is_empty());
        assert!(refs.blocks_export());
    }

    #[test]
    fn test_unresolved_intents_do_not_block_export() {
        let mut refs = UnresolvedRefs::default();
        refs.add_intent("track_order");
        assert!(!refs.is_empty());
        assert!(!refs.blocks_export());
    }

    #[test]
    fn test_completeness_progress() {
        let all = Completeness {
            problem: true,
            scenarios: true,
            role: true,
            intents: true,
            tools: true,
            policy: true,
            engine: true,
            mocks_tested: true,
            identity: true,
            security: true,
        };
        assert_eq!(all.complete_sections(), 10);
        assert_eq!(all.overall_progress(), 100);

        let half = Completeness {
            problem: true,
            scenarios: false,
            role: true,
            intents: false,
            tools: true,
            policy: false,
            engine: true,
            mocks_tested: false,
            identity: true,
            security: false,
        };
        assert_eq!(half.overall_progress(), 50);
    }
}
