//! Typed model of a skill document.
//!
//! Every container is `#[serde(default)]` so a sparse draft decodes without
//! error; enum-valued fields stay plain strings and are parsed against the
//! closed domains in [`crate::enums`] during validation, not during decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declarative agent definition: tools, intents, policies, engine config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillDoc {
    /// Unique skill identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Lifecycle stage, one of [`crate::enums::SkillPhase`]
    pub phase: String,
    /// What the skill exists to solve
    pub problem: Problem,
    /// Concrete situations the skill should handle
    pub scenarios: Vec<Scenario>,
    /// Persona and communication style
    pub role: Role,
    /// Supported intents and confidence policy
    pub intents: Intents,
    /// Tools the agent may invoke
    pub tools: Vec<Tool>,
    /// Guardrails, workflows, and approval rules
    pub policy: Policy,
    /// Engine/runtime configuration
    pub engine: Engine,
    /// Outward-facing identity
    pub identity: Identity,
    /// Grant-to-tool-field mappings
    pub grant_mappings: Vec<GrantMapping>,
    /// Access-policy rules over tools
    pub access_policy: AccessPolicy,
    /// Response field stripping/masking
    pub response_filters: Vec<ResponseFilter>,
    /// Schedule/event automations
    pub triggers: Vec<Trigger>,
}

/// Problem framing for a skill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    /// What problem the skill solves
    pub statement: String,
    /// Background the agent should know
    pub context: String,
    /// Outcomes the skill aims for
    pub goals: Vec<String>,
}

/// A concrete situation the skill should handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Unique scenario identifier
    pub id: String,
    /// Short scenario title
    pub title: String,
    /// Expected interaction steps
    pub steps: Vec<String>,
}

/// Agent persona definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    /// Role name (e.g. "Order Support Agent")
    pub name: String,
    /// Persona description the engine is primed with
    pub persona: String,
    /// Tone and verbosity settings
    pub communication: Communication,
}

/// Communication style settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Communication {
    /// One of [`crate::enums::Tone`]
    pub tone: String,
    /// One of [`crate::enums::Verbosity`]
    pub verbosity: String,
}

/// Intent block: supported intents plus confidence policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intents {
    /// Intents the skill understands
    pub supported: Vec<Intent>,
    /// Confidence thresholds for acting vs. clarifying
    pub thresholds: Thresholds,
    /// What to do with out-of-domain requests
    pub out_of_domain: OutOfDomain,
}

/// A single supported intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    /// Unique intent identifier
    pub id: String,
    /// What the user wants when this intent fires
    pub description: String,
    /// Example utterances
    pub examples: Vec<String>,
    /// Workflow that fulfills this intent, if any
    pub maps_to_workflow: Option<String>,
    /// Entities to extract from the utterance
    pub entities: Vec<String>,
}

/// Confidence thresholds, each in `0.0..=1.0`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this, confirm before acting
    pub confirm: Option<f64>,
    /// Below this, ask a clarifying question
    pub clarify: Option<f64>,
}

/// Policy for requests outside the supported intents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutOfDomain {
    /// Action keyword (e.g. "decline", "redirect")
    pub action: String,
    /// Message shown to the user
    pub message: String,
}

/// A tool the agent may invoke
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool {
    /// Unique tool identifier
    pub id: String,
    /// Human-readable tool name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Input parameter specs
    pub inputs: Vec<ToolInput>,
    /// Output spec
    pub output: ToolOutput,
    /// Where the tool is implemented
    pub source: ToolSource,
    /// Invocation policy
    pub policy: ToolPolicy,
    /// Mock configuration for testing
    pub mock: ToolMock,
    /// Security classification and risk
    pub security: ToolSecurity,
    /// Field in the tool's output naming the data owner
    pub data_owner_field: Option<String>,
}

/// One input parameter of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolInput {
    /// Parameter name
    pub name: String,
    /// One of [`crate::enums::DataType`] (`text` accepted as alias)
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether the parameter is mandatory
    pub required: bool,
    /// What the parameter means
    pub description: String,
}

/// Output spec of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOutput {
    /// One of [`crate::enums::DataType`]
    #[serde(rename = "type")]
    pub data_type: String,
    /// What the output contains
    pub description: String,
}

/// Binding of a tool to its implementation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSource {
    /// Source kind (e.g. "mcp_bridge", "http", "builtin")
    pub kind: String,
    /// Connector id for bridged tools
    pub connection_id: Option<String>,
}

/// Invocation policy of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPolicy {
    /// One of [`crate::enums::ToolPolicyAllowed`]
    pub allowed: String,
}

/// Mock configuration of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolMock {
    /// One of [`crate::enums::MockMode`]
    pub mode: String,
    /// One of [`crate::enums::MockStatus`]
    pub status: String,
    /// Canned responses, shape is mock-mode specific
    pub responses: Value,
}

/// Security metadata of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSecurity {
    /// One of [`crate::enums::SecurityClassification`]
    pub classification: Option<String>,
    /// One of [`crate::enums::RiskLevel`]
    pub risk_level: Option<String>,
}

/// Guardrails, workflows, and approval rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Hard behavioral rules
    pub guardrails: Guardrails,
    /// Declared step sequences
    pub workflows: Vec<Workflow>,
    /// Tool invocations requiring human approval
    pub approvals: Vec<ApprovalRule>,
}

/// Hard behavioral rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guardrails {
    /// Things the agent must never do
    pub never: Vec<String>,
    /// Things the agent must always do
    pub always: Vec<String>,
}

/// A named ordered sequence of tool-name steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    /// Unique workflow identifier
    pub id: String,
    /// What the workflow accomplishes
    pub description: String,
    /// Intent id or phrase that starts the workflow
    pub trigger: Option<String>,
    /// Tool references, system tools, or sub-workflow ids
    pub steps: Vec<String>,
}

/// Binds a tool to approval conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalRule {
    /// Tool that needs approval
    pub tool_id: String,
    /// Conditions under which approval is required
    pub conditions: Value,
    /// Who may approve
    pub approver_role: Option<String>,
}

/// Engine/runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engine {
    /// Model identifier
    pub model: String,
    /// Sampling temperature, `0.0..=2.0`
    pub temperature: Option<f64>,
    /// Iteration cap per turn, at least 1
    pub max_iterations: Option<u32>,
    /// One of [`crate::enums::AutonomyLevel`]
    pub autonomy: String,
    /// One of [`crate::enums::OnMaxIterations`]
    pub on_max_iterations: String,
    /// Output critic configuration
    pub critic: Critic,
    /// One of [`crate::enums::WorkflowDeviation`]
    pub workflow_deviation: String,
    /// Internal error recovery configuration
    pub error_recovery: ErrorRecovery,
}

/// Output critic configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Critic {
    /// Whether the critic pass runs
    pub enabled: bool,
    /// One of [`crate::enums::CriticStrictness`]
    pub strictness: String,
}

/// Internal error recovery configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorRecovery {
    /// Retries before giving up on a failing tool
    pub max_retries: Option<u32>,
    /// Message shown when recovery fails
    pub fallback_message: String,
}

/// Outward-facing identity of the skill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// Name shown to end users
    pub display_name: String,
    /// Sender address for outbound mail
    pub from_email: String,
    /// Signature appended to outbound mail
    pub signature: String,
}

/// Maps a grant's value onto a tool input field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantMapping {
    /// Grant key
    pub grant: String,
    /// Tool the grant constrains
    pub tool: String,
    /// Input field the grant value is bound to
    pub field: String,
}

/// Access-policy rules over tools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    /// Rules, evaluated as a set (no precedence here)
    pub rules: Vec<AccessRule>,
}

/// A single access-policy rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRule {
    /// Tool names, or the wildcard `*`
    pub tools: Vec<String>,
    /// One of [`crate::enums::AccessEffect`]
    pub effect: String,
    /// Constraint expression for `constrain` rules
    pub condition: Option<Value>,
}

/// Strips or masks fields from tool responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFilter {
    /// Tool the filter applies to, or all tools when absent
    pub tool: Option<String>,
    /// Field paths removed from responses
    pub strip_fields: Vec<String>,
    /// Field paths masked in responses
    pub mask_fields: Vec<String>,
}

/// A schedule or event automation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    /// Unique trigger identifier
    pub id: String,
    /// One of [`crate::enums::TriggerType`]
    #[serde(rename = "type")]
    pub trigger_type: String,
    /// Present for schedule triggers
    pub schedule: Option<Schedule>,
    /// Present for event triggers
    pub event: Option<EventTrigger>,
    /// Workflow started when the trigger fires
    pub workflow: Option<String>,
}

/// Recurrence of a schedule trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// ISO-8601 duration, e.g. `PT6H` or `P1D`
    pub every: String,
}

/// Subscription of an event trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTrigger {
    /// Event name to subscribe to
    pub name: String,
    /// Object-valued event filter
    pub filter: Option<Value>,
}

impl SkillDoc {
    /// Find a tool by exact id
    pub fn tool_by_id(&self, id: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Find a workflow by exact id
    pub fn workflow_by_id(&self, id: &str) -> Option<&Workflow> {
        self.policy.workflows.iter().find(|w| w.id == id)
    }
}
