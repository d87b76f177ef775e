//! Typed model of a solution document and the optional validation context.
//!
//! A solution composes multiple skills with shared identity, grants,
//! handoffs, and routing. Like the skill model, containers are
//! `#[serde(default)]` and enum-valued fields stay strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::skill::SkillDoc;

/// A composition of skills with shared identity, grants, and routing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionDoc {
    /// Unique solution identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Actor types and admin roles
    pub identity: SolutionIdentity,
    /// Skills participating in the solution
    pub skills: Vec<SkillRef>,
    /// Verified claims flowing between skills
    pub grants: Vec<Grant>,
    /// Transfers of in-progress interactions
    pub handoffs: Vec<Handoff>,
    /// Channel name → default skill id
    pub routing: BTreeMap<String, String>,
    /// Transport connectors the platform provides
    pub platform_connectors: Vec<String>,
    /// Cross-skill security requirements
    pub security_contracts: Vec<SecurityContract>,
}

/// Shared identity configuration of a solution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionIdentity {
    /// Actor types users can authenticate as
    pub actor_types: Vec<String>,
    /// Actor type assumed when none is specified
    pub default_actor_type: String,
    /// Actor types with administrative rights
    pub admin_roles: Vec<String>,
}

/// A skill's participation in a solution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRef {
    /// Skill id, matching the skill document's `id`
    pub id: String,
    /// One of [`crate::enums::SkillRole`]
    pub role: String,
    /// Channels users reach this skill through
    pub entry_channels: Vec<String>,
    /// Connector ids this skill's tools bind to
    pub connectors: Vec<String>,
}

/// A verified claim that flows from issuing to consuming skills
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grant {
    /// Grant key (e.g. "customer_verified")
    pub key: String,
    /// Skills allowed to issue the grant
    pub issued_by: Vec<String>,
    /// Skills that rely on the grant
    pub consumed_by: Vec<String>,
    /// Tool whose output issues the grant
    pub source_tool: Option<String>,
    /// Output field carrying the grant value
    pub source_field: Option<String>,
    /// Grant lifetime in seconds
    pub ttl_seconds: Option<u64>,
}

/// A defined transfer of an interaction between skills
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Handoff {
    /// Unique handoff identifier
    pub id: String,
    /// Source skill id
    pub from: String,
    /// Target skill id
    pub to: String,
    /// Grants carried across the handoff
    pub grants_passed: Vec<String>,
    /// Grants explicitly dropped at the handoff
    pub grants_dropped: Vec<String>,
    /// Transport mechanism; `internal-message` needs no connector
    pub mechanism: String,
}

/// A cross-skill security requirement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityContract {
    /// Skill whose tools are being protected
    pub consumer: String,
    /// Skill that establishes the required grants
    pub provider: String,
    /// Grants that must survive every hop from provider to consumer
    pub requires_grants: Vec<String>,
    /// Exact values required per grant key
    pub required_values: BTreeMap<String, String>,
    /// Consumer tools the contract applies to
    pub for_tools: Vec<String>,
}

/// Extra context enabling the connector-binding checks.
///
/// Without it the solution validator runs the structural checks only.
#[derive(Debug, Clone, Default)]
pub struct SolutionContext {
    /// Full skill bodies keyed by skill id
    pub skills: BTreeMap<String, SkillDoc>,
    /// Declared connectors
    pub connectors: Vec<ConnectorDecl>,
    /// Connector id → source files backing a stdio connector
    pub mcp_store: BTreeMap<String, Vec<SourceFile>>,
}

/// A declared MCP connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorDecl {
    /// Connector identifier
    pub id: String,
    /// Transport ("stdio", "http", ...)
    pub transport: String,
    /// Launch command for stdio connectors
    pub command: Option<String>,
    /// Launch arguments
    pub args: Vec<String>,
    /// Whether the connector serves builder-UI plugins
    pub ui_capable: bool,
}

/// One source file of a stdio connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFile {
    /// Path relative to the connector root
    pub path: String,
    /// File contents
    pub content: String,
}

impl SolutionDoc {
    /// True when `id` names a skill in this solution
    pub fn has_skill(&self, id: &str) -> bool {
        self.skills.iter().any(|s| s.id == id)
    }
}

impl SolutionContext {
    /// Find a declared connector by id
    pub fn connector(&self, id: &str) -> Option<&ConnectorDecl> {
        self.connectors.iter().find(|c| c.id == id)
    }
}
