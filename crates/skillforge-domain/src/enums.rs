//! Closed enum domains for skill and solution documents.
//!
//! Documents keep enum-valued fields as plain strings so that drafts with
//! bad values still decode; validators parse those strings here and turn a
//! failed parse into an issue carrying the allowed-value list.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A value outside its closed enum domain, with the allowed set attached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value '{value}', allowed: {}", .allowed.join(", "))]
pub struct InvalidEnum {
    /// The offending value
    pub value: String,
    /// The closed domain it was checked against
    pub allowed: &'static [&'static str],
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )+
        }

        impl $name {
            /// Allowed string values, in declaration order
            pub const VARIANTS: &'static [&'static str] = &[$($text),+];

            /// Canonical string form
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(InvalidEnum {
                        value: s.to_string(),
                        allowed: Self::VARIANTS,
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Lifecycle stage of a skill draft
    SkillPhase {
        Discovery => "discovery",
        Problem => "problem",
        Scenarios => "scenarios",
        Role => "role",
        Intents => "intents",
        Tools => "tools",
        Policy => "policy",
        Testing => "testing",
        Review => "review",
        Live => "live",
    }
}

string_enum! {
    /// JSON-ish data type of a tool input or output
    DataType {
        String => "string",
        Number => "number",
        Boolean => "boolean",
        Object => "object",
        Array => "array",
    }
}

impl DataType {
    /// Parse accepting `text` as a legacy alias of `string`
    pub fn parse_with_aliases(s: &str) -> Result<Self, InvalidEnum> {
        if s == "text" {
            return Ok(Self::String);
        }
        s.parse()
    }
}

string_enum! {
    /// Communication tone of the agent persona
    Tone {
        Formal => "formal",
        Professional => "professional",
        Friendly => "friendly",
        Casual => "casual",
        Playful => "playful",
    }
}

string_enum! {
    /// How verbose agent replies should be
    Verbosity {
        Concise => "concise",
        Balanced => "balanced",
        Detailed => "detailed",
    }
}

string_enum! {
    /// When a tool may be invoked
    ToolPolicyAllowed {
        Always => "always",
        WithApproval => "with_approval",
        Never => "never",
    }
}

string_enum! {
    /// How mock responses are produced
    MockMode {
        Static => "static",
        Replay => "replay",
        Generated => "generated",
    }
}

string_enum! {
    /// Whether a tool mock has been exercised
    MockStatus {
        Untested => "untested",
        Passed => "passed",
        Failed => "failed",
    }
}

string_enum! {
    /// What fires an automation trigger
    TriggerType {
        Schedule => "schedule",
        Event => "event",
    }
}

string_enum! {
    /// How independently the engine may act
    AutonomyLevel {
        Manual => "manual",
        Supervised => "supervised",
        Autonomous => "autonomous",
    }
}

string_enum! {
    /// What the engine does when the iteration cap is hit
    OnMaxIterations {
        Stop => "stop",
        Summarize => "summarize",
        Escalate => "escalate",
    }
}

string_enum! {
    /// How harshly the critic pass judges engine output
    CriticStrictness {
        Lenient => "lenient",
        Standard => "standard",
        Strict => "strict",
    }
}

string_enum! {
    /// Reaction when the engine leaves a declared workflow
    WorkflowDeviation {
        Allow => "allow",
        Warn => "warn",
        Block => "block",
    }
}

string_enum! {
    /// Effect of an access-policy rule
    AccessEffect {
        Allow => "allow",
        Deny => "deny",
        Constrain => "constrain",
    }
}

string_enum! {
    /// Security classification of a tool
    SecurityClassification {
        Public => "public",
        Internal => "internal",
        PiiRead => "pii_read",
        PiiWrite => "pii_write",
        Financial => "financial",
        Destructive => "destructive",
    }
}

impl SecurityClassification {
    /// Classifications that mandate explicit access-policy coverage
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Self::PiiWrite | Self::Financial | Self::Destructive)
    }

    /// Classifications that touch personally identifying data
    pub fn is_pii(&self) -> bool {
        matches!(self, Self::PiiRead | Self::PiiWrite)
    }
}

string_enum! {
    /// Declared blast radius of a tool
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    /// Role a skill plays inside a solution
    SkillRole {
        Gateway => "gateway",
        Worker => "worker",
        Orchestrator => "orchestrator",
        Approval => "approval",
    }
}

/// System-tool prefixes that resolve without a tool definition
pub const SYSTEM_TOOL_PREFIXES: &[&str] = &["sys.", "ui.", "cp."];

/// True when a reference names a platform-provided capability.
///
/// Matching is a case-insensitive prefix check, so `SYS.emitUserMessage`
/// resolves the same way `sys.emitUserMessage` does.
pub fn is_system_tool(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    SYSTEM_TOOL_PREFIXES.iter().any(|p| lower.starts_with(p))
}
