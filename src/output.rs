//! Hook decisions and their JSON rendering
//!
//! Produces the `PreToolUse` response format Claude Code expects on stdout.

use serde::Serialize;

const TAG: &str = "[bash-block]";

/// Response written to stdout
#[derive(Debug, Serialize)]
pub struct HookOutput {
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,

    /// Message shown to the user
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// Permission decision for the pending tool call
#[derive(Debug, Serialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,

    /// Always "deny"; allowing is signalled by omitting this object
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,

    /// Shown to the model so it can adjust its next attempt
    #[serde(rename = "permissionDecisionReason")]
    pub permission_decision_reason: String,
}

/// Verdict for one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the command run
    Allow { reason: String },

    /// Block the command
    Deny { issues: Vec<String> },

    /// Would have blocked, but running in dry-run mode
    Warn { issues: Vec<String> },
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Decision::Allow {
            reason: reason.into(),
        }
    }

    pub fn deny(issues: Vec<String>) -> Self {
        Decision::Deny { issues }
    }

    pub fn warn(issues: Vec<String>) -> Self {
        Decision::Warn { issues }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }

    pub fn is_warn(&self) -> bool {
        matches!(self, Decision::Warn { .. })
    }

    /// Issues behind a deny or warning; empty for allow
    pub fn issues(&self) -> &[String] {
        match self {
            Decision::Allow { .. } => &[],
            Decision::Deny { issues } | Decision::Warn { issues } => issues,
        }
    }

    /// One-line explanation
    pub fn reason(&self) -> String {
        match self {
            Decision::Allow { reason } => reason.clone(),
            Decision::Deny { issues } | Decision::Warn { issues } => issues.join("; "),
        }
    }

    /// Downgrade a deny to a warning (dry-run mode)
    pub fn into_warning(self) -> Self {
        match self {
            Decision::Deny { issues } => Decision::Warn { issues },
            other => other,
        }
    }
}

impl HookOutput {
    /// Empty output: the tool call proceeds
    pub fn allow() -> Self {
        HookOutput {
            hook_specific_output: None,
            system_message: None,
        }
    }

    pub fn deny(reason: &str) -> Self {
        HookOutput {
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: "deny".to_string(),
                permission_decision_reason: reason.to_string(),
            }),
            system_message: Some(format!("{} Blocked: {}", TAG, reason)),
        }
    }

    /// Allows the call but tells the user what would have been blocked
    pub fn warn(message: &str) -> Self {
        HookOutput {
            hook_specific_output: None,
            system_message: Some(format!("{} Dry run, would block: {}", TAG, message)),
        }
    }

    pub fn from_decision(decision: &Decision) -> Self {
        match decision {
            Decision::Allow { .. } => HookOutput::allow(),
            Decision::Deny { .. } => HookOutput::deny(&decision.reason()),
            Decision::Warn { .. } => HookOutput::warn(&decision.reason()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
