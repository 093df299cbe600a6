//! Input parsing for Claude Code hook JSON
//!
//! Only shell tool calls carry a command; every other tool passes through.

use serde::Deserialize;

/// Tool names whose input is a shell command
const SHELL_TOOLS: &[&str] = &["Bash"];

/// Longest command kept in log summaries, in characters
const SUMMARY_LEN: usize = 100;

/// Payload Claude Code writes to the hook's stdin
#[derive(Debug, Deserialize)]
pub struct HookInput {
    /// Name of the tool being invoked (e.g. "Bash", "Read")
    pub tool_name: String,

    pub tool_input: ToolInput,

    #[serde(default)]
    pub session_id: Option<String>,

    /// Usually "PreToolUse"
    #[serde(default)]
    pub hook_event_name: Option<String>,
}

/// Tool-specific parameters
#[derive(Debug, Clone)]
pub enum ToolInput {
    /// Shell command execution
    Command {
        command: String,
        description: Option<String>,
    },

    /// Anything else, kept verbatim
    Other {
        #[allow(dead_code)]
        raw: serde_json::Value,
    },
}

impl<'de> Deserialize<'de> for ToolInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        if let Some(command) = value.get("command").and_then(|v| v.as_str()) {
            return Ok(ToolInput::Command {
                command: command.to_string(),
                description: value
                    .get("description")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            });
        }

        Ok(ToolInput::Other { raw: value })
    }
}

impl HookInput {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the tool runs shell commands
    pub fn is_shell_tool(&self) -> bool {
        SHELL_TOOLS.contains(&self.tool_name.as_str())
    }

    /// The shell command to check, if this is a shell tool call with a
    /// string `command`
    pub fn command(&self) -> Option<&str> {
        if !self.is_shell_tool() {
            return None;
        }
        match &self.tool_input {
            ToolInput::Command { command, .. } => Some(command.as_str()),
            ToolInput::Other { .. } => None,
        }
    }

    /// The caller's description of the command, if given
    pub fn description(&self) -> Option<&str> {
        match &self.tool_input {
            ToolInput::Command { description, .. } => description.as_deref(),
            ToolInput::Other { .. } => None,
        }
    }

    /// Short description for the audit log
    pub fn summary(&self) -> String {
        match &self.tool_input {
            ToolInput::Command { command, .. } => {
                let truncated = if command.chars().count() > SUMMARY_LEN {
                    let head: String = command.chars().take(SUMMARY_LEN).collect();
                    format!("{}...", head)
                } else {
                    command.clone()
                };
                format!("{}: {}", self.tool_name, truncated)
            }
            ToolInput::Other { .. } => format!("{}: (no command)", self.tool_name),
        }
    }
}
