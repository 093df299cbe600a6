//! JSONL audit logging for bash-block
//!
//! Appends one JSON object per checked tool call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::HookInput;
use crate::output::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Allowed,
    Blocked,
    /// Would have been blocked (dry run)
    Warn,
    /// Hook input could not be parsed
    Error,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// Tool that was invoked
    pub tool: String,

    /// Summary of the input
    pub input_summary: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reason for the decision
    pub reason: String,

    /// Detector issues, in the order they were found
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuditEntry {
    pub fn new(input: &HookInput, decision: &Decision) -> Self {
        let level = match decision {
            Decision::Allow { .. } => LogLevel::Allowed,
            Decision::Deny { .. } => LogLevel::Blocked,
            Decision::Warn { .. } => LogLevel::Warn,
        };

        Self {
            timestamp: Utc::now(),
            level,
            tool: input.tool_name.clone(),
            input_summary: input.summary(),
            description: input.description().map(String::from),
            reason: decision.reason(),
            issues: decision.issues().to_vec(),
            session_id: input.session_id.clone(),
        }
    }

    /// Entry for hook input that failed to parse
    pub fn invalid_input(error: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            tool: "unknown".to_string(),
            input_summary: String::new(),
            description: None,
            reason: format!("invalid hook input: {}", error),
            issues: Vec::new(),
            session_id: None,
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Open (or create) the log file; logging is disabled if that fails
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(BufWriter::new(file)),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "audit log disabled");
                    None
                }
            }
        });

        Self { writer }
    }

    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    pub fn log_decision(
        &mut self,
        input: &HookInput,
        decision: &Decision,
    ) -> Result<(), std::io::Error> {
        self.log(&AuditEntry::new(input, decision))
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
