//! Blocking rules for bash-block
//!
//! A rule names one command plus the subcommand patterns that make an
//! invocation of it forbidden, and optional allow-exceptions that take
//! precedence over those patterns.

pub mod pattern;
pub mod presets;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard pattern: every use of the command is blocked
pub const WILDCARD: &str = "*";

/// A blocking rule
///
/// Fields are fixed after construction; read them through the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    /// Command name the rule applies to (`git`)
    #[serde(rename = "command")]
    blocked_command: String,

    /// Patterns matched against the joined arguments (`push`, `delete-*`, `*`)
    #[serde(rename = "patterns", default)]
    blocked_patterns: Vec<String>,

    /// Patterns that exempt an invocation from this rule
    #[serde(rename = "allow", default)]
    allow_exceptions: Vec<String>,
}

impl Rule {
    /// Create a rule with no allow-exceptions
    pub fn new<C, P, S>(command: C, patterns: P) -> Self
    where
        C: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked_command: command.into(),
            blocked_patterns: patterns.into_iter().map(Into::into).collect(),
            allow_exceptions: Vec::new(),
        }
    }

    /// Attach allow-exceptions
    pub fn with_exceptions<E, S>(mut self, exceptions: E) -> Self
    where
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_exceptions = exceptions.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a command-line rule spec.
    ///
    /// `"git push pull"` blocks `git push` and `git pull`; a command on its
    /// own (`"git"`) blocks every use. Words are split with shell quoting
    /// rules, so `"aws 's3 rm'"` yields the two-word pattern `s3 rm`.
    /// Returns `None` for an empty spec or unbalanced quotes.
    pub fn parse_spec(spec: &str) -> Option<Self> {
        let mut words = shlex::split(spec)?.into_iter();
        let command = words.next().filter(|c| !c.trim().is_empty())?;
        let patterns: Vec<String> = words.filter(|w| !w.trim().is_empty()).collect();

        if patterns.is_empty() {
            Some(Self::new(command, [WILDCARD]))
        } else {
            Some(Self::new(command, patterns))
        }
    }

    pub fn blocked_command(&self) -> &str {
        &self.blocked_command
    }

    pub fn blocked_patterns(&self) -> &[String] {
        &self.blocked_patterns
    }

    pub fn allow_exceptions(&self) -> &[String] {
        &self.allow_exceptions
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.blocked_command, self.blocked_patterns.join(", "))?;
        if !self.allow_exceptions.is_empty() {
            write!(f, " allow [{}]", self.allow_exceptions.join(", "))?;
        }
        Ok(())
    }
}
