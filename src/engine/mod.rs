//! Command detector for bash-block
//!
//! Parses a command string, resolves every call expression and checks it
//! against the configured rules. Commands smuggled inside strings (`bash -c`,
//! `eval`, `echo ... | sh`) are parsed and checked again, bounded by a maximum
//! nesting depth. Anything that cannot be verified statically is blocked.

mod direct;
mod literals;
pub mod obfuscation;

use tracing::{debug, warn};

use crate::input::HookInput;
use crate::output::Decision;
use crate::parser::ast::{self, CallExpression};
use crate::rules::Rule;

use obfuscation::ObfuscationAnalyzer;

/// Nesting depth used when none (or zero) is configured
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Decides whether shell commands may run
///
/// `analyze` takes `&mut self`; share a detector across threads only behind
/// a lock, or give each caller its own.
pub struct CommandDetector {
    rules: Vec<Rule>,
    max_depth: usize,
    obfuscation: ObfuscationAnalyzer,
    issues: Vec<String>,
}

impl CommandDetector {
    /// Create a detector; a `max_depth` of 0 means [`DEFAULT_MAX_DEPTH`]
    pub fn new(rules: Vec<Rule>, max_depth: usize) -> Self {
        let max_depth = if max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            max_depth
        };
        let obfuscation = ObfuscationAnalyzer::new(&rules);

        Self {
            rules,
            max_depth,
            obfuscation,
            issues: Vec::new(),
        }
    }

    /// Analyze a command string; `true` means it must be blocked.
    ///
    /// Issues from the previous call are discarded. A blocked command always
    /// leaves at least one issue behind; an allowed one leaves none.
    pub fn analyze(&mut self, command: &str) -> bool {
        let mut analysis = Analysis {
            rules: &self.rules,
            obfuscation: &self.obfuscation,
            max_depth: self.max_depth,
            issues: Vec::new(),
        };
        let blocked = analysis.analyze_recursive(command, 0);
        let issues = analysis.issues;

        if blocked {
            warn!(command, issues = ?issues, "blocked shell command");
        } else {
            debug!(command, "allowed shell command");
        }

        self.issues = issues;
        blocked
    }

    /// Issues recorded by the last `analyze` call
    pub fn issues(&self) -> Vec<String> {
        self.issues.clone()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Main entry point for hook input: check a tool call and return a decision
    pub fn check(&mut self, input: &HookInput) -> Decision {
        if !input.is_shell_tool() {
            return Decision::allow(format!("{} is not a shell tool", input.tool_name));
        }
        // fail closed
        let Some(command) = input.command() else {
            return Decision::deny(vec![format!(
                "{} tool input has no command string - unable to verify safety",
                input.tool_name
            )]);
        };
        if command.trim().is_empty() {
            return Decision::allow("empty command");
        }

        if self.analyze(command) {
            Decision::deny(self.issues())
        } else {
            Decision::allow("no blocked command found")
        }
    }
}

/// State for one top-level `analyze` call
///
/// Depth is passed explicitly so nested analyses never share a counter.
struct Analysis<'a> {
    rules: &'a [Rule],
    obfuscation: &'a ObfuscationAnalyzer,
    max_depth: usize,
    issues: Vec<String>,
}

impl Analysis<'_> {
    fn add_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    fn analyze_recursive(&mut self, command: &str, depth: usize) -> bool {
        let depth = depth + 1;
        if depth > self.max_depth {
            self.add_issue(format!(
                "Maximum nesting depth ({}) exceeded - command too complex",
                self.max_depth
            ));
            return true;
        }

        let tree = match ast::parse(command) {
            Ok(tree) => tree,
            Err(e) => {
                self.add_issue(format!("Unable to parse shell expression: {}", e));
                return true;
            }
        };

        let calls = tree.calls();
        debug!(depth, calls = calls.len(), "analyzing shell expression");
        calls.iter().any(|call| self.analyze_call(call, depth))
    }

    fn analyze_call(&mut self, call: &CallExpression, depth: usize) -> bool {
        let command = call.command.resolve();
        if !command.is_static {
            self.add_issue(format!(
                "Command `{}` uses dynamic substitution - unable to verify safety",
                call.command.text
            ));
            return true;
        }

        debug!(command = %command.value, args = call.arguments.len(), "checking call");
        self.check_direct_command(call, &command.value)
            || self.check_arguments_for_blocked_commands(call)
            || self.analyze_string_literals(call, &command.value, depth)
            || self.analyze_wrapped_interpreters(call, depth)
            || self.check_obfuscation(call, &command.value)
    }
}
