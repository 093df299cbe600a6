//! Re-analysis of string literals handed to a shell
//!
//! Interpreters (`bash -c '...'`), evaluators (`eval`, `source`, `.`) and
//! printers whose output is often piped into a shell (`echo`, `printf`) carry
//! commands inside string arguments. Those strings, and any herestring or
//! heredoc fed to an interpreter, are parsed and checked again one nesting
//! level deeper. An interpreter run by another command (`sudo bash -c`,
//! `find -exec sh -c`) is checked the same way.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tracing::debug;

use super::Analysis;
use crate::parser::ast::CallExpression;
use crate::parser::word::Word;
use crate::rules::pattern;

/// Shell interpreters that execute their string arguments
static SHELL_INTERPRETERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["sh", "bash", "zsh", "ksh", "dash", "fish", "csh", "tcsh"]
        .into_iter()
        .collect()
});

/// Builtins that evaluate or source their arguments
static EVALUATORS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["eval", "source", "."].into_iter().collect());

/// Commands whose output commonly ends up in a shell
static PRINTERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["echo", "printf"].into_iter().collect());

/// Characters that only make sense in a string if it is shell code
const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '$', '`', '(', ')', '<', '>', '\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralFilter {
    /// Anything that could plausibly be a command
    Broad,
    /// Only strings that clearly are one
    Strict,
}

pub(super) fn is_printer(command: &str) -> bool {
    PRINTERS.contains(command)
}

impl Analysis<'_> {
    pub(super) fn analyze_string_literals(
        &mut self,
        call: &CallExpression,
        command: &str,
        depth: usize,
    ) -> bool {
        let name = pattern::normalize_command(command);
        let filter = if SHELL_INTERPRETERS.contains(name.as_str())
            || EVALUATORS.contains(name.as_str())
        {
            LiteralFilter::Broad
        } else if is_printer(&name) {
            LiteralFilter::Strict
        } else {
            return false;
        };

        if self.check_dynamic_operands(call, &name) {
            return true;
        }

        for word in &call.arguments {
            for literal in word.literal_strings() {
                let candidate = match filter {
                    LiteralFilter::Broad => self.looks_like_command(&literal),
                    LiteralFilter::Strict => self.definitely_looks_like_command(&literal),
                };
                if !candidate {
                    continue;
                }

                debug!(depth, literal = %literal, "re-analyzing string literal");
                if self.analyze_recursive(&literal, depth) {
                    self.add_issue(format!("Blocked command found in string: {}", literal));
                    return true;
                }
            }
        }

        match &call.input {
            Some(input) if SHELL_INTERPRETERS.contains(name.as_str()) => {
                self.analyze_script_input(input, &name, depth)
            }
            _ => false,
        }
    }

    /// Interpreters in argument position run the words after them.
    ///
    /// Only executables can be wrapped, so `eval`/`source` are not looked for.
    pub(super) fn analyze_wrapped_interpreters(
        &mut self,
        call: &CallExpression,
        depth: usize,
    ) -> bool {
        for (index, word) in call.arguments.iter().enumerate() {
            let resolved = word.resolve();
            if !resolved.is_static {
                continue;
            }
            let name = pattern::normalize_command(&resolved.value);
            if !SHELL_INTERPRETERS.contains(name.as_str()) {
                continue;
            }

            // `find -exec sh -c '...' \;` ends the wrapped command at `;`
            let arguments: Vec<Word> = call.arguments[index + 1..]
                .iter()
                .take_while(|w| !is_exec_terminator(w))
                .cloned()
                .collect();
            let wrapped = CallExpression {
                text: call.text.clone(),
                command: word.clone(),
                arguments,
                input: call.input.clone(),
            };

            debug!(depth, interpreter = %name, "checking interpreter in argument position");
            if self.analyze_string_literals(&wrapped, &name, depth) {
                return true;
            }
        }
        false
    }

    /// Herestring or heredoc handed to an interpreter
    fn analyze_script_input(&mut self, input: &Word, name: &str, depth: usize) -> bool {
        let resolved = input.resolve();
        if !resolved.is_static {
            self.add_issue(format!(
                "{} reads dynamic input `{}` - unable to verify safety",
                name,
                input.text.trim()
            ));
            return true;
        }

        let script = resolved.value.trim();
        if script.is_empty() {
            return false;
        }
        debug!(depth, script, "re-analyzing interpreter input");
        if self.analyze_recursive(script, depth) {
            self.add_issue(format!("Blocked command found in string: {}", script));
            return true;
        }
        false
    }

    /// `eval $X` and `bash -c "$X"` run code nobody can see
    fn check_dynamic_operands(&mut self, call: &CallExpression, name: &str) -> bool {
        if name == "eval" {
            if let Some(word) = call.arguments.iter().find(|w| !w.resolve().is_static) {
                self.add_issue(format!(
                    "eval uses dynamic argument `{}` - unable to verify safety",
                    word.text
                ));
                return true;
            }
            return false;
        }

        if !SHELL_INTERPRETERS.contains(name) {
            return false;
        }

        let mut words = call.arguments.iter();
        while let Some(word) = words.next() {
            let flag = word.resolve();
            if !(flag.is_static && is_command_flag(&flag.value)) {
                continue;
            }
            if let Some(operand) = words.next() {
                if !operand.resolve().is_static {
                    self.add_issue(format!(
                        "{} -c uses dynamic argument `{}` - unable to verify safety",
                        name, operand.text
                    ));
                    return true;
                }
            }
        }
        false
    }

    fn looks_like_command(&self, literal: &str) -> bool {
        let literal = literal.trim();
        if literal.is_empty() || literal.starts_with('-') {
            return false;
        }
        literal
            .chars()
            .any(|c| c.is_whitespace() || SHELL_METACHARACTERS.contains(&c))
            || self.starts_with_rule_command(literal)
    }

    fn definitely_looks_like_command(&self, literal: &str) -> bool {
        let literal = literal.trim();
        self.starts_with_rule_command(literal)
            || literal.contains(';')
            || literal.contains("&&")
            || literal.contains("||")
            || literal.contains('|')
    }

    fn starts_with_rule_command(&self, literal: &str) -> bool {
        literal.split_whitespace().next().is_some_and(|first| {
            self.rules
                .iter()
                .any(|rule| pattern::is_matching_command(first, rule.blocked_command()))
        })
    }
}

fn is_exec_terminator(word: &Word) -> bool {
    let resolved = word.resolve();
    resolved.is_static && matches!(resolved.value.as_str(), ";" | "+")
}

/// `-c`, or a flag cluster containing it (`-lc`, `-ec`)
fn is_command_flag(arg: &str) -> bool {
    arg.starts_with('-') && !arg.starts_with("--") && arg[1..].contains('c')
}
