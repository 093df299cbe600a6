//! Direct rule matches and blocked commands passed as arguments
//!
//! `git push` is a direct match. `xargs git push`, `find . -exec git push {} \;`
//! and `exec git push` hide the blocked command in argument position, so the
//! arguments following it are checked the same way.

use tracing::debug;

use super::Analysis;
use crate::parser::ast::CallExpression;
use crate::parser::word::Word;
use crate::rules::{pattern, Rule};

impl Analysis<'_> {
    pub(super) fn check_direct_command(&mut self, call: &CallExpression, command: &str) -> bool {
        let rules = self.rules;
        for rule in rules {
            if pattern::is_matching_command(command, rule.blocked_command())
                && self.check_rule_match(call, rule)
            {
                return true;
            }
        }
        false
    }

    fn check_rule_match(&mut self, call: &CallExpression, rule: &Rule) -> bool {
        let mut args = Vec::with_capacity(call.arguments.len());
        for word in &call.arguments {
            let resolved = word.resolve();
            if !resolved.is_static {
                self.add_issue(format!(
                    "{} uses dynamic subcommand `{}` - unable to verify safety",
                    rule.blocked_command(),
                    word.text
                ));
                return true;
            }
            args.push(resolved.value);
        }

        let joined = args.join(" ");
        match blocked_pattern(rule, &joined) {
            Some(matched) => {
                self.add_issue(format!(
                    "Blocked {} pattern detected: {}",
                    rule.blocked_command(),
                    matched
                ));
                true
            }
            None => false,
        }
    }

    pub(super) fn check_arguments_for_blocked_commands(&mut self, call: &CallExpression) -> bool {
        let rules = self.rules;
        for (index, word) in call.arguments.iter().enumerate() {
            let resolved = word.resolve();
            if !resolved.is_static || resolved.value.is_empty() {
                continue;
            }

            for rule in rules {
                if !pattern::is_matching_command(&resolved.value, rule.blocked_command()) {
                    continue;
                }
                let remaining = effective_arguments(&call.arguments[index + 1..]);
                if let Some(matched) = blocked_pattern(rule, &remaining) {
                    self.add_issue(format!(
                        "Blocked command '{}' found as argument ({} pattern: {})",
                        rule.blocked_command(),
                        rule.blocked_command(),
                        matched
                    ));
                    return true;
                }
            }
        }
        false
    }
}

/// The first blocked pattern matching the joined arguments, unless an
/// allow-exception covers them
fn blocked_pattern<'r>(rule: &'r Rule, joined: &str) -> Option<&'r str> {
    if rule.blocked_patterns().is_empty() {
        return None;
    }
    if pattern::allow_exception(joined, rule.allow_exceptions()) {
        debug!(rule = %rule, args = joined, "allow-exception matched");
        return None;
    }
    pattern::find_match(joined, rule.blocked_patterns())
}

/// Static words after a blocked command in argument position
fn effective_arguments(words: &[Word]) -> String {
    words
        .iter()
        .map(Word::resolve)
        .filter(|resolved| resolved.is_static && !resolved.value.is_empty())
        .map(|resolved| resolved.value)
        .collect::<Vec<_>>()
        .join(" ")
}
