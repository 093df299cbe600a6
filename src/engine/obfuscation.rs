//! Obfuscation heuristics
//!
//! Flags argument text that looks encoded (base64, hex), reversed or spliced
//! together from many quoted fragments. A flag alone never blocks: the
//! detector also requires the content to loosely match a configured rule.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{literals, Analysis};
use crate::parser::ast::CallExpression;
use crate::parser::word::Word;
use crate::rules::{pattern, Rule, WILDCARD};

/// `\x67` or `\0147` style escapes in echo/printf arguments
static ESCAPE_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(x[0-9A-Fa-f]|0)").unwrap());

/// Utilities that reverse their input
const REVERSERS: &[&str] = &["rev", "tac"];

/// Shortest rule fragment worth searching for in reverse
const MIN_FRAGMENT_LEN: usize = 3;

/// Outcome of running every heuristic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub flagged: bool,
    pub reasons: Vec<String>,
}

impl Detection {
    fn flag(&mut self, reason: impl Into<String>) {
        self.flagged = true;
        self.reasons.push(reason.into());
    }
}

/// Rule-aware obfuscation heuristics
#[derive(Debug, Clone)]
pub struct ObfuscationAnalyzer {
    rules: Vec<Rule>,
    /// Rule commands, lower-cased
    commands: Vec<String>,
    /// Rule commands and pattern words spelled backwards (`tig`, `hsup`)
    reversed_fragments: Vec<String>,
}

impl ObfuscationAnalyzer {
    pub fn new(rules: &[Rule]) -> Self {
        let mut commands: Vec<String> = Vec::new();
        let mut reversed_fragments: Vec<String> = Vec::new();

        for rule in rules {
            let command = pattern::normalize_command(rule.blocked_command());
            let words = rule
                .blocked_patterns()
                .iter()
                .flat_map(|p| p.split_whitespace())
                .map(|w| w.trim_end_matches('*').to_lowercase());

            for fragment in std::iter::once(command.clone()).chain(words) {
                if fragment.chars().count() < MIN_FRAGMENT_LEN {
                    continue;
                }
                let reversed: String = fragment.chars().rev().collect();
                if !reversed_fragments.contains(&reversed) {
                    reversed_fragments.push(reversed);
                }
            }
            if !command.is_empty() && !commands.contains(&command) {
                commands.push(command);
            }
        }

        Self {
            rules: rules.to_vec(),
            commands,
            reversed_fragments,
        }
    }

    /// Run every heuristic over the content
    pub fn detect(&self, content: &str) -> Detection {
        let mut detection = Detection::default();
        let content = content.trim();
        if content.is_empty() {
            return detection;
        }
        let lowered = content.to_lowercase();
        let tokens: Vec<&str> = content.split_whitespace().collect();

        if is_likely_base64(content) {
            detection.flag("Possible base64 encoded content");
        }
        if let Some(token) = std::iter::once(content)
            .chain(tokens.iter().copied())
            .find(|t| is_likely_hex(t))
        {
            detection.flag(format!("Possible hex encoded content: {}", token));
        }
        if tokens
            .iter()
            .any(|t| REVERSERS.contains(&t.to_lowercase().as_str()))
        {
            detection.flag("Reversal utility in arguments");
        }
        if let Some(fragment) = self
            .reversed_fragments
            .iter()
            .find(|f| lowered.contains(f.as_str()))
        {
            detection.flag(format!("Reversed command fragment: {}", fragment));
        }
        if has_splice_markers(content) {
            let stripped = strip_splice_characters(&lowered);
            if let Some(command) = self.commands.iter().find(|c| stripped.contains(c.as_str())) {
                detection.flag(format!("Quote-spliced {} command", command));
            }
        }

        detection
    }

    /// The command of a rule the content loosely matches.
    ///
    /// The content is tried as-is, reversed, and with splice characters
    /// removed. A rule counts when its command appears together with one of
    /// its patterns and no allow-exception covers the text.
    pub fn loosely_matches_rule(&self, content: &str) -> Option<&str> {
        let lowered = content.to_lowercase();
        let candidates = [
            strip_splice_characters(&lowered),
            lowered.chars().rev().collect::<String>(),
            lowered,
        ];

        self.rules.iter().find_map(|rule| {
            let command = pattern::normalize_command(rule.blocked_command());
            if command.is_empty() {
                return None;
            }
            candidates
                .iter()
                .any(|text| {
                    cooccurs(text, &command, rule.blocked_patterns())
                        && !pattern::allow_exception(text, rule.allow_exceptions())
                })
                .then_some(rule.blocked_command())
        })
    }
}

/// Command followed by one of its patterns, adjacent or within the window
fn cooccurs(text: &str, command: &str, patterns: &[String]) -> bool {
    if !text.contains(command) {
        return false;
    }
    patterns.iter().any(|p| {
        let p = p.trim();
        if p.is_empty() {
            return false;
        }
        if p == WILDCARD {
            return true;
        }
        pattern::pattern_matches(text, &format!("{} {}", command, p))
    })
}

/// Length >= 8 with more than 90% base64 alphabet characters
pub fn is_likely_base64(s: &str) -> bool {
    let total = s.chars().count();
    if total < 8 {
        return false;
    }
    let valid = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .count();
    valid * 10 > total * 9
}

/// Even length >= 6, hex digits only
pub fn is_likely_hex(s: &str) -> bool {
    s.len() >= 6 && s.len() % 2 == 0 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn has_splice_markers(content: &str) -> bool {
    content.matches("${").count() > 2
        || content.matches('"').count() > 4
        || content.matches('\'').count() > 4
}

fn strip_splice_characters(content: &str) -> String {
    content
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\\' | '{' | '}' | '$'))
        .collect()
}

impl Analysis<'_> {
    pub(super) fn check_obfuscation(&mut self, call: &CallExpression, command: &str) -> bool {
        let content = static_argument_text(&call.arguments);
        let detection = self.obfuscation.detect(&content);

        if detection.flagged {
            if let Some(rule_command) = self.obfuscation.loosely_matches_rule(&content) {
                let issue = format!(
                    "Obfuscated {} command detected ({})",
                    rule_command,
                    detection.reasons.join(", ")
                );
                self.add_issue(issue);
                return true;
            }
            tracing::debug!(reasons = ?detection.reasons, "obfuscation heuristics fired without a rule match");
        }

        let name = pattern::normalize_command(command);
        if literals::is_printer(&name) {
            return self.check_echo_escapes(call, &name);
        }
        false
    }

    /// `echo -e '\x67\x69\x74'` hides text from every other check
    fn check_echo_escapes(&mut self, call: &CallExpression, name: &str) -> bool {
        for word in &call.arguments {
            let value = word.resolve().value;
            if is_escape_flag(&value) {
                self.add_issue(format!("{} with -e flag may hide escaped commands", name));
                return true;
            }
            if ESCAPE_SEQUENCE.is_match(&value) {
                self.add_issue(format!(
                    "{} with escape sequences may hide commands: {}",
                    name, word.text
                ));
                return true;
            }
        }
        false
    }
}

/// `-e` alone or combined with `-n`/`-E`
fn is_escape_flag(arg: &str) -> bool {
    arg.len() > 1
        && arg.starts_with('-')
        && arg[1..].contains('e')
        && arg[1..].chars().all(|c| matches!(c, 'n' | 'e' | 'E'))
}

fn static_argument_text(arguments: &[Word]) -> String {
    arguments
        .iter()
        .map(Word::resolve)
        .filter(|resolved| resolved.is_static && !resolved.value.is_empty())
        .map(|resolved| resolved.value)
        .collect::<Vec<_>>()
        .join(" ")
}
