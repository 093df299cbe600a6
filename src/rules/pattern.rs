//! Rule pattern matching
//!
//! All comparisons are case-insensitive. A pattern is one of:
//!
//! - `*`: matches everything, including no arguments at all
//! - `prefix*`: the text starts with `prefix`, or some word of it does
//! - anything else: a substring match, where multi-word patterns also match
//!   when their words appear in order with only a short gap between each
//!   pair (`push --force` matches `push origin --force`)

/// Largest gap, in characters, allowed between consecutive pattern words
pub const PROXIMITY_WINDOW: usize = 20;

/// Whether any pattern matches the text
pub fn matches(text: &str, patterns: &[String]) -> bool {
    find_match(text, patterns).is_some()
}

/// The first pattern that matches the text
pub fn find_match<'a>(text: &str, patterns: &'a [String]) -> Option<&'a str> {
    let text = normalize_text(text);
    patterns
        .iter()
        .map(String::as_str)
        .find(|pattern| matches_normalized(&text, pattern))
}

/// Test a single pattern against the text
pub fn pattern_matches(text: &str, pattern: &str) -> bool {
    matches_normalized(&normalize_text(text), pattern)
}

/// Whether an allow-exception covers the text
pub fn allow_exception(text: &str, exceptions: &[String]) -> bool {
    let text = normalize_text(text);
    exceptions
        .iter()
        .any(|exception| words_match(&text, &exception.to_lowercase()))
}

/// Lower-case base name of a command: `/usr/bin/Git.exe` -> `git`
pub fn normalize_command(command: &str) -> String {
    let lower = command.trim().to_lowercase();
    let base = lower
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(lower.as_str());
    base.strip_suffix(".exe").unwrap_or(base).to_string()
}

/// Whether a command word names the rule's command
pub fn is_matching_command(command: &str, rule_command: &str) -> bool {
    let command = normalize_command(command);
    !command.is_empty() && command == normalize_command(rule_command)
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn matches_normalized(text: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    if pattern.is_empty() {
        return false;
    }
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        let prefix = prefix.trim_end();
        return text.starts_with(prefix) || text.contains(&format!(" {}", prefix));
    }
    words_match(text, &pattern)
}

fn words_match(text: &str, pattern: &str) -> bool {
    let words: Vec<&str> = pattern.split_whitespace().collect();
    match words.as_slice() {
        [] => false,
        [single] => text.contains(*single),
        [first, rest @ ..] => {
            text.contains(&words.join(" "))
                || text
                    .match_indices(*first)
                    .any(|(start, found)| words_follow(text, rest, start + found.len()))
        }
    }
}

/// Each remaining word must start within the window after the previous one ends
fn words_follow(text: &str, words: &[&str], from: usize) -> bool {
    let Some((next, rest)) = words.split_first() else {
        return true;
    };
    text[from..]
        .match_indices(*next)
        .take_while(|(gap, _)| *gap <= PROXIMITY_WINDOW)
        .any(|(gap, found)| words_follow(text, rest, from + gap + found.len()))
}
