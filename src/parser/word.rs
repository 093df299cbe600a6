//! Shell words and static resolution
//!
//! A word is the unit the shell splits a command line into: `git`, `"push"`,
//! `--message=$MSG`. Words are kept as their ordered parts so the detector can
//! tell literal text apart from anything the shell would only compute at
//! runtime. Resolution never evaluates an expansion; it only reports whether
//! the word is fully known.

/// One piece of a shell word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Unquoted text with backslash escapes removed
    Literal(String),
    /// `'...'` content, or the decoded content of `$'...'`
    SingleQuoted(String),
    /// `"..."` content, which may nest expansions
    DoubleQuoted(Vec<WordPart>),
    /// `$VAR` or `${...}`
    ParamExpansion(String),
    /// `$(...)` or backticks
    CmdSubstitution(String),
    /// `$((...))`
    ArithExpansion(String),
    /// `<(...)` or `>(...)`
    ProcSubstitution(String),
}

impl WordPart {
    /// Whether this part (or anything nested in it) is only known at runtime
    pub fn is_dynamic(&self) -> bool {
        match self {
            WordPart::Literal(_) | WordPart::SingleQuoted(_) => false,
            WordPart::DoubleQuoted(parts) => parts.iter().any(WordPart::is_dynamic),
            WordPart::ParamExpansion(_)
            | WordPart::CmdSubstitution(_)
            | WordPart::ArithExpansion(_)
            | WordPart::ProcSubstitution(_) => true,
        }
    }
}

/// The statically known value of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWord {
    /// Accumulated literal text (partial when the word is not static)
    pub value: String,
    /// False as soon as any part comes from an expansion or substitution
    pub is_static: bool,
}

/// A parsed shell word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Source text of the word as written
    pub text: String,
    /// Ordered parts
    pub parts: Vec<WordPart>,
}

impl Word {
    /// Create a word from its source text and parts
    pub fn new(text: impl Into<String>, parts: Vec<WordPart>) -> Self {
        Self {
            text: text.into(),
            parts,
        }
    }

    /// Create a plain literal word
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let parts = vec![WordPart::Literal(text.clone())];
        Self { text, parts }
    }

    /// Resolve the word to its literal value.
    ///
    /// A non-static result still carries the literal text gathered so far,
    /// which is only good for diagnostics. Never match rules against it.
    pub fn resolve(&self) -> ResolvedWord {
        let mut value = String::new();
        let mut is_static = true;
        for part in &self.parts {
            resolve_part(part, &mut value, &mut is_static);
        }
        ResolvedWord { value, is_static }
    }

    /// Literal strings carried by this word.
    ///
    /// A static word yields its whole value. A dynamic word yields each
    /// literal or quoted piece on its own, so text around an expansion can
    /// still be inspected.
    pub fn literal_strings(&self) -> Vec<String> {
        let resolved = self.resolve();
        if resolved.is_static {
            return if resolved.value.is_empty() {
                Vec::new()
            } else {
                vec![resolved.value]
            };
        }

        let mut strings = Vec::new();
        for part in &self.parts {
            match part {
                WordPart::Literal(s) | WordPart::SingleQuoted(s) if !s.is_empty() => {
                    strings.push(s.clone())
                }
                WordPart::DoubleQuoted(inner) => {
                    let text: String = inner
                        .iter()
                        .filter_map(|p| match p {
                            WordPart::Literal(s) | WordPart::SingleQuoted(s) => Some(s.as_str()),
                            _ => None,
                        })
                        .collect();
                    if !text.is_empty() {
                        strings.push(text);
                    }
                }
                _ => {}
            }
        }
        strings
    }
}

fn resolve_part(part: &WordPart, value: &mut String, is_static: &mut bool) {
    match part {
        WordPart::Literal(s) | WordPart::SingleQuoted(s) => value.push_str(s),
        WordPart::DoubleQuoted(inner) => {
            for sub in inner {
                resolve_part(sub, value, is_static);
            }
        }
        WordPart::ParamExpansion(_)
        | WordPart::CmdSubstitution(_)
        | WordPart::ArithExpansion(_)
        | WordPart::ProcSubstitution(_) => *is_static = false,
    }
}

/// Remove backslash escapes from unquoted text (`g\it` -> `git`)
pub fn unescape_unquoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some(next) => out.push(next),
            None => out.push('\\'),
        }
    }
    out
}

/// Remove the escapes that are special inside double quotes
pub fn unescape_double_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some(next @ ('"' | '\\' | '$' | '`')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Decode the body of an ANSI-C quoted string (`$'...'`)
pub fn decode_ansi_c(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'e' | 'E' => out.push('\u{1b}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '\\' | '\'' | '"' | '?' => out.push(esc),
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                push_code_point(&mut out, value);
            }
            'x' | 'u' | 'U' => {
                let max_digits = match esc {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut value = 0u32;
                let mut digits = 0;
                while digits < max_digits {
                    match chars.peek().and_then(|d| d.to_digit(16)) {
                        Some(d) => {
                            value = value.wrapping_mul(16).wrapping_add(d);
                            chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    out.push('\\');
                    out.push(esc);
                } else {
                    push_code_point(&mut out, value);
                }
            }
            'c' => match chars.next() {
                Some(ctrl) => push_code_point(&mut out, (ctrl as u32) & 0x1f),
                None => out.push_str("\\c"),
            },
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

fn push_code_point(out: &mut String, value: u32) {
    if let Some(ch) = char::from_u32(value) {
        out.push(ch);
    }
}
