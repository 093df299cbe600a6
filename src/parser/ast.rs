//! AST-based shell command extraction using tree-sitter-bash
//!
//! Parses command text and flattens the syntax tree into the call expressions
//! the detector checks: every simple command in pipelines, lists, conditionals,
//! loops, subshells and command substitutions. Words are converted into owned
//! [`Word`] values so nothing outside this module touches tree-sitter nodes.

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

use crate::parser::word::{self, Word, WordPart};

/// Longest snippet of offending source quoted in a syntax error
const SNIPPET_LEN: usize = 24;

/// Why a command string could not be turned into a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("failed to load tree-sitter-bash language: {0}")]
    Language(String),

    #[error("parser produced no syntax tree")]
    NoTree,

    #[error("syntax error at line {line}, column {column}: {detail}")]
    Syntax {
        line: usize,
        column: usize,
        detail: String,
    },
}

/// One simple command: a command word followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpression {
    /// Source text of the whole command (including redirects)
    pub text: String,
    /// The command word
    pub command: Word,
    /// Argument words in source order, including the extra words a file
    /// redirect swallows (`git > /dev/null push` runs `git push`)
    pub arguments: Vec<Word>,
    /// Text fed to stdin by a herestring or heredoc
    pub input: Option<Word>,
}

/// A successfully parsed command string
pub struct SyntaxTree {
    tree: Tree,
    source: String,
}

/// Parse a command string.
///
/// Any ERROR or MISSING node in the tree is reported as [`ParseError::Syntax`];
/// a partially understood command is never analyzed.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_bash::LANGUAGE.into())
        .map_err(|e| ParseError::Language(format!("{:?}", e)))?;

    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
    if tree.root_node().has_error() {
        return Err(syntax_error(tree.root_node(), source));
    }

    Ok(SyntaxTree {
        tree,
        source: source.to_string(),
    })
}

/// Locate the first ERROR or MISSING node in document order
fn syntax_error(root: Node, source: &str) -> ParseError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() || node.is_error() {
            let position = node.start_position();
            let detail = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                let text = node.utf8_text(source.as_bytes()).unwrap_or("");
                let snippet: String = text.chars().take(SNIPPET_LEN).collect();
                format!("unexpected `{}`", snippet.trim())
            };
            return ParseError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
                detail,
            };
        }
        push_children(&mut stack, node);
    }

    ParseError::Syntax {
        line: 1,
        column: 1,
        detail: "invalid syntax".to_string(),
    }
}

/// Push a node's children so they pop in source order
fn push_children<'tree>(stack: &mut Vec<Node<'tree>>, node: Node<'tree>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'tree>> = node.children(&mut cursor).collect();
    stack.extend(children.into_iter().rev());
}

impl SyntaxTree {
    /// Every call expression, depth-first pre-order.
    ///
    /// An outer command comes before the commands nested inside its
    /// arguments, and siblings keep their source order.
    pub fn calls(&self) -> Vec<CallExpression> {
        let mut calls = Vec::new();
        let mut stack = vec![self.tree.root_node()];

        while let Some(node) = stack.pop() {
            if node.kind() == "command" {
                if let Some(call) = self.call_expression(node) {
                    calls.push(call);
                }
            }
            push_children(&mut stack, node);
        }

        calls
    }

    fn call_expression(&self, node: Node) -> Option<CallExpression> {
        // `VAR=value` alone and bare redirects have no command name
        let name = node.child_by_field_name("name")?;
        let command = self.word(name);

        let mut arguments = Vec::new();
        let mut input = None;
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if cursor.field_name() == Some("argument") {
                    arguments.push(self.word(child));
                } else if is_redirect(child.kind()) {
                    self.redirect_words(child, &mut arguments, &mut input);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        // trailing redirects wrap the command in a `redirected_statement`
        if let Some(parent) = node.parent().filter(|p| p.kind() == "redirected_statement") {
            if parent.child_by_field_name("body").map(|body| body.id()) == Some(node.id()) {
                let mut cursor = parent.walk();
                let redirects: Vec<Node> = parent
                    .children(&mut cursor)
                    .filter(|child| is_redirect(child.kind()))
                    .collect();
                for redirect in redirects {
                    self.redirect_words(redirect, &mut arguments, &mut input);
                }
            }
        }

        Some(CallExpression {
            text: self.text(node).to_string(),
            command,
            arguments,
            input,
        })
    }

    /// Words a redirect contributes to its command.
    ///
    /// Bash takes only the first word after `>` as the target; any further
    /// words are ordinary arguments. Herestrings and heredocs become stdin.
    fn redirect_words(&self, redirect: Node, arguments: &mut Vec<Word>, input: &mut Option<Word>) {
        match redirect.kind() {
            "file_redirect" => {
                let mut cursor = redirect.walk();
                let destinations: Vec<Node> = redirect
                    .children_by_field_name("destination", &mut cursor)
                    .collect();
                arguments.extend(destinations.into_iter().skip(1).map(|d| self.word(d)));
            }
            "herestring_redirect" => {
                let mut cursor = redirect.walk();
                let body = redirect.named_children(&mut cursor).last();
                *input = body.map(|b| self.word(b));
            }
            "heredoc_redirect" | "heredoc_body" => {
                if let Some(body) = find_descendant(redirect, "heredoc_body") {
                    let parts = self.interpolated_parts(body, body.start_byte(), body.end_byte());
                    *input = Some(Word::new(self.text(body), vec![WordPart::DoubleQuoted(parts)]));
                }
            }
            _ => {}
        }
    }

    fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn word(&self, node: Node) -> Word {
        Word::new(self.text(node), self.word_parts(node))
    }

    fn word_parts(&self, node: Node) -> Vec<WordPart> {
        let text = self.text(node);
        match node.kind() {
            "command_name" | "translated_string" => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                children
                    .into_iter()
                    .flat_map(|child| self.word_parts(child))
                    .collect()
            }
            "concatenation" => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.children(&mut cursor).collect();
                children
                    .into_iter()
                    .flat_map(|child| self.word_parts(child))
                    .collect()
            }
            "word" => vec![WordPart::Literal(word::unescape_unquoted(text))],
            "raw_string" => vec![WordPart::SingleQuoted(strip_delimiters(text, "'", "'").to_string())],
            "ansi_c_string" => vec![WordPart::SingleQuoted(word::decode_ansi_c(strip_delimiters(
                text, "$'", "'",
            )))],
            "string" => vec![WordPart::DoubleQuoted(self.double_quoted_parts(node))],
            kind => match dynamic_part(kind, text) {
                Some(part) => vec![part],
                None => vec![self.opaque_part(node)],
            },
        }
    }

    /// Split `"..."` into literal gaps and the expansions between them
    fn double_quoted_parts(&self, node: Node) -> Vec<WordPart> {
        let text = self.text(node);
        let open = usize::from(text.starts_with('"'));
        let close = usize::from(text.len() > open && text.ends_with('"'));
        self.interpolated_parts(node, node.start_byte() + open, node.end_byte() - close)
    }

    /// Literal gaps between the expansions of `node` within `start..end`
    fn interpolated_parts(&self, node: Node, start: usize, end: usize) -> Vec<WordPart> {
        let mut parts = Vec::new();
        let mut pos = start;
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();

        for child in children {
            let Some(part) = dynamic_part(child.kind(), self.text(child)) else {
                continue;
            };
            self.push_quoted_literal(&mut parts, pos, child.start_byte());
            parts.push(part);
            pos = child.end_byte();
        }
        self.push_quoted_literal(&mut parts, pos, end);

        parts
    }

    fn push_quoted_literal(&self, parts: &mut Vec<WordPart>, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if let Some(raw) = self.source.get(start..end) {
            parts.push(WordPart::Literal(word::unescape_double_quoted(raw)));
        }
    }

    /// Node kinds without a dedicated mapping: literal unless they hide an expansion
    fn opaque_part(&self, node: Node) -> WordPart {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.id() != node.id() {
                if let Some(part) = dynamic_part(current.kind(), self.text(current)) {
                    return part;
                }
            }
            push_children(&mut stack, current);
        }
        WordPart::Literal(self.text(node).to_string())
    }
}

/// Redirect nodes, plus a heredoc body that sits beside its redirect
fn is_redirect(kind: &str) -> bool {
    matches!(
        kind,
        "file_redirect" | "herestring_redirect" | "heredoc_redirect" | "heredoc_body"
    )
}

fn find_descendant<'tree>(node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            return Some(current);
        }
        push_children(&mut stack, current);
    }
    None
}

fn dynamic_part(kind: &str, text: &str) -> Option<WordPart> {
    let text = text.to_string();
    match kind {
        "simple_expansion" | "expansion" => Some(WordPart::ParamExpansion(text)),
        "command_substitution" => Some(WordPart::CmdSubstitution(text)),
        "arithmetic_expansion" => Some(WordPart::ArithExpansion(text)),
        "process_substitution" => Some(WordPart::ProcSubstitution(text)),
        _ => None,
    }
}

fn strip_delimiters<'a>(text: &'a str, open: &str, close: &str) -> &'a str {
    let inner = text.strip_prefix(open).unwrap_or(text);
    inner.strip_suffix(close).unwrap_or(inner)
}
