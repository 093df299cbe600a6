//! bash-block - Shell command policy filter for Claude Code hooks
//!
//! Decides whether a shell command may run, given rules naming forbidden
//! commands and subcommand patterns. Commands are parsed with tree-sitter,
//! so disguises such as quote splitting (`g'i't push`), nested interpreters
//! (`bash -c 'git push'`), argument-position execution (`xargs git push`) and
//! runtime substitution (`$CMD push`) are all caught. Anything that cannot be
//! verified statically is blocked.
//!
//! # Features
//!
//! - **Static word resolution**: quotes, escapes and ANSI-C strings are
//!   resolved; expansions mark a word as unknown
//! - **Recursive analysis**: command strings inside command strings are
//!   checked again up to a depth limit
//! - **Rule patterns**: wildcards, glob prefixes, word proximity and
//!   allow-exceptions
//! - **Obfuscation heuristics**: encoded, reversed and quote-spliced content
//! - **Audit logging**: JSONL log of all decisions
//!
//! # Example
//!
//! ```
//! use bash_block::{CommandDetector, Rule};
//!
//! let mut detector = CommandDetector::new(vec![Rule::new("git", ["push"])], 10);
//!
//! assert!(detector.analyze("bash -c \"g'i't push origin\""));
//! assert!(!detector.issues().is_empty());
//!
//! assert!(!detector.analyze("git status"));
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod input;
pub mod output;
pub mod parser;
pub mod rules;

// Re-exports for convenience
pub use config::Config;
pub use engine::CommandDetector;
pub use input::{HookInput, ToolInput};
pub use output::{Decision, HookOutput};
pub use rules::Rule;
