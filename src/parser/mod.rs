//! Shell parsing for bash-block
//!
//! Turns command text into call expressions made of statically resolvable words.

pub mod ast;
pub mod word;

pub use ast::{parse, CallExpression, ParseError, SyntaxTree};
pub use word::{ResolvedWord, Word, WordPart};
