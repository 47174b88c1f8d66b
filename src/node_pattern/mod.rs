//! NodePattern DSL support: lexer, parser, and interpreter.
//!
//! A pattern is compiled once into a `NodePattern` and then evaluated against
//! any number of trees. Evaluation borrows the tree and never mutates it.

pub mod interpreter;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use interpreter::{Captured, Captures, interpret_pattern};
pub use lexer::{Lexer, Token};
pub use parser::{Parser, PatternNode};

use crate::tree::Node;

/// A malformed pattern string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at offset {offset})")]
pub struct PatternError {
    /// Byte offset into the pattern source.
    pub offset: usize,
    pub message: String,
}

impl PatternError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub struct NodePattern {
    source: String,
    root: PatternNode,
    capture_names: Vec<String>,
}

impl NodePattern {
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let tokens = Lexer::new(source).tokenize()?;
        let (root, capture_names) = Parser::new(tokens, source.len()).parse()?;
        Ok(Self {
            source: source.to_string(),
            root,
            capture_names,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &PatternNode {
        &self.root
    }

    /// Capture names by slot. Unnamed captures are named by ordinal: "0", "1", ...
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn has_capture(&self, name: &str) -> bool {
        self.capture_names.iter().any(|n| n == name)
    }

    /// Evaluate against `node`. `None` means no match; `Some` carries the
    /// captures bound by the successful match (possibly none).
    pub fn matches<'p, 't>(&'p self, node: &'t Node) -> Option<Captures<'p, 't>> {
        interpreter::evaluate(&self.root, &self.capture_names, node)
    }

    pub fn is_match(&self, node: &Node) -> bool {
        self.matches(node).is_some()
    }
}

impl FromStr for NodePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for NodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
