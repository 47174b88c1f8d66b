//! Immutable syntax tree consumed by cops.
//!
//! The shape follows the Parser gem's s-expressions: a call is
//! `(send receiver :selector arg...)`, an integer literal is `(int 1)`.
//! Absent slots (a call without a receiver) are `Child::Nil`.

use std::fmt;

use crate::diagnostic::Location;

/// Begin/end positions of a node in its source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub begin: Location,
    pub end: Location,
}

impl Range {
    pub fn new(begin: Location, end: Location) -> Self {
        Self { begin, end }
    }

    /// Single-line range starting at `column` spanning `len` characters.
    pub fn on_line(line: usize, column: usize, len: usize) -> Self {
        Self {
            begin: Location { line, column },
            end: Location {
                line,
                column: column + len,
            },
        }
    }
}

/// A non-node value held in a child slot: method names, literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Symbol(s) => write!(f, ":{s}"),
            Scalar::Str(s) => write!(f, "{s:?}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Scalar::Float(x) => write!(f, "{x}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Node),
    Scalar(Scalar),
    /// An absent slot, e.g. the receiver of `eql(1)`.
    Nil,
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<Scalar> for Child {
    fn from(value: Scalar) -> Self {
        Child::Scalar(value)
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Node(n) => write!(f, "{n}"),
            Child::Scalar(s) => write!(f, "{s}"),
            Child::Nil => f.write_str("nil"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: String,
    children: Vec<Child>,
    range: Range,
    selector: Option<Range>,
}

impl Node {
    pub fn new(kind: impl Into<String>, children: Vec<Child>, range: Range) -> Self {
        Self {
            kind: kind.into(),
            children,
            range,
            selector: None,
        }
    }

    /// Attach the range of the selector token (the method name of a call).
    pub fn with_selector(mut self, selector: Range) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn selector(&self) -> Option<Range> {
        self.selector
    }

    pub fn into_children(mut self) -> Vec<Child> {
        std::mem::take(&mut self.children)
    }

    /// Direct children that are nodes, left to right.
    pub fn child_nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    /// Total node count of this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.child_nodes());
        }
        count
    }
}

/// Children are moved onto a heap stack before they drop, so a deep tree
/// never recurses through `Drop`.
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack: Vec<Node> = take_child_nodes(&mut self.children).collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(take_child_nodes(&mut node.children));
        }
    }
}

fn take_child_nodes(children: &mut Vec<Child>) -> impl Iterator<Item = Node> {
    std::mem::take(children).into_iter().filter_map(|child| match child {
        Child::Node(node) => Some(node),
        _ => None,
    })
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind)?;
        for child in &self.children {
            write!(f, " {child}")?;
        }
        f.write_str(")")
    }
}
