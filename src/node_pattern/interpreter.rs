//! NodePattern interpreter: runtime evaluation of compiled patterns against
//! `tree::Node`s.
//!
//! Matching is total. Any shape the pattern does not describe, including
//! malformed or unexpected trees, is simply "no match".
//!
//! Child slots are heterogeneous: a nested node, a scalar value (method name,
//! literal value) or `Nil` for an absent slot. Kind tests and sequences only
//! ever match nodes; literals only match scalars; `nil` only matches `Nil`.

use std::fmt;

use super::lexer::Lexer;
use super::parser::{Parser, PatternNode};
use crate::tree::{Child, Node, Scalar};

/// A value bound by a capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Captured<'t> {
    Node(&'t Node),
    Scalar(&'t Scalar),
    Nil,
    /// Children absorbed by a captured rest: `$...`
    Seq(&'t [Child]),
}

impl<'t> Captured<'t> {
    pub fn as_node(&self) -> Option<&'t Node> {
        match self {
            Captured::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&'t Scalar> {
        match self {
            Captured::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Captured<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Captured::Node(n) => write!(f, "{n}"),
            Captured::Scalar(s) => write!(f, "{s}"),
            Captured::Nil => f.write_str("nil"),
            Captured::Seq(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

/// The captures of one successful match.
#[derive(Debug, Clone)]
pub struct Captures<'p, 't> {
    names: &'p [String],
    bound: Vec<(usize, Captured<'t>)>,
}

impl<'p, 't> Captures<'p, 't> {
    pub fn get(&self, name: &str) -> Option<Captured<'t>> {
        let slot = self.names.iter().position(|n| n == name)?;
        self.bound
            .iter()
            .rev()
            .find(|(s, _)| *s == slot)
            .map(|(_, value)| *value)
    }

    /// Bound captures in the order they were bound.
    pub fn iter(&self) -> impl Iterator<Item = (&'p str, Captured<'t>)> + '_ {
        self.bound
            .iter()
            .map(|(slot, value)| (self.names[*slot].as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

/// One-shot convenience: compile `pattern_str` and test it against `node`.
///
/// Returns `false` when the pattern does not compile.
pub fn interpret_pattern(pattern_str: &str, node: &Node) -> bool {
    let Ok(tokens) = Lexer::new(pattern_str).tokenize() else {
        return false;
    };
    let Ok((root, names)) = Parser::new(tokens, pattern_str.len()).parse() else {
        return false;
    };
    evaluate(&root, &names, node).is_some()
}

pub(super) fn evaluate<'p, 't>(
    root: &PatternNode,
    names: &'p [String],
    node: &'t Node,
) -> Option<Captures<'p, 't>> {
    let mut bound = Vec::new();
    if matches_target(root, Target::Node(node), &mut bound) {
        Some(Captures { names, bound })
    } else {
        None
    }
}

type Bound<'t> = Vec<(usize, Captured<'t>)>;

/// What a pattern element is being compared against.
#[derive(Clone, Copy)]
enum Target<'t> {
    Node(&'t Node),
    Scalar(&'t Scalar),
    Nil,
}

impl<'t> Target<'t> {
    fn from_child(child: &'t Child) -> Self {
        match child {
            Child::Node(n) => Target::Node(n),
            Child::Scalar(s) => Target::Scalar(s),
            Child::Nil => Target::Nil,
        }
    }

    fn captured(self) -> Captured<'t> {
        match self {
            Target::Node(n) => Captured::Node(n),
            Target::Scalar(s) => Captured::Scalar(s),
            Target::Nil => Captured::Nil,
        }
    }
}

fn matches_target<'t>(pattern: &PatternNode, target: Target<'t>, bound: &mut Bound<'t>) -> bool {
    match pattern {
        PatternNode::Wildcard => true,
        // Only meaningful inside a sequence, where `matches_children` handles it.
        PatternNode::Rest => true,
        PatternNode::Nil => matches!(target, Target::Nil),
        PatternNode::Kind(kind) => matches!(target, Target::Node(n) if n.kind() == kind.as_str()),
        PatternNode::Literal(value) => matches!(target, Target::Scalar(s) if s == value),

        PatternNode::Sequence { head, children } => {
            let Target::Node(node) = target else {
                return false;
            };
            let mark = bound.len();
            if matches_target(head, target, bound)
                && matches_children(children, node.children(), bound)
            {
                true
            } else {
                bound.truncate(mark);
                false
            }
        }

        PatternNode::Alternatives(alts) => {
            for alt in alts {
                let mark = bound.len();
                if matches_target(alt, target, bound) {
                    return true;
                }
                bound.truncate(mark);
            }
            false
        }

        PatternNode::Conjunction(items) => {
            let mark = bound.len();
            for item in items {
                if !matches_target(item, target, bound) {
                    bound.truncate(mark);
                    return false;
                }
            }
            true
        }

        PatternNode::Negation(inner) => {
            // Nothing under a negation survives: it only matched when we fail.
            let mark = bound.len();
            let inner_matched = matches_target(inner, target, bound);
            bound.truncate(mark);
            !inner_matched
        }

        PatternNode::Capture { slot, inner } => {
            if matches_target(inner, target, bound) {
                bound.push((*slot, target.captured()));
                true
            } else {
                false
            }
        }

        PatternNode::Descend(inner) => {
            // Pre-order over the target and everything beneath it; first hit wins.
            let mut stack = vec![target];
            while let Some(current) = stack.pop() {
                let mark = bound.len();
                if matches_target(inner, current, bound) {
                    return true;
                }
                bound.truncate(mark);
                if let Target::Node(node) = current {
                    stack.extend(node.children().iter().rev().map(Target::from_child));
                }
            }
            false
        }
    }
}

/// `Some(slot)` for a rest element; the inner option is the capture slot of `$...`.
fn rest_element(pattern: &PatternNode) -> Option<Option<usize>> {
    match pattern {
        PatternNode::Rest => Some(None),
        PatternNode::Capture { slot, inner } if **inner == PatternNode::Rest => Some(Some(*slot)),
        _ => None,
    }
}

/// Match pattern children against actual children positionally.
///
/// Without a rest element arity must agree exactly. A rest absorbs zero or
/// more children, trying the shortest run first.
fn matches_children<'t>(
    patterns: &[PatternNode],
    actuals: &'t [Child],
    bound: &mut Bound<'t>,
) -> bool {
    let Some((first, remaining)) = patterns.split_first() else {
        return actuals.is_empty();
    };

    if let Some(slot) = rest_element(first) {
        // Never absorb children the remaining fixed elements need.
        let fixed = remaining.iter().filter(|p| rest_element(p).is_none()).count();
        let max_take = actuals.len().saturating_sub(fixed);
        for take in 0..=max_take {
            let mark = bound.len();
            if let Some(slot) = slot {
                bound.push((slot, Captured::Seq(&actuals[..take])));
            }
            if matches_children(remaining, &actuals[take..], bound) {
                return true;
            }
            bound.truncate(mark);
        }
        return false;
    }

    let Some((child, rest)) = actuals.split_first() else {
        return false;
    };
    let mark = bound.len();
    if matches_target(first, Target::from_child(child), bound)
        && matches_children(remaining, rest, bound)
    {
        true
    } else {
        bound.truncate(mark);
        false
    }
}
