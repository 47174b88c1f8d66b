//! Declarative cops: a compiled NodePattern, a message template and an anchor
//! saying which part of the match the offense points at.

use std::fmt;
use std::str::FromStr;

use super::registry::RegistryError;
use super::{Cop, CopConfig, Offense};
use crate::diagnostic::Severity;
use crate::node_pattern::{Captures, NodePattern};
use crate::tree::{Node, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPart {
    /// The whole expression.
    Expression,
    /// The selector token (method name) of a call, or the expression when
    /// the node has none.
    Selector,
}

/// Which node an offense is reported on: the matched node itself, or a
/// named capture.
///
/// Parsed from `expression`, `selector`, `NAME`, `NAME.expression` or
/// `NAME.selector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub capture: Option<String>,
    pub part: AnchorPart,
}

impl Anchor {
    pub fn expression() -> Self {
        Self {
            capture: None,
            part: AnchorPart::Expression,
        }
    }

    pub fn selector() -> Self {
        Self {
            capture: None,
            part: AnchorPart::Selector,
        }
    }

    pub fn capture(name: impl Into<String>, part: AnchorPart) -> Self {
        Self {
            capture: Some(name.into()),
            part,
        }
    }

    /// Resolve against a match. Falls back to `matched` when the capture is
    /// unbound or did not capture a node.
    pub fn range(&self, matched: &Node, captures: &Captures<'_, '_>) -> Range {
        let target = self
            .capture
            .as_deref()
            .and_then(|name| captures.get(name))
            .and_then(|c| c.as_node())
            .unwrap_or(matched);
        match self.part {
            AnchorPart::Expression => target.range(),
            AnchorPart::Selector => target.selector().unwrap_or_else(|| target.range()),
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::expression()
    }
}

fn parse_part(s: &str) -> Option<AnchorPart> {
    match s {
        "expression" => Some(AnchorPart::Expression),
        "selector" => Some(AnchorPart::Selector),
        _ => None,
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty anchor".to_string());
        }
        if let Some(part) = parse_part(s) {
            return Ok(Self {
                capture: None,
                part,
            });
        }
        let (name, part) = match s.split_once('.') {
            Some((name, part)) => match parse_part(part) {
                Some(p) => (name, p),
                None => return Err(format!("unknown anchor part `{part}`")),
            },
            None => (s, AnchorPart::Expression),
        };
        if name.is_empty() {
            return Err(format!("missing capture name in anchor `{s}`"));
        }
        Ok(Self::capture(name, part))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = match self.part {
            AnchorPart::Expression => "expression",
            AnchorPart::Selector => "selector",
        };
        match &self.capture {
            Some(name) => write!(f, "{name}.{part}"),
            None => f.write_str(part),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Capture(String),
}

/// Offense message with `%{name}` placeholders for captures. `%%` is a
/// literal percent sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = template;

        while let Some(idx) = rest.find('%') {
            text.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            if let Some(stripped) = after.strip_prefix('%') {
                text.push('%');
                rest = stripped;
            } else if let Some(body) = after.strip_prefix('{') {
                match body.find('}') {
                    Some(close) => {
                        if !text.is_empty() {
                            segments.push(Segment::Text(std::mem::take(&mut text)));
                        }
                        segments.push(Segment::Capture(body[..close].to_string()));
                        rest = &body[close + 1..];
                    }
                    None => {
                        // Unclosed placeholder stays literal
                        text.push('%');
                        rest = after;
                    }
                }
            } else {
                text.push('%');
                rest = after;
            }
        }
        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Self { segments }
    }

    /// Capture names referenced by placeholders.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Render with captured values. A placeholder whose capture is unbound
    /// in this match renders as nothing.
    pub fn render(&self, captures: &Captures<'_, '_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Capture(name) => {
                    if let Some(value) = captures.get(name) {
                        out.push_str(&value.to_string());
                    }
                }
            }
        }
        out
    }
}

/// A cop defined entirely by a pattern.
#[derive(Debug)]
pub struct PatternCop {
    name: String,
    pattern: NodePattern,
    message: MessageTemplate,
    anchor: Anchor,
    severity: Severity,
    include: Vec<String>,
}

impl PatternCop {
    /// Compile and validate. Every placeholder in `message` and the anchor's
    /// capture must name a capture the pattern defines.
    pub fn new(
        name: &str,
        pattern_spec: &str,
        message: &str,
        anchor: Anchor,
    ) -> Result<Self, RegistryError> {
        let pattern =
            NodePattern::compile(pattern_spec).map_err(|error| RegistryError::InvalidPattern {
                cop: name.to_string(),
                error,
            })?;
        let message = MessageTemplate::parse(message);

        let referenced = message.placeholders().chain(anchor.capture.as_deref());
        for capture in referenced {
            if !pattern.has_capture(capture) {
                return Err(RegistryError::UnknownCapture {
                    cop: name.to_string(),
                    capture: capture.to_string(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            pattern,
            message,
            anchor,
            severity: Severity::Convention,
            include: Vec::new(),
        })
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn pattern(&self) -> &NodePattern {
        &self.pattern
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }
}

impl Cop for PatternCop {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn default_include(&self) -> &[String] {
        &self.include
    }

    fn check_node(&self, node: &Node, _config: &CopConfig) -> anyhow::Result<Vec<Offense>> {
        let Some(captures) = self.pattern.matches(node) else {
            return Ok(Vec::new());
        };
        Ok(vec![Offense {
            range: self.anchor.range(node, &captures),
            message: self.message.render(&captures),
        }])
    }
}
