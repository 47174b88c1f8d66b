pub mod pattern;
pub mod registry;
pub mod rspec;
pub mod walker;

use std::collections::HashMap;

use crate::diagnostic::Severity;
use crate::tree::{Node, Range};

pub use pattern::{Anchor, AnchorPart, MessageTemplate, PatternCop};

/// Per-cop configuration extracted from .nodecop.yml.
#[derive(Debug, Clone)]
pub struct CopConfig {
    pub enabled: bool,
    pub severity: Option<Severity>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub options: HashMap<String, serde_yml::Value>,
}

impl Default for CopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            exclude: Vec::new(),
            include: Vec::new(),
            options: HashMap::new(),
        }
    }
}

/// What a cop reports at a node. The runner turns it into a `Diagnostic`
/// by adding the cop name, severity and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offense {
    pub range: Range,
    pub message: String,
}

/// A lint rule. Implementations must be Send + Sync so they can be shared
/// across rayon worker threads.
///
/// A cop sees one node at a time and must not depend on any other cop.
pub trait Cop: Send + Sync {
    /// The fully-qualified cop name, e.g. "RSpec/BeEql".
    fn name(&self) -> &str;

    fn default_severity(&self) -> Severity {
        Severity::Convention
    }

    /// Globs a file must match for this cop to run on it. Empty means every file.
    fn default_include(&self) -> &[String] {
        &[]
    }

    /// Node-based check, called for every node during traversal.
    ///
    /// An `Err` is reported as an internal error for this node; traversal
    /// and the other cops carry on.
    #[allow(unused_variables)]
    fn check_node(&self, node: &Node, config: &CopConfig) -> anyhow::Result<Vec<Offense>> {
        Ok(Vec::new())
    }
}
