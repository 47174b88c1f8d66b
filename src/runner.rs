//! The frozen rule set and a single-tree analysis pass.

use crate::cop::registry::CopRegistry;
use crate::cop::walker::{ActiveCop, CopWalker};
use crate::cop::{Cop, CopConfig};
use crate::diagnostic::Report;
use crate::tree::Node;

/// Per-run knobs for `Runner::run_with`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// Stamped on every diagnostic.
    pub path: &'a str,
    /// Stop walking after the first node that yields any diagnostic.
    pub stop_after_first: bool,
    /// Per-cop config, indexed like the registry. Missing entries use defaults.
    pub configs: Option<&'a [CopConfig]>,
    /// Per-cop enablement, indexed like the registry. `false` skips the cop.
    pub mask: Option<&'a [bool]>,
}

/// Owns the registry once registration is over. Shared by reference across
/// threads; each `run` only reads it.
pub struct Runner {
    registry: CopRegistry,
    default_config: CopConfig,
}

impl Runner {
    pub fn new(registry: CopRegistry) -> Self {
        Self {
            registry,
            default_config: CopConfig::default(),
        }
    }

    pub fn registry(&self) -> &CopRegistry {
        &self.registry
    }

    pub fn run(&self, root: &Node) -> Report {
        self.run_with(root, &RunOptions::default())
    }

    pub fn run_with(&self, root: &Node, options: &RunOptions<'_>) -> Report {
        let mut walker = CopWalker::new(self.active_cops(options), options.path);
        walker.stop_after_first = options.stop_after_first;
        walker.walk(root);
        Report {
            diagnostics: walker.diagnostics,
        }
    }

    fn active_cops<'a>(&'a self, options: &RunOptions<'a>) -> Vec<ActiveCop<'a>> {
        let mut active = Vec::new();
        for (i, cop) in self.registry.cops().iter().enumerate() {
            if options.mask.and_then(|m| m.get(i)) == Some(&false) {
                continue;
            }
            let config = options
                .configs
                .and_then(|c| c.get(i))
                .unwrap_or(&self.default_config);
            if !config.enabled {
                continue;
            }
            let cop: &dyn Cop = cop.as_ref();
            active.push(ActiveCop {
                cop,
                config,
                severity: config.severity.unwrap_or_else(|| cop.default_severity()),
            });
        }
        active
    }
}
