use std::collections::HashMap;

use thiserror::Error;

use super::pattern::{Anchor, PatternCop};
use super::Cop;
use crate::node_pattern::PatternError;

/// Registration failures. All of these are detected before any tree is walked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("cop {0} is already registered")]
    DuplicateName(String),
    #[error("invalid pattern for {cop}: {error}")]
    InvalidPattern {
        cop: String,
        #[source]
        error: PatternError,
    },
    /// A message placeholder or anchor names a capture the pattern never binds.
    #[error("{cop} references unknown capture `{capture}`")]
    UnknownCapture { cop: String, capture: String },
}

/// Ordered set of cops. Registration order is the order cops run at each node.
pub struct CopRegistry {
    cops: Vec<Box<dyn Cop>>,
    index: HashMap<String, usize>,
}

impl Default for CopRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CopRegistry {
    pub fn new() -> Self {
        Self {
            cops: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build the default registry with all built-in cops.
    pub fn default_registry() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        super::rspec::register_all(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, cop: Box<dyn Cop>) -> Result<(), RegistryError> {
        let name = cop.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.index.insert(name, self.cops.len());
        self.cops.push(cop);
        Ok(())
    }

    /// Compile `pattern_spec` into a `PatternCop` and register it.
    pub fn register_pattern(
        &mut self,
        rule_id: &str,
        pattern_spec: &str,
        message_template: &str,
        anchor: Anchor,
    ) -> Result<&dyn Cop, RegistryError> {
        if self.index.contains_key(rule_id) {
            return Err(RegistryError::DuplicateName(rule_id.to_string()));
        }
        let cop = PatternCop::new(rule_id, pattern_spec, message_template, anchor)?;
        self.register(Box::new(cop))?;
        let idx = self.cops.len() - 1;
        Ok(&*self.cops[idx])
    }

    pub fn cops(&self) -> &[Box<dyn Cop>] {
        &self.cops
    }

    /// Position of `name` in run order. Per-cop config, filter and mask
    /// slices are indexed the same way.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cops.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.cops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cops.is_empty()
    }
}
