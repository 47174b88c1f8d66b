use super::RSPEC_DEFAULT_INCLUDE;
use crate::cop::pattern::{Anchor, AnchorPart, PatternCop};
use crate::cop::registry::RegistryError;
use crate::cop::{Cop, CopConfig, Offense};
use crate::diagnostic::Severity;
use crate::tree::Node;

pub const NAME: &str = "RSpec/BeEql";

pub const MSG: &str = "Prefer identity comparison over equality comparison for this literal type.";

/// `expect(x).to eql(lit)` where `lit` compares by identity (integers,
/// floats, booleans, symbols) should use `be(lit)`.
///
/// Only positive expectations are flagged: `!eql?` is stricter than
/// `!equal?`. `eq` is left alone since `==` may coerce.
const PATTERN: &str = "(send _ :to $eql=(send nil :eql {true false int float sym}))";

pub struct BeEql {
    matcher: PatternCop,
}

impl BeEql {
    pub fn new() -> Result<Self, RegistryError> {
        let include = RSPEC_DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect();
        let anchor = Anchor::capture("eql", AnchorPart::Selector);
        let matcher = PatternCop::new(NAME, PATTERN, MSG, anchor)?
            .with_severity(Severity::Convention)
            .with_include(include);
        Ok(Self { matcher })
    }
}

impl Cop for BeEql {
    fn name(&self) -> &str {
        NAME
    }

    fn default_severity(&self) -> Severity {
        self.matcher.default_severity()
    }

    fn default_include(&self) -> &[String] {
        self.matcher.default_include()
    }

    fn check_node(&self, node: &Node, config: &CopConfig) -> anyhow::Result<Vec<Offense>> {
        self.matcher.check_node(node, config)
    }
}
