pub mod lower;
pub mod source;

use anyhow::{Result, bail};

use crate::tree::Node;
use source::SourceFile;

/// Parse Ruby source bytes using Prism.
///
/// This must be called on the thread that will use the result, since
/// `ParseResult` is `!Send + !Sync`.
pub fn parse_source(source: &[u8]) -> ruby_prism::ParseResult<'_> {
    ruby_prism::parse(source)
}

/// Parse and lower a source file into the engine's tree.
///
/// Files with syntax errors are rejected: the tree Prism recovers is
/// unreliable and yields false positives.
pub fn parse_tree(source: &SourceFile) -> Result<Node> {
    let result = parse_source(source.as_bytes());
    if let Some(error) = result.errors().next() {
        let (line, column) = source.offset_to_line_col(error.location().start_offset());
        bail!(
            "syntax error in {}:{line}:{column}: {}",
            source.path_str(),
            error.message()
        );
    }
    Ok(lower::lower_program(source, &result.node()))
}
