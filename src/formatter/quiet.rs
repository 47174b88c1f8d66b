use std::io::{self, Write};

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;
use crate::formatter::text::TextFormatter;

/// Text output, but nothing at all for a clean run.
pub struct QuietFormatter;

impl Formatter for QuietFormatter {
    fn format_to(
        &self,
        diagnostics: &[Diagnostic],
        file_count: usize,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if diagnostics.is_empty() {
            return Ok(());
        }
        TextFormatter.format_to(diagnostics, file_count, out)
    }
}
