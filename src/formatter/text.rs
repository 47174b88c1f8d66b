use std::io::{self, Write};

use crate::diagnostic::Diagnostic;
use crate::formatter::{Formatter, summary_line};

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(
        &self,
        diagnostics: &[Diagnostic],
        file_count: usize,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        for d in diagnostics {
            writeln!(out, "{d}")?;
        }
        writeln!(out, "\n{}", summary_line(file_count, diagnostics.len()))
    }
}
