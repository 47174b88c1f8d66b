use std::io::{self, Write};

use serde::Serialize;

use crate::diagnostic::{Diagnostic, Location};
use crate::formatter::Formatter;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: Metadata,
    offenses: Vec<Offense<'a>>,
}

#[derive(Serialize)]
struct Metadata {
    version: &'static str,
    files_inspected: usize,
    offense_count: usize,
}

#[derive(Serialize)]
struct Offense<'a> {
    path: &'a str,
    severity: char,
    cop_name: &'a str,
    message: &'a str,
    location: Span,
}

/// Lines are 1-indexed, columns 0-indexed characters; `last_*` is exclusive.
#[derive(Serialize)]
struct Span {
    start_line: usize,
    start_column: usize,
    last_line: usize,
    last_column: usize,
}

impl Span {
    fn new(begin: Location, end: Location) -> Self {
        Self {
            start_line: begin.line,
            start_column: begin.column,
            last_line: end.line,
            last_column: end.column,
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_to(
        &self,
        diagnostics: &[Diagnostic],
        file_count: usize,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let output = JsonOutput {
            metadata: Metadata {
                version: env!("CARGO_PKG_VERSION"),
                files_inspected: file_count,
                offense_count: diagnostics.len(),
            },
            offenses: diagnostics
                .iter()
                .map(|d| Offense {
                    path: &d.path,
                    severity: d.severity.letter(),
                    cop_name: &d.cop_name,
                    message: &d.message,
                    location: Span::new(d.location, d.end),
                })
                .collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)
    }
}
