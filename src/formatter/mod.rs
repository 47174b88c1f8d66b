pub mod json;
pub mod quiet;
pub mod text;

use std::io::{self, Write};

use crate::diagnostic::Diagnostic;

pub const FORMATS: &[&str] = &["text", "json", "quiet"];

pub trait Formatter {
    fn format_to(
        &self,
        diagnostics: &[Diagnostic],
        file_count: usize,
        out: &mut dyn Write,
    ) -> io::Result<()>;

    fn print(&self, diagnostics: &[Diagnostic], file_count: usize) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.format_to(diagnostics, file_count, &mut lock)?;
        lock.flush()
    }
}

/// Unknown names fall back to text; the CLI restricts values to `FORMATS`.
pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        "quiet" => Box::new(quiet::QuietFormatter),
        _ => Box::new(text::TextFormatter),
    }
}

/// "3 files inspected, 1 offense detected"
pub(crate) fn summary_line(file_count: usize, offense_count: usize) -> String {
    let file_word = if file_count == 1 { "file" } else { "files" };
    let offense_word = if offense_count == 1 {
        "offense"
    } else {
        "offenses"
    };
    format!("{file_count} {file_word} inspected, {offense_count} {offense_word} detected")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};

    pub(super) fn sample(path: &str, line: usize, severity: Severity) -> Diagnostic {
        Diagnostic {
            path: path.to_string(),
            location: Location { line, column: 15 },
            end: Location { line, column: 18 },
            severity,
            cop_name: "RSpec/BeEql".to_string(),
            message: "Prefer identity comparison over equality comparison for this literal type."
                .to_string(),
        }
    }

    #[test]
    fn summary_pluralization() {
        assert_eq!(summary_line(1, 1), "1 file inspected, 1 offense detected");
        assert_eq!(summary_line(0, 0), "0 files inspected, 0 offenses detected");
        assert_eq!(summary_line(2, 3), "2 files inspected, 3 offenses detected");
    }

    #[test]
    fn every_format_renders() {
        let diags = vec![sample("a_spec.rb", 1, Severity::Convention)];
        for name in FORMATS {
            let f = create_formatter(name);
            let mut buf = Vec::new();
            f.format_to(&diags, 1, &mut buf).unwrap();
            assert!(!buf.is_empty(), "{name} produced no output");
        }
    }

    #[test]
    fn unknown_format_falls_back_to_text() {
        let diags = vec![sample("a_spec.rb", 1, Severity::Convention)];
        let mut unknown = Vec::new();
        let mut text = Vec::new();
        create_formatter("progress")
            .format_to(&diags, 1, &mut unknown)
            .unwrap();
        create_formatter("text").format_to(&diags, 1, &mut text).unwrap();
        assert_eq!(unknown, text);
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn diagnostic_strategy() -> impl Strategy<Value = Diagnostic> {
            (
                "[a-z]{1,10}_spec\\.rb",
                1usize..500,
                prop::sample::select(vec![
                    Severity::Convention,
                    Severity::Warning,
                    Severity::Error,
                    Severity::Internal,
                ]),
                "[a-z %{}\"\\\\]{0,30}",
            )
                .prop_map(|(path, line, severity, message)| Diagnostic {
                    message,
                    ..sample(&path, line, severity)
                })
        }

        proptest! {
            #[test]
            fn json_round_trips_counts(
                diagnostics in prop::collection::vec(diagnostic_strategy(), 0..10),
                file_count in 0usize..100,
            ) {
                let mut buf = Vec::new();
                create_formatter("json").format_to(&diagnostics, file_count, &mut buf).unwrap();
                let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
                prop_assert_eq!(
                    parsed["metadata"]["offense_count"].as_u64(),
                    Some(diagnostics.len() as u64)
                );
                prop_assert_eq!(
                    parsed["metadata"]["files_inspected"].as_u64(),
                    Some(file_count as u64)
                );
                let offenses = parsed["offenses"].as_array().unwrap();
                for (o, d) in offenses.iter().zip(&diagnostics) {
                    prop_assert_eq!(o["message"].as_str(), Some(d.message.as_str()));
                }
            }

            #[test]
            fn text_has_one_line_per_diagnostic(
                diagnostics in prop::collection::vec(diagnostic_strategy(), 0..10),
            ) {
                let mut buf = Vec::new();
                create_formatter("text").format_to(&diagnostics, 1, &mut buf).unwrap();
                let out = String::from_utf8(buf).unwrap();
                // diagnostics, blank line, summary
                prop_assert_eq!(out.lines().count(), diagnostics.len() + 2);
            }
        }
    }
}
