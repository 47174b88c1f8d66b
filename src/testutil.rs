use std::path::PathBuf;

use crate::cop::walker::{ActiveCop, CopWalker};
use crate::cop::{Cop, CopConfig};
use crate::diagnostic::Diagnostic;
use crate::parse::parse_tree;
use crate::parse::source::SourceFile;

/// Generate `offense_fixture` and `no_offense_fixture` tests for a cop from
/// `tests/fixtures/<path>/offense.rb` and `no_offense.rb`.
#[macro_export]
macro_rules! cop_fixture_tests {
    ($cop:expr, $path:literal) => {
        #[test]
        fn offense_fixture() {
            $crate::testutil::assert_cop_offenses(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/tests/fixtures/",
                    $path,
                    "/offense.rb"
                )),
            );
        }

        #[test]
        fn no_offense_fixture() {
            $crate::testutil::assert_cop_no_offenses(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/tests/fixtures/",
                    $path,
                    "/no_offense.rb"
                )),
            );
        }
    };
}

/// An offense a fixture expects, taken from a `^^^ Cop/Name: message` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOffense {
    pub line: usize,
    pub column: usize,
    pub cop_name: String,
    pub message: String,
}

/// Recognize an annotation line: indentation, a run of carets, one space,
/// then `Department/Name: message`. The caret column is the offense column.
///
/// Anything else is source, including Ruby code that happens to contain `^`.
fn annotation(line: &str) -> Option<(usize, &str, &str)> {
    let body = line.trim_start();
    let column = line.len() - body.len();
    let after = body.trim_start_matches('^');
    if after.len() == body.len() {
        return None;
    }
    let (cop_name, message) = after.strip_prefix(' ')?.trim_end().split_once(": ")?;
    if !cop_name.contains('/') || cop_name.contains(' ') {
        return None;
    }
    Some((column, cop_name, message))
}

/// Split a fixture into clean source and expected offenses.
///
/// An annotation refers to the nearest source line above it; line numbers
/// count clean source lines only.
pub fn parse_fixture(raw: &[u8]) -> (Vec<u8>, Vec<ExpectedOffense>) {
    let text = std::str::from_utf8(raw).expect("fixture must be valid UTF-8");
    let mut source_lines: Vec<&str> = Vec::new();
    let mut expected = Vec::new();

    for (idx, line) in text.split('\n').enumerate() {
        let Some((column, cop_name, message)) = annotation(line) else {
            source_lines.push(line);
            continue;
        };
        assert!(
            !source_lines.is_empty(),
            "annotation on fixture line {} has no source line above it: {line:?}",
            idx + 1,
        );
        expected.push(ExpectedOffense {
            line: source_lines.len(),
            column,
            cop_name: cop_name.to_string(),
            message: message.to_string(),
        });
    }

    (source_lines.join("\n").into_bytes(), expected)
}

/// Parse `source_bytes`, walk the tree with a single cop and return the
/// diagnostics in traversal order.
pub fn run_cop(cop: &dyn Cop, source_bytes: &[u8]) -> Vec<Diagnostic> {
    run_cop_with_config(cop, source_bytes, CopConfig::default())
}

/// Run a cop on raw source bytes with a specific config and return diagnostics.
pub fn run_cop_with_config(
    cop: &dyn Cop,
    source_bytes: &[u8],
    config: CopConfig,
) -> Vec<Diagnostic> {
    let source = SourceFile::from_vec(PathBuf::from("test.rb"), source_bytes.to_vec());
    let tree = parse_tree(&source).expect("fixture must be valid Ruby");
    let severity = config.severity.unwrap_or_else(|| cop.default_severity());
    let active = vec![ActiveCop {
        cop,
        config: &config,
        severity,
    }];
    let mut walker = CopWalker::new(active, "test.rb");
    walker.walk(&tree);
    walker.diagnostics
}

/// Run a cop on fixture bytes (with annotations) and assert offenses match.
///
/// Both expected and actual diagnostics are sorted by (line, column) before
/// comparison, so annotation order in the fixture doesn't need to match the
/// cop's emission order.
pub fn assert_cop_offenses(cop: &dyn Cop, fixture_bytes: &[u8]) {
    let (clean_source, mut expected) = parse_fixture(fixture_bytes);
    let mut diagnostics = run_cop(cop, &clean_source);

    expected.sort_by_key(|e| (e.line, e.column));
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    assert_eq!(
        diagnostics.len(),
        expected.len(),
        "Expected {} offense(s) but got {}.\nExpected:\n{}\nActual:\n{}",
        expected.len(),
        diagnostics.len(),
        format_expected(&expected),
        format_diagnostics(&diagnostics),
    );

    for (i, (diag, exp)) in diagnostics.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            (diag.location.line, diag.location.column),
            (exp.line, exp.column),
            "Offense #{}: position mismatch\n  expected: {}:{} {}: {}\n  actual:   {d}",
            i + 1, exp.line, exp.column, exp.cop_name, exp.message,
            d = diag,
        );
        assert_eq!(
            diag.cop_name, exp.cop_name,
            "Offense #{}: cop name mismatch\n  expected: {}\n  actual:   {}",
            i + 1, exp.cop_name, diag.cop_name,
        );
        assert_eq!(
            diag.message, exp.message,
            "Offense #{}: message mismatch for {}\n  expected: {:?}\n  actual:   {:?}",
            i + 1, exp.cop_name, exp.message, diag.message,
        );
    }
}

/// Assert a cop produces no offenses on the given source bytes.
pub fn assert_cop_no_offenses(cop: &dyn Cop, source_bytes: &[u8]) {
    let diagnostics = run_cop(cop, source_bytes);
    assert!(
        diagnostics.is_empty(),
        "Expected no offenses but got {}:\n{}",
        diagnostics.len(),
        format_diagnostics(&diagnostics),
    );
}

fn format_expected(expected: &[ExpectedOffense]) -> String {
    expected
        .iter()
        .map(|e| format!("  {}:{} {}: {}", e.line, e.column, e.cop_name, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_lines() {
        assert_eq!(
            annotation("    ^^^ RSpec/BeEql: Prefer `be`."),
            Some((4, "RSpec/BeEql", "Prefer `be`."))
        );
        assert_eq!(annotation("^ A/B: m"), Some((0, "A/B", "m")));
        assert_eq!(annotation("^^ A/B: a: b"), Some((0, "A/B", "a: b")));
    }

    #[test]
    fn source_lines_are_not_annotations() {
        for line in [
            "",
            "x = a ^ b",
            "/^foo/",
            "^^^RSpec/BeEql: m",
            "^^^ RSpec/BeEql m",
            "^^^ no department: m",
            "^^^ BeEql: m",
        ] {
            assert_eq!(annotation(line), None, "{line:?}");
        }
    }

    #[test]
    fn parse_fixture_strips_annotations() {
        let raw = b"a\n  ^ X/Y: one\n  ^^ X/Z: two\nb\n^ X/Y: three\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"a\nb\n");
        let positions: Vec<(usize, usize)> = expected.iter().map(|e| (e.line, e.column)).collect();
        assert_eq!(positions, vec![(1, 2), (1, 2), (2, 0)]);
        assert_eq!(expected[1].cop_name, "X/Z");
        assert_eq!(expected[2].message, "three");
    }

    #[test]
    fn parse_fixture_keeps_blank_and_trailing_space_lines() {
        let (clean, expected) = parse_fixture(b"\nx = 1  \n^ A/B: m");
        assert_eq!(clean, b"\nx = 1  ");
        assert_eq!(expected[0].line, 2);
    }

    #[test]
    #[should_panic(expected = "has no source line above it")]
    fn parse_fixture_rejects_leading_annotation() {
        parse_fixture(b"^^^ A/B: m\nx = 1\n");
    }

    // ---- run_cop helper tests ----

    #[test]
    fn run_cop_pattern_cop() {
        use crate::cop::pattern::{Anchor, PatternCop};
        let cop = PatternCop::new("Test/Puts", "(send nil :puts ...)", "no puts", Anchor::selector())
            .unwrap();
        let diags = run_cop(&cop, b"x = 1\n  puts x\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].location.line, 2);
        assert_eq!(diags[0].location.column, 2);
        assert_eq!(diags[0].cop_name, "Test/Puts");
        assert_eq!(diags[0].path, "test.rb");
    }

    #[test]
    fn run_cop_with_config_applies_severity() {
        use crate::cop::pattern::{Anchor, PatternCop};
        use crate::diagnostic::Severity;
        let cop = PatternCop::new("Test/Int", "int", "int", Anchor::expression()).unwrap();
        let config = CopConfig {
            severity: Some(Severity::Fatal),
            ..CopConfig::default()
        };
        let diags = run_cop_with_config(&cop, b"1\n", config);
        assert_eq!(diags[0].severity, Severity::Fatal);
    }

    #[test]
    fn assert_cop_offenses_works() {
        use crate::cop::pattern::{Anchor, PatternCop};
        let cop = PatternCop::new("Test/Puts", "(send nil :puts ...)", "no puts", Anchor::selector())
            .unwrap();
        assert_cop_offenses(&cop, b"if x\n  puts 1\n  ^^^^ Test/Puts: no puts\nend\n");
        assert_cop_no_offenses(&cop, b"print 1\n");
    }
}
