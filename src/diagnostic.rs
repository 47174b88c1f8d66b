use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Convention,
    Warning,
    Error,
    Fatal,
    /// A cop failed while inspecting a node. Never produced by a cop itself.
    Internal,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Convention => 'C',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
            Severity::Internal => 'I',
        }
    }

    pub fn from_str(s: &str) -> Option<Severity> {
        match s.to_lowercase().as_str() {
            "convention" | "c" => Some(Severity::Convention),
            "warning" | "w" => Some(Severity::Warning),
            "error" | "e" => Some(Severity::Error),
            "fatal" | "f" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Location {
    /// 1-indexed line number
    pub line: usize,
    /// 0-indexed column (character offset within the line)
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub location: Location,
    pub end: Location,
    pub severity: Severity,
    pub cop_name: String,
    pub message: String,
}

impl Diagnostic {
    pub fn sort_key(&self) -> (&str, usize, usize) {
        (&self.path, self.location.line, self.location.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}: {}",
            self.path,
            self.location.line,
            self.location.column,
            self.severity,
            self.cop_name,
            self.message,
        )
    }
}

/// Diagnostics for one analyzed unit, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics produced because a cop failed, rather than real offenses.
    pub fn internal_errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Internal)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(path: &str, line: usize, severity: Severity) -> Diagnostic {
        Diagnostic {
            path: path.to_string(),
            location: Location { line, column: 0 },
            end: Location { line, column: 1 },
            severity,
            cop_name: "X/Y".to_string(),
            message: "m".to_string(),
        }
    }

    #[test]
    fn severity_letters() {
        assert_eq!(Severity::Convention.letter(), 'C');
        assert_eq!(Severity::Warning.letter(), 'W');
        assert_eq!(Severity::Error.letter(), 'E');
        assert_eq!(Severity::Fatal.letter(), 'F');
        assert_eq!(Severity::Internal.letter(), 'I');
    }

    #[test]
    fn severity_from_str() {
        assert_eq!(Severity::from_str("convention"), Some(Severity::Convention));
        assert_eq!(Severity::from_str("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::from_str("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::from_str("F"), Some(Severity::Fatal));
        // Internal is reserved for engine failures and cannot be configured
        assert_eq!(Severity::from_str("internal"), None);
        assert_eq!(Severity::from_str("unknown"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Convention < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
        assert!(Severity::Fatal < Severity::Internal);
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic {
            path: "foo_spec.rb".to_string(),
            location: Location { line: 3, column: 5 },
            end: Location { line: 3, column: 8 },
            severity: Severity::Convention,
            cop_name: "RSpec/BeEql".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(format!("{d}"), "foo_spec.rb:3:5: C: RSpec/BeEql: bad");
    }

    #[test]
    fn diagnostic_sort_key() {
        let d1 = diag("a.rb", 1, Severity::Convention);
        let d2 = diag("a.rb", 2, Severity::Convention);
        let d3 = diag("b.rb", 1, Severity::Convention);
        assert!(d1.sort_key() < d2.sort_key());
        assert!(d2.sort_key() < d3.sort_key());
    }

    #[test]
    fn report_internal_errors() {
        let mut report = Report::new();
        report.push(diag("a.rb", 1, Severity::Convention));
        report.push(diag("a.rb", 2, Severity::Internal));
        assert_eq!(report.len(), 2);
        assert_eq!(report.internal_errors().count(), 1);
        assert_eq!((&report).into_iter().count(), 2);
    }
}
