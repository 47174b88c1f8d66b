use std::path::PathBuf;

use clap::Parser;

use crate::diagnostic::Severity;

#[derive(Parser, Debug)]
#[command(
    name = "nodecop",
    version,
    about = "Pattern-driven checks over Ruby syntax trees"
)]
pub struct Args {
    /// Files or directories to lint
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "quiet"])]
    pub format: String,

    /// Run only the specified cops (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Exclude the specified cops (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub except: Vec<String>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// List all registered cop names, one per line, then exit
    #[arg(long)]
    pub list_cops: bool,

    /// Read source from stdin, use PATH for display and config matching
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<PathBuf>,

    /// Minimum severity for a non-zero exit code (convention, warning, error, fatal, or C/W/E/F)
    #[arg(long, value_name = "SEVERITY", default_value = "convention")]
    pub fail_level: String,

    /// Stop each file at its first offense and skip remaining files once one is found
    #[arg(short = 'F', long)]
    pub fail_fast: bool,
}

impl Args {
    /// Parse `--fail-level`. Returns `None` for an unrecognized value.
    pub fn fail_level(&self) -> Option<Severity> {
        Severity::from_str(&self.fail_level)
    }
}
