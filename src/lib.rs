pub mod cli;
pub mod config;
pub mod cop;
pub mod diagnostic;
pub mod formatter;
pub mod fs;
pub mod linter;
pub mod node_pattern;
pub mod parse;
pub mod runner;
pub mod tree;

#[cfg(test)]
pub mod testutil;

use std::io::Read;

use anyhow::{Context, Result, bail};

use cli::Args;
use config::load_config;
use diagnostic::{Diagnostic, Severity};
use formatter::create_formatter;
use fs::discover_files;
use linter::{LintContext, LintResult, lint_source, run_linter};
use parse::source::SourceFile;

/// Run the linter. Returns the exit code: 0 = clean, 1 = offenses at or
/// above the fail level (or an internal cop error).
pub fn run(args: Args) -> Result<i32> {
    let Some(fail_level) = args.fail_level() else {
        bail!("invalid --fail-level: {}", args.fail_level);
    };

    let target_dir = args.paths.first().map(|p| {
        if p.is_file() {
            p.parent().unwrap_or(p)
        } else {
            p.as_path()
        }
    });
    let config_start = std::time::Instant::now();
    let config = load_config(args.config.as_deref(), target_dir)?;

    if args.debug {
        eprintln!("debug: config loading: {:.0?}", config_start.elapsed());
        match config.config_path() {
            Some(path) => eprintln!("debug: config loaded from: {}", path.display()),
            None => eprintln!("debug: no config file found"),
        }
        eprintln!("debug: global excludes: {:?}", config.global_excludes());
    }

    let ctx = LintContext::new(&config, &args)?;

    // --list-cops: print all registered cop names and exit
    if args.list_cops {
        let mut names = ctx.runner().registry().names();
        names.sort_unstable();
        for name in names {
            println!("{name}");
        }
        return Ok(0);
    }

    if args.debug {
        eprintln!(
            "debug: {} cops registered, {} active",
            ctx.runner().registry().len(),
            ctx.active_cop_names().len()
        );
    }

    cop::walker::quiet_cop_panics(args.debug);

    // --stdin: read from stdin and lint a single file
    let result = if let Some(display_path) = &args.stdin {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        let source = SourceFile::from_string(display_path.clone(), input);
        lint_source(&source, &ctx, &args)
    } else {
        let files = discover_files(&args.paths, &config)?;
        if args.debug {
            eprintln!("debug: {} files to lint", files.len());
        }
        run_linter(&files, &ctx, &args)
    };

    report(&result, &args.format)?;
    Ok(exit_code(&result.diagnostics, fail_level))
}

fn report(result: &LintResult, format: &str) -> Result<()> {
    create_formatter(format)
        .print(&result.diagnostics, result.file_count)
        .context("failed to write output")
}

/// Internal errors always fail the run: `Severity::Internal` outranks every
/// configurable level.
pub fn exit_code(diagnostics: &[Diagnostic], fail_level: Severity) -> i32 {
    if diagnostics.iter().any(|d| d.severity >= fail_level) {
        1
    } else {
        0
    }
}
