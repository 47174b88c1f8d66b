use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::Result;
use rayon::prelude::*;

use crate::cli::Args;
use crate::config::{CopFilterSet, ResolvedConfig};
use crate::cop::CopConfig;
use crate::diagnostic::Diagnostic;
use crate::parse::parse_tree;
use crate::parse::source::SourceFile;
use crate::runner::{RunOptions, Runner};

pub struct LintResult {
    pub diagnostics: Vec<Diagnostic>,
    pub file_count: usize,
}

/// Everything resolved once before files are linted: the frozen runner,
/// per-cop configs and file filters, and the `--only`/`--except` selection.
pub struct LintContext {
    runner: Runner,
    configs: Vec<CopConfig>,
    filters: CopFilterSet,
    selected: Vec<bool>,
}

impl LintContext {
    pub fn new(config: &ResolvedConfig, args: &Args) -> Result<Self> {
        let registry = config.build_registry()?;
        let configs = config.precompute_cop_configs(&registry);
        let filters = config.build_cop_filters(&registry)?;

        // Everything is selected unless --only names a subset; --except wins.
        let mut selected = vec![args.only.is_empty(); registry.len()];
        for (names, select) in [(&args.only, true), (&args.except, false)] {
            for name in names {
                match registry.index_of(name) {
                    Some(idx) => selected[idx] = select,
                    None => eprintln!("warning: unknown cop {name}"),
                }
            }
        }

        Ok(Self {
            runner: Runner::new(registry),
            configs,
            filters,
            selected,
        })
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Names of the cops that survive `--only`/`--except` and `Enabled: false`.
    pub fn active_cop_names(&self) -> Vec<&str> {
        self.runner
            .registry()
            .cops()
            .iter()
            .zip(self.filters.filters())
            .zip(&self.selected)
            .filter(|((_, filter), selected)| **selected && filter.is_enabled())
            .map(|((cop, _), _)| cop.name())
            .collect()
    }

    fn mask_for(&self, path: &Path) -> Vec<bool> {
        let mut mask = self.filters.mask_for(path);
        for (enabled, selected) in mask.iter_mut().zip(&self.selected) {
            *enabled &= *selected;
        }
        mask
    }

    fn lint(&self, source: &SourceFile, stop_after_first: bool, debug: bool) -> Vec<Diagnostic> {
        let mask = self.mask_for(&source.path);
        if !mask.contains(&true) {
            return Vec::new();
        }
        let tree = match parse_tree(source) {
            Ok(tree) => tree,
            Err(e) => {
                if debug {
                    eprintln!("debug: skipping {e:#}");
                }
                return Vec::new();
            }
        };
        let options = RunOptions {
            path: source.path_str(),
            stop_after_first,
            configs: Some(self.configs.as_slice()),
            mask: Some(mask.as_slice()),
        };
        self.runner.run_with(&tree, &options).into_diagnostics()
    }
}

/// Lint a single SourceFile already in memory. Used for --stdin mode.
pub fn lint_source(source: &SourceFile, ctx: &LintContext, args: &Args) -> LintResult {
    let mut diagnostics = ctx.lint(source, args.fail_fast, args.debug);
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    LintResult {
        diagnostics,
        file_count: 1,
    }
}

pub fn run_linter(files: &[PathBuf], ctx: &LintContext, args: &Args) -> LintResult {
    let wall_start = std::time::Instant::now();
    let found_offense = AtomicBool::new(false);
    let skipped = AtomicUsize::new(0);

    let mut diagnostics: Vec<Diagnostic> = files
        .par_iter()
        .flat_map(|path| {
            // --fail-fast: skip remaining files once an offense is found
            if args.fail_fast && found_offense.load(Ordering::Relaxed) {
                skipped.fetch_add(1, Ordering::Relaxed);
                return Vec::new();
            }
            let result = lint_file(path, ctx, args);
            if args.fail_fast && !result.is_empty() {
                found_offense.store(true, Ordering::Relaxed);
            }
            result
        })
        .collect();

    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    if args.debug {
        eprintln!(
            "debug: linted {} files in {:.0?}",
            files.len(),
            wall_start.elapsed()
        );
        let skipped = skipped.load(Ordering::Relaxed);
        if skipped > 0 {
            eprintln!("debug: --fail-fast skipped {skipped} files");
        }
    }

    LintResult {
        diagnostics,
        file_count: files.len(),
    }
}

fn lint_file(path: &Path, ctx: &LintContext, args: &Args) -> Vec<Diagnostic> {
    let source = match SourceFile::from_path(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Vec::new();
        }
    };
    ctx.lint(&source, args.fail_fast, args.debug)
}
