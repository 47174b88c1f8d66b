use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};

use crate::config::ResolvedConfig;

/// Collect Ruby files under `paths`. Directories are walked gitignore-aware
/// with AllCops.Exclude applied; explicit files are taken as given.
pub fn discover_files(paths: &[PathBuf], config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_directory(path, config.global_excludes())?);
        } else {
            bail!("path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_directory(dir: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(dir);
    builder.hidden(true).git_ignore(true).git_global(true);
    if !excludes.is_empty() {
        builder.overrides(exclude_overrides(dir, excludes)?);
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.with_context(|| format!("error walking {}", dir.display()))?;
        if entry.file_type().is_some_and(|t| t.is_file()) && is_ruby_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Overrides are whitelists by default; a leading `!` turns each glob into
/// an ignore rule.
fn exclude_overrides(dir: &Path, excludes: &[String]) -> Result<Override> {
    let mut overrides = OverrideBuilder::new(dir);
    for pattern in excludes {
        overrides
            .add(&format!("!{pattern}"))
            .with_context(|| format!("invalid exclude pattern: {pattern}"))?;
    }
    overrides.build().context("failed to build exclude overrides")
}

fn is_ruby_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rb")
}
