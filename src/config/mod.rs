use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yml::Value;

use crate::cop::CopConfig;
use crate::cop::pattern::Anchor;
use crate::cop::registry::CopRegistry;
use crate::diagnostic::Severity;

pub const CONFIG_FILE: &str = ".nodecop.yml";

/// A cop defined in the config file by a `Pattern` key.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRule {
    pub name: String,
    pub pattern: String,
    pub message: String,
    pub anchor: Anchor,
}

/// Resolved configuration from .nodecop.yml.
///
/// A single YAML file: AllCops.Exclude plus per-cop
/// Enabled/Severity/Include/Exclude. Entries carrying a `Pattern` define
/// custom cops.
#[derive(Debug)]
pub struct ResolvedConfig {
    config_path: Option<PathBuf>,
    /// Per-cop configs keyed by cop name (e.g. "RSpec/BeEql")
    cop_configs: HashMap<String, CopConfig>,
    global_excludes: Vec<String>,
    /// In file order.
    custom_rules: Vec<CustomRule>,
}

impl ResolvedConfig {
    fn empty() -> Self {
        Self {
            config_path: None,
            cop_configs: HashMap::new(),
            global_excludes: Vec::new(),
            custom_rules: Vec::new(),
        }
    }
}

/// Load config from the given path, or look for `.nodecop.yml` in
/// `target_dir` (the current directory when absent). A missing file means
/// defaults; an explicit `--config` path must exist.
pub fn load_config(path: Option<&Path>, target_dir: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => target_dir.unwrap_or(Path::new(".")).join(CONFIG_FILE),
    };

    if !config_path.exists() {
        return Ok(ResolvedConfig::empty());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    config.config_path = Some(config_path);
    Ok(config)
}

/// Parse config YAML. Cop entries are keys containing `/`; other top-level
/// keys besides AllCops are ignored.
pub fn parse_config(contents: &str) -> Result<ResolvedConfig> {
    let raw: Value = serde_yml::from_str(contents)?;
    let mut config = ResolvedConfig::empty();

    let Value::Mapping(map) = &raw else {
        return Ok(config);
    };

    for (key, value) in map {
        let Some(key_str) = key.as_str() else {
            continue;
        };

        if key_str == "AllCops" {
            if let Some(excludes) = extract_string_list(value, "Exclude") {
                config.global_excludes = excludes;
            }
            continue;
        }

        if key_str.contains('/') {
            let cop_config = parse_cop_config(value);
            if let Some(rule) = custom_rule(key_str, &cop_config)? {
                config.custom_rules.push(rule);
            }
            config.cop_configs.insert(key_str.to_string(), cop_config);
        }
    }

    Ok(config)
}

impl ResolvedConfig {
    /// Directory holding the loaded config file, if one was found.
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_path.as_deref().and_then(Path::parent)
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the resolved config for a specific cop.
    pub fn cop_config(&self, name: &str) -> CopConfig {
        self.cop_configs.get(name).cloned().unwrap_or_default()
    }

    /// Global exclude patterns from AllCops.Exclude.
    pub fn global_excludes(&self) -> &[String] {
        &self.global_excludes
    }

    pub fn custom_rules(&self) -> &[CustomRule] {
        &self.custom_rules
    }

    /// Built-in cops followed by the custom rules, in file order.
    pub fn build_registry(&self) -> Result<CopRegistry> {
        let mut registry =
            CopRegistry::default_registry().context("failed to register built-in cops")?;
        for rule in &self.custom_rules {
            registry
                .register_pattern(&rule.name, &rule.pattern, &rule.message, rule.anchor.clone())
                .with_context(|| format!("failed to register custom cop {}", rule.name))?;
        }
        Ok(registry)
    }

    /// One config per registered cop, indexed like the registry.
    pub fn precompute_cop_configs(&self, registry: &CopRegistry) -> Vec<CopConfig> {
        registry
            .cops()
            .iter()
            .map(|cop| self.cop_config(cop.name()))
            .collect()
    }

    /// Per-cop file filters. A cop's Include falls back to its default include.
    pub fn build_cop_filters(&self, registry: &CopRegistry) -> Result<CopFilterSet> {
        let mut filters = Vec::with_capacity(registry.len());
        for cop in registry.cops() {
            let config = self.cop_configs.get(cop.name());
            let include = match config {
                Some(c) if !c.include.is_empty() => c.include.as_slice(),
                _ => cop.default_include(),
            };
            let exclude = config.map(|c| c.exclude.as_slice()).unwrap_or_default();
            filters.push(CopFilter {
                enabled: config.is_none_or(|c| c.enabled),
                include: build_glob_set(include)
                    .with_context(|| format!("invalid Include for {}", cop.name()))?,
                exclude: build_glob_set(exclude)
                    .with_context(|| format!("invalid Exclude for {}", cop.name()))?,
            });
        }
        Ok(CopFilterSet {
            filters,
            base_dir: self.config_dir().map(Path::to_path_buf),
        })
    }
}

/// Whether one cop runs on a given file.
#[derive(Debug)]
pub struct CopFilter {
    enabled: bool,
    /// `None` means every file.
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl CopFilter {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn matches(&self, path: &Path) -> bool {
        if !self.enabled {
            return false;
        }
        if self.include.as_ref().is_some_and(|g| !g.is_match(path)) {
            return false;
        }
        !self.exclude.as_ref().is_some_and(|g| g.is_match(path))
    }
}

/// File filters for every registered cop, indexed like the registry.
#[derive(Debug)]
pub struct CopFilterSet {
    filters: Vec<CopFilter>,
    base_dir: Option<PathBuf>,
}

impl CopFilterSet {
    /// One filter per registered cop, in registry order.
    pub fn filters(&self) -> &[CopFilter] {
        &self.filters
    }

    /// Enablement mask for `path`, suitable for `RunOptions::mask`.
    pub fn mask_for(&self, path: &Path) -> Vec<bool> {
        let path = self.relative(path);
        self.filters.iter().map(|f| f.matches(&path)).collect()
    }

    /// Globs are written relative to the config directory.
    fn relative(&self, path: &Path) -> PathBuf {
        let path = path.strip_prefix(".").unwrap_or(path);
        if let Some(base) = &self.base_dir {
            if let Ok(rel) = path.strip_prefix(base) {
                return rel.to_path_buf();
            }
            let base = base.strip_prefix(".").unwrap_or(base);
            if !base.as_os_str().is_empty() {
                if let Ok(rel) = path.strip_prefix(base) {
                    return rel.to_path_buf();
                }
            }
        }
        path.to_path_buf()
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob: {pattern}"))?);
    }
    Ok(Some(builder.build()?))
}

fn custom_rule(name: &str, config: &CopConfig) -> Result<Option<CustomRule>> {
    let Some(pattern) = config.options.get("Pattern") else {
        return Ok(None);
    };
    let Some(pattern) = pattern.as_str() else {
        bail!("{name}: Pattern must be a string");
    };
    let Some(message) = config.options.get("Message").and_then(Value::as_str) else {
        bail!("{name}: custom cop needs a Message");
    };
    let anchor = match config.options.get("Anchor") {
        None => Anchor::expression(),
        Some(v) => {
            let Some(s) = v.as_str() else {
                bail!("{name}: Anchor must be a string");
            };
            s.parse::<Anchor>()
                .map_err(|e| anyhow::anyhow!("{name}: invalid Anchor: {e}"))?
        }
    };
    Ok(Some(CustomRule {
        name: name.to_string(),
        pattern: pattern.to_string(),
        message: message.to_string(),
        anchor,
    }))
}

fn parse_cop_config(value: &Value) -> CopConfig {
    let mut config = CopConfig::default();

    if let Value::Mapping(map) = value {
        for (k, v) in map {
            let Some(key) = k.as_str() else {
                continue;
            };
            match key {
                "Enabled" => {
                    if let Some(b) = v.as_bool() {
                        config.enabled = b;
                    }
                }
                "Severity" => {
                    if let Some(s) = v.as_str() {
                        config.severity = Severity::from_str(s);
                    }
                }
                "Exclude" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.exclude = list;
                    }
                }
                "Include" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.include = list;
                    }
                }
                _ => {
                    config.options.insert(key.to_string(), v.clone());
                }
            }
        }
    }

    config
}

fn extract_string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value_to_string_list(value.as_mapping()?.get(Value::String(key.to_string()))?)
}

fn value_to_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Sequence(seq) => Some(
            seq.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        ),
        _ => None,
    }
}
