//! Configuration file loading for fieldfix.
//!
//! Discovers and loads `fieldfix.toml` from the repository root and merges it
//! with an optional rules file and CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fieldfix_core::settings::{RunSettings, StoreSettings};
use fieldfix_types::{ReplacementRule, RuleSet, ValidationRule};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "fieldfix.toml";

/// Top-level configuration from fieldfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldfixConfig {
    /// Where the tracker lives and how to talk to it.
    pub server: ServerConfig,

    pub run: RunConfig,

    /// Replacement rules applied before any rules file or CLI rules.
    pub replacements: Vec<ReplacementRule>,

    /// Validation rules checked before any rules file or CLI rules.
    pub tests: Vec<ValidationRule>,
}

/// Server section of the config. The API token is never read from here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub timeout_secs: Option<u64>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dry_run: bool,
}

/// Discover the fieldfix.toml config file.
///
/// Returns `None` if no config file is found in `repo_root`.
pub fn discover_config(repo_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = repo_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<FieldfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<FieldfixConfig> {
    let config: FieldfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from repo root, or return default if not found.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<FieldfixConfig> {
    match discover_config(repo_root) {
        Some(path) => load_config(&path),
        None => Ok(FieldfixConfig::default()),
    }
}

/// Load a rules file holding only `[[replacements]]` and `[[tests]]`.
pub fn load_rules(path: &Utf8Path) -> anyhow::Result<RuleSet> {
    let contents = fs::read_to_string(path).with_context(|| format!("read rules file {}", path))?;
    let rules: RuleSet = toml::from_str(&contents)
        .context("invalid TOML")
        .with_context(|| format!("parse rules file {}", path))?;
    debug!(
        replacements = rules.replacements.len(),
        tests = rules.tests.len(),
        "loaded rules from {}",
        path
    );
    Ok(rules)
}

/// Values given on the command line for a run.
#[derive(Debug, Clone, Default)]
pub struct RunArgsView {
    pub query: String,
    pub rules: RuleSet,
    pub dry_run: bool,
    pub server: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
}

/// Fully merged settings for one run.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub run: RunSettings,
    pub store: StoreSettings,
}

/// Builder for merging config file, rules file and CLI arguments.
pub struct ConfigMerger {
    config: FieldfixConfig,
    rules: RuleSet,
}

impl ConfigMerger {
    pub fn new(config: FieldfixConfig) -> Self {
        let rules = RuleSet {
            replacements: config.replacements.clone(),
            tests: config.tests.clone(),
        };
        Self { config, rules }
    }

    /// Append a rules file after the config file's own rules.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Rules gathered so far, extended by the CLI rules.
    pub fn merge_rules(self, cli_rules: RuleSet) -> RuleSet {
        let mut rules = self.rules;
        rules.extend(cli_rules);
        rules
    }

    /// Merge with run command CLI arguments.
    ///
    /// Rule lists extend, scalars given on the CLI override the file, and
    /// `dry_run` is on when either side asks for it.
    pub fn merge_run_args(self, cli: RunArgsView) -> MergedConfig {
        let server = self.config.server.clone();
        let dry_run = cli.dry_run || self.config.run.dry_run;
        let rules = self.merge_rules(cli.rules);

        let defaults = StoreSettings::default();
        let store = StoreSettings {
            server: cli.server.or(server.url).unwrap_or_default(),
            username: cli.username.or(server.username),
            token: cli.token,
            timeout_secs: server.timeout_secs.unwrap_or(defaults.timeout_secs),
            page_size: server.page_size.unwrap_or(defaults.page_size),
        };

        MergedConfig {
            run: RunSettings {
                query: cli.query,
                replacements: rules.replacements,
                tests: rules.tests,
                dry_run,
            },
            store,
        }
    }
}
