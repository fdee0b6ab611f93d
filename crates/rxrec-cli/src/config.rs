//! The `rxrec.toml` configuration file.
//!
//! Lookup order: `--config`, then `RXREC_CONFIG`, then `./rxrec.toml`, then
//! `rxrec.toml` in the user configuration directory. When none is found the
//! built-in defaults apply. Unknown keys are rejected.
//!
//! ```toml
//! [reconcile]
//! source = "input/meds-ssa.csv"
//! output_dir = "output"
//!
//! [reconcile.matching]
//! local = { threshold = 85, scorer = "token_set_ratio" }
//!
//! [ops]
//! server_name = "chiapas"
//! base_path = "~/code/pih"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rxrec_ingest::{DictionaryLayout, LocalLayout, SourceLayout};
use rxrec_model::ReconcileOptions;
use rxrec_ops::OpsConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "RXREC_CONFIG";

pub const CONFIG_FILE_NAME: &str = "rxrec.toml";

/// Everything the binary can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub reconcile: ReconcileConfig,
    pub ops: OpsConfig,
}

/// Inputs, outputs and matching settings of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Primary list being reconciled.
    pub source: PathBuf,
    /// Local curated drug list.
    pub local: PathBuf,
    /// Concept dictionary export.
    pub dictionary: PathBuf,
    /// Final match files.
    pub output_dir: PathBuf,
    /// Checkpoints that only matter for resuming.
    pub intermediates_dir: PathBuf,
    pub source_layout: SourceLayout,
    pub local_layout: LocalLayout,
    pub dictionary_layout: DictionaryLayout,
    pub matching: ReconcileOptions,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("input/meds-ssa.csv"),
            local: PathBuf::from("input/HUM_Drug_List-13.csv"),
            dictionary: PathBuf::from("input/meds-ciel.json"),
            output_dir: PathBuf::from("output"),
            intermediates_dir: PathBuf::from("intermediates"),
            source_layout: SourceLayout::default(),
            local_layout: LocalLayout::default(),
            dictionary_layout: DictionaryLayout::default(),
            matching: ReconcileOptions::default(),
        }
    }
}

/// Parse configuration text.
pub fn parse_config(text: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(text)
}

fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "pih", "rxrec").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Pick the configuration file to read.
///
/// Explicit paths (flag or environment) are returned even when missing so
/// that loading reports them; implicit locations only count when present.
pub fn resolve_config_path(
    flag: Option<&Path>,
    env: Option<PathBuf>,
    working_dir: &Path,
    user_path: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    let local = working_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    user_path.filter(|path| path.is_file())
}

/// Read a configuration file.
pub fn load_config_file(path: &Path) -> Result<AppConfig> {
    if !path.is_file() {
        bail!("config file not found: {}", path.display());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parse config {}", path.display()))
}

/// Resolve and read the configuration, falling back to defaults.
pub fn load_config(flag: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    let working_dir = std::env::current_dir().context("determine working directory")?;
    let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    match resolve_config_path(flag, env, &working_dir, user_config_path()) {
        Some(path) => {
            let config = load_config_file(&path)?;
            debug!(path = %path.display(), "loaded configuration");
            Ok((config, Some(path)))
        }
        None => {
            debug!("no configuration file, using defaults");
            Ok((AppConfig::default(), None))
        }
    }
}
