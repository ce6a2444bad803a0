/// Configuration loading from proofgate.json with a local overlay
///
/// Two files are considered: a committed `proofgate.json` with portable
/// defaults and an optional, git-ignored `proofgate.local.json` sibling with
/// machine-specific overrides. Objects merge key by key, recursively; any
/// other value in the overlay replaces the base value.
use crate::config::types::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "proofgate.json";
pub const LOCAL_CONFIG_FILE: &str = "proofgate.local.json";

/// Required external paths
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory holding one subfolder per book
    #[serde(default)]
    pub books_root: Option<PathBuf>,
    /// Root directory holding script folders (e.g. `rule-based/`)
    #[serde(default)]
    pub scripts_root: Option<PathBuf>,
}

/// Interpreter binaries for the two script kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_shell() -> String {
    "zsh".to_string()
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            shell: default_shell(),
        }
    }
}

/// Full merged configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    /// Display names of scripts whose warnings never gate a run
    #[serde(default)]
    pub informational: BTreeSet<String>,
    #[serde(default)]
    pub interpreters: InterpreterConfig,
}

impl PipelineConfig {
    /// Load configuration. `explicit` wins; otherwise `./proofgate.json`,
    /// then `$HOME/.config/proofgate/proofgate.json`. A missing file yields
    /// the defaults - required values are only enforced where they are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base_path = match explicit {
            Some(p) => {
                if !p.exists() {
                    return Err(PipelineError::Config(format!(
                        "Missing config file: {}",
                        p.display()
                    )));
                }
                Some(p.to_path_buf())
            }
            None => Self::candidate_paths().into_iter().find(|p| p.exists()),
        };

        let Some(base_path) = base_path else {
            log::debug!("no config file found, using defaults");
            return Ok(Self::default());
        };

        Self::load_from(&base_path)
    }

    /// Load one config file plus its local overlay, deep-merged.
    pub fn load_from(base_path: &Path) -> Result<Self> {
        let base: serde_json::Value = read_json(base_path)?;

        let local_path = base_path.with_file_name(LOCAL_CONFIG_FILE);
        let merged = if local_path.exists() {
            let local: serde_json::Value = read_json(&local_path)?;
            deep_merge(base, local)
        } else {
            base
        };

        serde_json::from_value(merged).map_err(|e| {
            PipelineError::Config(format!("Invalid config {}: {}", base_path.display(), e))
        })
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("proofgate")
                    .join(CONFIG_FILE),
            );
        }
        candidates
    }

    /// The books root, with the CLI override applied. Missing everywhere is
    /// a configuration error naming the key.
    pub fn books_root(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        resolve_root(cli_override, self.paths.books_root.as_deref(), "paths.books_root")
    }

    /// The scripts root, with the CLI override applied.
    pub fn scripts_root(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        resolve_root(
            cli_override,
            self.paths.scripts_root.as_deref(),
            "paths.scripts_root",
        )
    }
}

fn resolve_root(
    cli_override: Option<&Path>,
    configured: Option<&Path>,
    key: &str,
) -> Result<PathBuf> {
    let path = cli_override
        .or(configured)
        .ok_or_else(|| PipelineError::Config(format!("Missing required config key: {}", key)))?;
    if !path.is_dir() {
        return Err(PipelineError::Config(format!(
            "Configured {} is not a directory: {}",
            key,
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| PipelineError::Config(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Deep-merge `overlay` into `base`. Objects merge recursively; any other
/// overlay value replaces the base value.
fn deep_merge(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    match (base, overlay) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.remove(&key) {
                    Some(existing) => {
                        base_map.insert(key, deep_merge(existing, value));
                    }
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
            serde_json::Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
