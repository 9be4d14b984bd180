//! Configuration loading from deadstore.toml.
//!
//! ```toml
//! ignore = ["_guard", "tmp*"]
//! exclude = ["generated"]
//! verbose = false
//!
//! [output]
//! format = "json"
//! ```

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{DeadstoreError, IoResultExt};

pub const CONFIG_FILE: &str = "deadstore.toml";

/// Main configuration structure for deadstore.toml.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeadstoreConfig {
    /// Variable names or patterns whose findings are dropped.
    pub ignore: Option<Vec<String>>,
    /// Directory names skipped during file discovery.
    pub exclude: Option<Vec<String>>,
    /// Print skip statistics with the report.
    pub verbose: Option<bool>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl DeadstoreConfig {
    /// Whether the configured output format is JSON.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from `root/deadstore.toml` if it exists.
pub fn load_config(root: &Path) -> Result<Option<DeadstoreConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg = toml::from_str(&content)
        .map_err(|e| DeadstoreError::config(&path, e.to_string()))?;
    Ok(Some(cfg))
}

/// First config found in `candidates`, in order.
pub fn find_config<'a>(
    candidates: impl IntoIterator<Item = &'a Path>,
) -> Result<Option<DeadstoreConfig>> {
    for dir in candidates {
        if let Some(cfg) = load_config(dir)? {
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}
