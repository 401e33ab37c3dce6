//! CLI configuration loaded from ~/.tonec/config.yaml.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dsl::Compilation;

/// Defaults for the `tonec` command. Flags given on the command line win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Reject compiled output longer than this many characters. None = no limit.
    #[serde(default)]
    pub max_output_len: Option<usize>,
    /// Print the JSON result object instead of plain text.
    #[serde(default)]
    pub json: bool,
    /// Print the derivation tree after compiling.
    #[serde(default)]
    pub show_tree: bool,
}

impl Config {
    /// Standard config path.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".tonec");
        path.push("config.yaml");
        path
    }

    /// Load from the standard path, falling back to defaults when it is absent.
    pub fn load() -> Result<Self, io::Error> {
        Self::load_from(&Self::default_path())
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Whether `output` fits the configured length limit.
    pub fn allows(&self, output: &str) -> bool {
        self.max_output_len
            .map_or(true, |max| output.chars().count() <= max)
    }

    /// Withhold a result longer than the limit. Returns true if it was withheld.
    pub fn enforce(&self, result: &mut Compilation) -> bool {
        let too_long = result
            .final_result
            .as_deref()
            .is_some_and(|output| !self.allows(output));
        if too_long {
            result.final_result = None;
        }
        too_long
    }
}
