//! Compiler configuration.
//!
//! Holds everything the front-end takes as input besides the source text:
//! the ordered include search path and user-provided constants. A
//! configuration can be built programmatically or loaded from an optional
//! `torth.toml` next to the project.
//!
//! ```toml
//! include-paths = ["lib", "vendor/torth"]
//!
//! [constants]
//! VERSION = "1"
//! PAGE_SIZE = "4096"
//! ```

use crate::ast::Constant;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Ordered list of directories searched for `include "name"`; the first
    /// directory containing `name.torth` wins.
    pub include_paths: Vec<PathBuf>,

    /// User constants, emitted as `%define name value` and pushable by name.
    pub constants: Vec<Constant>,
}

/// Raw TOML shape of a `torth.toml` file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, rename = "include-paths")]
    include_paths: Vec<PathBuf>,
    #[serde(default)]
    constants: std::collections::BTreeMap<String, String>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Append an include search path (builder pattern).
    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Append multiple include search paths.
    pub fn with_include_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_paths.extend(paths);
        self
    }

    /// Add a user constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.push(Constant::new(name, value));
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|e| format!("Invalid config: {}", e))?;
        Ok(CompilerConfig {
            include_paths: raw.include_paths,
            constants: raw
                .constants
                .into_iter()
                .map(|(name, value)| Constant::new(name, value))
                .collect(),
        })
    }

    /// Load a configuration file from disk.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// The search paths to use for a given root source file: configured
    /// paths first, then the source's own directory and its `lib/`
    /// subdirectory as fallbacks.
    pub fn search_paths_for(&self, source_path: &Path) -> Vec<PathBuf> {
        let mut paths = self.include_paths.clone();
        let source_dir = source_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        paths.push(source_dir.clone());
        paths.push(source_dir.join("lib"));
        paths
    }
}
