//! Converter configuration
//!
//! Read from `tanzil2sql.toml`:
//!
//! ```toml
//! [schema]
//! table = "ayaDBTable"
//! surah_column = "surah_number"
//! aya_column = "aya_number"
//! text_column = "text"
//!
//! [output]
//! dir = "."
//! mode = "createTableInsert"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TanzilError, TanzilResult};
use crate::transpiler::{SaveMode, TableSchema};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tanzil2sql.toml";

/// Main converter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Table and column names used in generated SQL
    pub schema: TableSchema,

    /// Where and how scripts are written
    pub output: OutputConfig,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory
    pub dir: PathBuf,

    /// Script shape when none is given on the command line
    pub mode: SaveMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            mode: SaveMode::CreateTableInsert,
        }
    }
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from `explicit` if given, else from the first file in
    /// [`Config::search_paths`] that exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> TanzilResult<Self> {
        Self::load_from(explicit, &Self::search_paths())
    }

    /// [`Config::load`] over an explicit candidate list.
    pub fn load_from(explicit: Option<&Path>, candidates: &[PathBuf]) -> TanzilResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::from_path(path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `./tanzil2sql.toml`, then `<config dir>/tanzil2sql/config.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tanzil2sql").join("config.toml"));
        }
        paths
    }

    pub fn from_path(path: &Path) -> TanzilResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            TanzilError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> TanzilResult<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| TanzilError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Identifiers are pasted into backtick-quoted SQL as-is, so only the
    /// cases that can never work are rejected.
    pub fn validate(&self) -> TanzilResult<()> {
        let TableSchema {
            table,
            surah_column,
            aya_column,
            text_column,
        } = &self.schema;

        for (field, value) in [
            ("table", table),
            ("surah_column", surah_column),
            ("aya_column", aya_column),
            ("text_column", text_column),
        ] {
            if value.trim().is_empty() {
                return Err(TanzilError::Config(format!("schema.{} is empty", field)));
            }
            if value.contains('`') {
                return Err(TanzilError::Config(format!(
                    "schema.{} contains a backtick: '{}'",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the table name
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.config.schema.table = name.into();
        self
    }

    /// Set the surah number column
    pub fn surah_column(mut self, name: impl Into<String>) -> Self {
        self.config.schema.surah_column = name.into();
        self
    }

    /// Set the aya number column
    pub fn aya_column(mut self, name: impl Into<String>) -> Self {
        self.config.schema.aya_column = name.into();
        self
    }

    /// Set the text column
    pub fn text_column(mut self, name: impl Into<String>) -> Self {
        self.config.schema.text_column = name.into();
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.dir = dir.into();
        self
    }

    /// Set the default save mode
    pub fn mode(mut self, mode: SaveMode) -> Self {
        self.config.output.mode = mode;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> TanzilResult<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
