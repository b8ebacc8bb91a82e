//! Configuration for caseboard services.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`CASEBOARD__` prefix, `__` separator)
//! 2. Config file (`caseboard.toml`)
//! 3. Defaults

use serde::Deserialize;

/// Connection settings for the external graph engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Database name the board lives in.
    #[serde(default = "default_db_name")]
    pub db_name: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            db_name: default_db_name(),
        }
    }
}

/// Top-level board client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    /// Root directory holding versioned catalog folders (e.g. "db").
    #[serde(default = "default_catalog_root")]
    pub catalog_root: String,

    /// Catalog schema version folder name (e.g. "v0.1").
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Investigation this deployment serves.
    #[serde(default = "default_investigation")]
    pub investigation: String,

    /// Gate for destructive operations (database/investigation
    /// create/delete). Off unless explicitly enabled.
    #[serde(default)]
    pub debug_ops: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            catalog_root: default_catalog_root(),
            schema_version: default_schema_version(),
            investigation: default_investigation(),
            debug_ops: false,
        }
    }
}

impl BoardConfig {
    /// Load configuration from `{file_prefix}.toml` and `CASEBOARD__`
    /// environment variables, falling back to defaults.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("CASEBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "caseboard-dev".to_string()
}

fn default_db_name() -> String {
    "investigation_board".to_string()
}

fn default_catalog_root() -> String {
    "db".to_string()
}

fn default_schema_version() -> String {
    "v0.1".to_string()
}

fn default_investigation() -> String {
    "default".to_string()
}
