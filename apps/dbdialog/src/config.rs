//! # Configuration
//!
//! `dbdialog.toml` settings. A missing file means defaults; global CLI
//! flags override individual keys.
//!
//! ```toml
//! data_source = "Main"
//! server_objects_path = "server_objects"
//! schema_snapshot = "schema.json"
//! backend = "file"
//! settle_delay_ms = 100
//! ```

use dbdialog_core::DialogError;
use dbdialog_core::conventions::DEFAULT_SETTLE_DELAY_MS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "dbdialog.toml";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Dialog store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// One JSON document per object.
    File,
    /// One redb database per data source.
    Redb,
}

impl Backend {
    pub fn parse(name: &str) -> Result<Self, DialogError> {
        match name.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(DialogError::Config(format!(
                "unknown backend '{}' (expected file or redb)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data source every dialog belongs to.
    pub data_source: String,
    /// Directory holding dialog documents and companion artifacts.
    pub server_objects_path: PathBuf,
    /// JSON snapshot of the database schema.
    pub schema_snapshot: PathBuf,
    /// `file` or `redb`.
    pub backend: String,
    /// Pause after DDL before the schema is re-read.
    pub settle_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_source: "Main".to_string(),
            server_objects_path: PathBuf::from("server_objects"),
            schema_snapshot: PathBuf::from("schema.json"),
            backend: "file".to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, DialogError> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| DialogError::Io(format!("Cannot read config metadata: {}", e)))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(DialogError::Config(format!(
                "config size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| DialogError::Io(format!("Read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, DialogError> {
        let config: Self = toml::from_str(text).map_err(|e| DialogError::Config(e.to_string()))?;
        config.backend()?;
        if config.data_source.trim().is_empty() {
            return Err(DialogError::Config("data_source must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, DialogError> {
        toml::to_string_pretty(self).map_err(|e| DialogError::Serialization(e.to_string()))
    }

    /// Apply the global CLI overrides.
    #[must_use]
    pub fn with_overrides(
        mut self,
        data_source: Option<String>,
        server_objects_path: Option<PathBuf>,
        schema_snapshot: Option<PathBuf>,
        backend: Option<String>,
    ) -> Self {
        if let Some(data_source) = data_source {
            self.data_source = data_source;
        }
        if let Some(path) = server_objects_path {
            self.server_objects_path = path;
        }
        if let Some(path) = schema_snapshot {
            self.schema_snapshot = path;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }

    pub fn backend(&self) -> Result<Backend, DialogError> {
        Backend::parse(&self.backend)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Database file of the redb backend.
    #[must_use]
    pub fn redb_path(&self) -> PathBuf {
        self.server_objects_path
            .join(format!("{}.redb", self.data_source))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml("data_source = \"Shop\"\n").expect("parse");
        assert_eq!(config.data_source, "Shop");
        assert_eq!(config.backend, "file");
        assert_eq!(config.settle_delay(), Duration::from_millis(100));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = AppConfig::from_toml("backend = \"sqlite\"\n").expect_err("backend");
        assert!(matches!(err, DialogError::Config(_)));
    }

    #[test]
    fn empty_data_source_is_rejected() {
        assert!(AppConfig::from_toml("data_source = \" \"\n").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = AppConfig::default().with_overrides(
            Some("Shop".to_string()),
            None,
            Some(PathBuf::from("db/schema.json")),
            Some("redb".to_string()),
        );
        let text = config.to_toml().expect("encode");
        assert_eq!(AppConfig::from_toml(&text).expect("decode"), config);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn redb_path_is_per_data_source() {
        let config = AppConfig::default();
        assert_eq!(config.redb_path(), PathBuf::from("server_objects").join("Main.redb"));
        assert_eq!(Backend::parse("REDB").expect("parse"), Backend::Redb);
    }
}
