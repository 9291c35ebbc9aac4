//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/ledgermount/config.toml)
//! 3. Environment variables (LEDGERMOUNT_* prefix)
//!
//! Environment variables take precedence over config file values.
//!
//! Besides paths, the file describes the remote types served by the ledger
//! and the mounts each host type declares:
//!
//! ```toml
//! [[remote_types]]
//! name = "xero.contact"
//! fields = ["Name", "EmailAddress"]
//! required = ["Name"]
//!
//! [[mounts]]
//! host_type = "customer"
//! name = "accounting_contact"
//! remote_type = "xero.contact"
//! external_id_field = "accounting_contact_id"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::declare::MountDeclaration;
use crate::ledger::RecordSchema;

/// Environment variable prefix
const ENV_PREFIX: &str = "LEDGERMOUNT";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (ledger book, host records, log)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Mark ledger connections as sandbox connections
    #[serde(default)]
    pub sandbox_mode: bool,

    /// Log file (defaults to {data_dir}/ledgermount.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Remote types served by the ledger
    #[serde(default)]
    pub remote_types: Vec<RecordSchema>,

    /// Declared mounts
    #[serde(default)]
    pub mounts: Vec<MountDeclaration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sandbox_mode: false,
            log_file: None,
            remote_types: Vec::new(),
            mounts: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LEDGERMOUNT_DATA_DIR, LEDGERMOUNT_SANDBOX_MODE, LEDGERMOUNT_LOG_FILE)
    /// 2. Config file (~/.config/ledgermount/config.toml or LEDGERMOUNT_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from a `--config` path when given, otherwise the default location
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // LEDGERMOUNT_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // LEDGERMOUNT_SANDBOX_MODE
        if let Ok(val) = std::env::var(format!("{}_SANDBOX_MODE", ENV_PREFIX)) {
            self.sandbox_mode = val.eq_ignore_ascii_case("true") || val == "1";
        }

        // LEDGERMOUNT_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() { None } else { Some(PathBuf::from(val)) };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with LEDGERMOUNT_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgermount")
            .join("config.toml")
    }

    /// Get the path to the ledger book
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.json")
    }

    /// Get the path to the host record store
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    /// Get the log file path
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("ledgermount.log"))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledgermount")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "LEDGERMOUNT_DATA_DIR",
        "LEDGERMOUNT_SANDBOX_MODE",
        "LEDGERMOUNT_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.sandbox_mode);
        assert!(config.log_file.is_none());
        assert!(config.remote_types.is_empty());
        assert!(config.mounts.is_empty());
        assert!(config.data_dir.ends_with("ledgermount"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/ledgermount"),
            ..Config::default()
        };

        assert_eq!(config.ledger_path(), PathBuf::from("/data/ledgermount/ledger.json"));
        assert_eq!(config.records_path(), PathBuf::from("/data/ledgermount/records.json"));
        assert_eq!(config.log_path(), PathBuf::from("/data/ledgermount/ledgermount.log"));

        let config = Config {
            log_file: Some(PathBuf::from("/var/log/lm.log")),
            ..config
        };
        assert_eq!(config.log_path(), PathBuf::from("/var/log/lm.log"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LEDGERMOUNT_DATA_DIR", "/tmp/ledgermount-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/ledgermount-test"));
    }

    #[test]
    fn test_env_override_sandbox_mode() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LEDGERMOUNT_SANDBOX_MODE", "true");
        config.apply_env_overrides();
        assert!(config.sandbox_mode);

        env::set_var("LEDGERMOUNT_SANDBOX_MODE", "0");
        config.apply_env_overrides();
        assert!(!config.sandbox_mode);
    }

    #[test]
    fn test_env_override_log_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LEDGERMOUNT_LOG_FILE", "/tmp/lm.log");
        config.apply_env_overrides();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/lm.log")));

        // Empty string clears it
        env::set_var("LEDGERMOUNT_LOG_FILE", "");
        config.apply_env_overrides();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_load_from_str_with_mounts() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            sandbox_mode = true

            [[remote_types]]
            name = "xero.contact"
            fields = ["Name", "EmailAddress"]
            required = ["Name"]

            [[mounts]]
            host_type = "customer"
            name = "accounting_contact"
            remote_type = "xero.contact"
            external_id_field = "accounting_contact_id"

            [mounts.to_remote]
            Name = "name"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert!(config.sandbox_mode);
        assert_eq!(config.remote_types[0].required, vec!["Name".to_string()]);
        assert_eq!(config.mounts.len(), 1);
        assert_eq!(config.mounts[0].to_remote.get("Name").unwrap(), "name");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            sandbox_mode: true,
            log_file: None,
            remote_types: vec![RecordSchema::new("xero.contact", &["Name"])],
            mounts: Vec::new(),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert!(loaded.sandbox_mode);
        assert_eq!(loaded.remote_types, config.remote_types);
        assert!(loaded.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("LEDGERMOUNT_DATA_DIR", temp_dir.path().join("data"));

        let config = Config::load_from_path(&temp_dir.path().join("absent.toml")).unwrap();
        assert!(!config.sandbox_mode);
        assert!(config.mounts.is_empty());
    }
}
