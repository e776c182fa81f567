// Runtime configuration
//
// Loaded from an optional TOML file (ACCOUNTS_CONFIG, default config.toml)
// and then overridden by ACCOUNTS_* environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ConfigError, StoreError};
use crate::store::{AccountStore, MemoryAccountStore, SqliteAccountStore};

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Insert a few sample accounts at startup
    #[serde(default)]
    pub seed: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_path: default_database_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> PathBuf {
    PathBuf::from("accounts.db")
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StoreConfig {
    /// Open the configured backend
    pub fn open(&self) -> Result<Arc<dyn AccountStore>, StoreError> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryAccountStore::new())),
            StoreBackend::Sqlite if self.database_path == Path::new(":memory:") => {
                Ok(Arc::new(SqliteAccountStore::open_in_memory()?))
            }
            StoreBackend::Sqlite => Ok(Arc::new(SqliteAccountStore::open(&self.database_path)?)),
        }
    }
}

impl AppConfig {
    /// `.env` + config file + environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var("ACCOUNTS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = Self::from_file_or_default(&path)?;
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// A missing file yields the defaults; an unreadable or invalid one is an error
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `ACCOUNTS_*` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ACCOUNTS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ACCOUNTS_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ACCOUNTS_PORT",
                value: port,
            })?;
        }
        if let Some(backend) = lookup("ACCOUNTS_STORE") {
            self.store.backend = match backend.to_ascii_lowercase().as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "memory" => StoreBackend::Memory,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ACCOUNTS_STORE",
                        value: backend,
                    })
                }
            };
        }
        if let Some(path) = lookup("ACCOUNTS_DATABASE") {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(seed) = lookup("ACCOUNTS_SEED") {
            self.seed = match seed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ACCOUNTS_SEED",
                        value: seed,
                    })
                }
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
        assert_eq!(cfg.store.database_path, PathBuf::from("accounts.db"));
        assert!(!cfg.seed);
    }

    #[test]
    fn test_parse_toml() {
        let cfg = AppConfig::from_toml(
            r#"
            seed = true

            [server]
            port = 9000

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert!(cfg.seed);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml("[store]\nbackend = \"postgres\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let cfg = AppConfig::from_file_or_default("/nonexistent/accounts-config.toml").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(env(&[
            ("ACCOUNTS_HOST", "0.0.0.0"),
            ("ACCOUNTS_PORT", "3000"),
            ("ACCOUNTS_STORE", "Memory"),
            ("ACCOUNTS_DATABASE", "/tmp/bank.db"),
            ("ACCOUNTS_SEED", "yes"),
        ]))
        .unwrap();

        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.store.database_path, PathBuf::from("/tmp/bank.db"));
        assert!(cfg.seed);
    }

    #[test]
    fn test_bad_override_values() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_overrides(env(&[("ACCOUNTS_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "ACCOUNTS_PORT", .. }));

        let err = cfg.apply_overrides(env(&[("ACCOUNTS_SEED", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "ACCOUNTS_SEED", .. }));
    }

    #[test]
    fn test_open_in_memory_backends() {
        for backend in [StoreBackend::Memory, StoreBackend::Sqlite] {
            let cfg = StoreConfig {
                backend,
                database_path: PathBuf::from(":memory:"),
            };
            let store = cfg.open().unwrap();
            assert_eq!(store.count().unwrap(), 0);
        }
    }
}
