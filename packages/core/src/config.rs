//! Runtime application configuration
//!
//! AppConfig is built once at process startup from `TAGSTOCK_*` environment
//! variables. It is NOT persisted; it is rebuilt on every launch.

use crate::services::TagServiceConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3100;
pub const DATABASE_FILE_NAME: &str = "tagstock.db";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the RPC layer is exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `POST /rpc` and `GET /health` on localhost
    Http,
    /// One JSON-RPC object per line on stdin/stdout
    Stdio,
}

impl FromStr for Transport {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Transport::Http),
            "stdio" => Ok(Transport::Stdio),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Repair stale ancestor paths while resolving (TAGSTOCK_FIX_PATH)
    pub fix_path: bool,

    /// RPC transport (TAGSTOCK_TRANSPORT)
    pub transport: Transport,

    /// HTTP port (TAGSTOCK_PORT, default 3100)
    pub port: u16,

    /// Directory holding the libsql database file; in-memory only when unset
    /// (TAGSTOCK_DATA_DIR)
    pub data_dir: Option<PathBuf>,

    /// Seed sample records into empty collections (TAGSTOCK_SEED)
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fix_path: true,
            transport: Transport::Http,
            port: DEFAULT_PORT,
            data_dir: None,
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    /// Build the config from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable lookup
    ///
    /// Unset variables keep their defaults; set but unparsable ones are
    /// rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fix_path = match lookup("TAGSTOCK_FIX_PATH") {
            Some(value) => parse_bool("TAGSTOCK_FIX_PATH", &value)?,
            None => defaults.fix_path,
        };

        let seed_sample_data = match lookup("TAGSTOCK_SEED") {
            Some(value) => parse_bool("TAGSTOCK_SEED", &value)?,
            None => defaults.seed_sample_data,
        };

        let transport = match lookup("TAGSTOCK_TRANSPORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "TAGSTOCK_TRANSPORT",
                value,
            })?,
            None => defaults.transport,
        };

        let port = match lookup("TAGSTOCK_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "TAGSTOCK_PORT",
                value,
            })?,
            None => defaults.port,
        };

        let data_dir = lookup("TAGSTOCK_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            fix_path,
            transport,
            port,
            data_dir,
            seed_sample_data,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport == Transport::Http && self.port == 0 {
            return Err(ConfigError::Invalid(
                "TAGSTOCK_PORT must be non-zero for the HTTP transport".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tag_service_config(&self) -> TagServiceConfig {
        TagServiceConfig {
            fix_path: self.fix_path,
        }
    }

    /// Database file shared by all collections, when a data directory is configured
    pub fn database_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(DATABASE_FILE_NAME))
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.fix_path);
        assert_eq!(config.port, 3100);
        assert_eq!(config.transport, Transport::Http);
        assert!(config.database_path().is_none());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(&[
            ("TAGSTOCK_FIX_PATH", "false"),
            ("TAGSTOCK_TRANSPORT", "STDIO"),
            ("TAGSTOCK_PORT", "8080"),
            ("TAGSTOCK_DATA_DIR", "/var/lib/tagstock"),
            ("TAGSTOCK_SEED", "0"),
        ])
        .unwrap();

        assert!(!config.fix_path);
        assert!(!config.tag_service_config().fix_path);
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.port, 8080);
        assert!(!config.seed_sample_data);
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/var/lib/tagstock/tagstock.db"))
        );
    }

    #[test]
    fn test_rejects_unparsable_values() {
        let err = config_from(&[("TAGSTOCK_PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "TAGSTOCK_PORT",
                value: "eighty".to_string()
            }
        );

        assert!(config_from(&[("TAGSTOCK_TRANSPORT", "carrier-pigeon")]).is_err());
        assert!(config_from(&[("TAGSTOCK_FIX_PATH", "maybe")]).is_err());
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let config = config_from(&[("TAGSTOCK_PORT", "0")]).unwrap();
        assert!(config.validate().is_err());

        let stdio = AppConfig {
            transport: Transport::Stdio,
            ..config
        };
        assert!(stdio.validate().is_ok());
    }
}
