//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary) and can be overridden by CLI flags.
//!
//! | Variable                        | Default        |
//! |---------------------------------|----------------|
//! | `CONTACTLOAD_PORT`              | `3000`         |
//! | `CONTACTLOAD_DATA_DIR`          | `.contactload` |
//! | `CONTACTLOAD_MAX_UPLOAD_BYTES`  | `5242880`      |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::import::upload::DEFAULT_MAX_UPLOAD_BYTES;

pub const PORT_VAR: &str = "CONTACTLOAD_PORT";
pub const DATA_DIR_VAR: &str = "CONTACTLOAD_DATA_DIR";
pub const MAX_UPLOAD_VAR: &str = "CONTACTLOAD_MAX_UPLOAD_BYTES";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = ".contactload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory of the JSON contact store.
    pub data_dir: PathBuf,
    /// Upload ceiling in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            port: parse_var(&lookup, PORT_VAR)?.unwrap_or(defaults.port),
            data_dir: lookup(DATA_DIR_VAR)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_upload_bytes: parse_var(&lookup, MAX_UPLOAD_VAR)?.unwrap_or(defaults.max_upload_bytes),
        })
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_env_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            (PORT_VAR, "8080"),
            (DATA_DIR_VAR, "/var/lib/contactload"),
            (MAX_UPLOAD_VAR, "1024"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/contactload"));
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: PORT_VAR.into(),
                value: "eighty".into()
            }
        );
    }

    #[test]
    fn test_cli_overrides() {
        let config = ServerConfig::default()
            .with_port(Some(4000))
            .with_data_dir(None);
        assert_eq!(config.port, 4000);
        assert_eq!(config.data_dir, PathBuf::from(".contactload"));
    }
}
