/// Engine configuration
///
/// Priority: CLI flags > `KVQUERY_*` environment > config file > defaults.
/// The CLI flags are applied by the binary on top of what `load` returns.
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::{QueryError, Result};

const CONFIG_PATHS: [&str; 2] = ["/etc/kvquery/kvquery.toml", "./kvquery.toml"];
const ENV_PREFIX: &str = "KVQUERY";
const HISTORY_FILE: &str = ".kvq_history";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Truncate every storage scan after this many rows; unlimited if unset.
    #[serde(default)]
    pub scan_span: Option<usize>,
    /// Rows generated for the sample `lineitem` table.
    #[serde(default = "default_lineitems")]
    pub lineitems: u64,
    /// Rows generated for the sample `orders` table.
    #[serde(default = "default_orders")]
    pub orders: u64,
    /// REPL history file; `~/.kvq_history` if unset.
    #[serde(default)]
    pub history: Option<PathBuf>,
}

const fn default_lineitems() -> u64 { 30 }
const fn default_orders() -> u64 { 10 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_span: None,
            lineitems: default_lineitems(),
            orders: default_orders(),
            history: None,
        }
    }
}

impl EngineConfig {
    /// Load from `file` if given, else from the first existing default path,
    /// then overlay the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_from(file, None)
    }

    /// `env` replaces the process environment; used by tests.
    fn load_from(file: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        match file {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
                log::info!("loading config from {}", path.display());
            }
            None => {
                if let Some(path) = CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
                    builder = builder.add_source(File::with_name(path));
                    log::info!("loading config from {path}");
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| QueryError::Config(e.to_string()))
    }

    /// Where the REPL keeps its history, if anywhere.
    #[must_use]
    pub fn history_file(&self) -> Option<PathBuf> {
        self.history.clone().or_else(|| {
            dirs::home_dir().map(|mut path| {
                path.push(HISTORY_FILE);
                path
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let file = write_config("");
        let config = EngineConfig::load_from(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_file_values() {
        let file = write_config("scan_span = 4\nlineitems = 90\nhistory = \"/tmp/kvq\"\n");
        let config = EngineConfig::load_from(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.scan_span, Some(4));
        assert_eq!(config.lineitems, 90);
        assert_eq!(config.orders, 10);
        assert_eq!(config.history_file(), Some(PathBuf::from("/tmp/kvq")));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config("scan_span = 4\norders = 3\n");
        let config = EngineConfig::load_from(
            Some(file.path()),
            env(&[("KVQUERY_SCAN_SPAN", "7"), ("OTHER_ORDERS", "99")]),
        )
        .unwrap();
        assert_eq!(config.scan_span, Some(7));
        assert_eq!(config.orders, 3);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = EngineConfig::load_from(Some(Path::new("/nonexistent/kvquery.toml")), env(&[]));
        assert!(matches!(result, Err(QueryError::Config(_))));
    }

    #[test]
    fn test_bad_value() {
        let file = write_config("lineitems = \"many\"\n");
        let result = EngineConfig::load_from(Some(file.path()), env(&[]));
        assert!(matches!(result, Err(QueryError::Config(_))));
    }
}
