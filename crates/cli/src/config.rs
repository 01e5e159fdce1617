//! Configuration for the mangrove CLI

use anyhow::{Context, Result};
use mangrove_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked for in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "mangrove.toml";

/// Mangrove CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Analysis engine options
    #[serde(default)]
    pub engine: EngineConfig,

    /// CLI options
    #[serde(default)]
    pub cli: CliConfig,
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Show a spinner while analyses run
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            progress: true,
            pretty_json: true,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load configuration with precedence: env vars > config file > defaults.
    ///
    /// An explicit `config_path` must exist; the default `mangrove.toml` is
    /// only read when present.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config
            .engine
            .validate()
            .context("Invalid engine configuration")?;
        Ok(config)
    }

    /// Apply `MANGROVE_*` overrides looked up through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        let parse = |key: &str| -> Result<Option<usize>> {
            var(key)
                .map(|v| v.trim().parse::<usize>().with_context(|| format!("Invalid {key}: {v:?}")))
                .transpose()
        };

        if let Some(n) = parse("MANGROVE_CACHE_CAPACITY")? {
            self.engine.cache_capacity = n;
        }
        if let Some(n) = parse("MANGROVE_WORKER_THREADS")? {
            self.engine.worker_threads = n;
        }
        if let Some(n) = parse("MANGROVE_BUFFER_VERTICES")? {
            self.engine.buffer_vertices = n;
        }
        if let Some(n) = parse("MANGROVE_MAX_GRID_CELLS")? {
            self.engine.max_grid_cells = n;
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangrove_engine::MethodKind;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.cache_capacity, 64);
        assert_eq!(config.engine.defaults.buffer_radius_m, 200.0);
        assert!(config.cli.progress);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            cache_capacity = 16

            [engine.defaults]
            interpolation_method = "idw"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.cache_capacity, 16);
        assert_eq!(config.engine.buffer_vertices, 64);
        assert_eq!(config.engine.defaults.interpolation_method, MethodKind::Idw);
        assert_eq!(config.engine.defaults.precision, 2);
        assert!(config.cli.pretty_json);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let parsed: Config = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [("MANGROVE_CACHE_CAPACITY", "8"), ("MANGROVE_MAX_GRID_CELLS", " 2500 ")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.engine.cache_capacity, 8);
        assert_eq!(config.engine.max_grid_cells, 2500);
        assert_eq!(config.engine.worker_threads, 0);
    }

    #[test]
    fn test_bad_env_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == "MANGROVE_WORKER_THREADS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("MANGROVE_WORKER_THREADS"));
    }
}
