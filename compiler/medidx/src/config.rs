//! Where `medidx` finds datasets, models, accounts and the session file.
//!
//! Layers, later ones winning: built-in defaults, a JSON config file
//! (`--config` or `MEDIDX_CONFIG`), `MEDIDX_*` environment variables, then
//! command-line flags. Environment values that do not parse are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use medi_data::split::DEFAULT_SEED;

pub const CONFIG_ENV: &str = "MEDIDX_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    /// Directory holding the account table.
    pub account_dir: PathBuf,
    pub session_file: PathBuf,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models"),
            account_dir: PathBuf::from("accounts"),
            session_file: PathBuf::from("session.json"),
            seed: DEFAULT_SEED,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub model_dir: Option<PathBuf>,
    pub account_dir: Option<PathBuf>,
    pub session_file: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Config {
    /// Fields missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve every layer against the process environment.
    pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::resolve_with(file, overrides, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        file: Option<&Path>,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = file
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));
        let mut config = match file {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env(env);
        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let dir = |key: &str| env(key).filter(|s| !s.is_empty()).map(PathBuf::from);
        if let Some(p) = dir("MEDIDX_DATA_DIR") {
            self.data_dir = p;
        }
        if let Some(p) = dir("MEDIDX_MODEL_DIR") {
            self.model_dir = p;
        }
        if let Some(p) = dir("MEDIDX_ACCOUNTS") {
            self.account_dir = p;
        }
        if let Some(p) = dir("MEDIDX_SESSION") {
            self.session_file = p;
        }
        if let Some(s) = env("MEDIDX_SEED") {
            match s.trim().parse::<u64>() {
                Ok(n) => self.seed = n,
                Err(_) => log::warn!("ignoring MEDIDX_SEED={s:?}: not an unsigned integer"),
            }
        }
    }

    fn apply_overrides(&mut self, o: &Overrides) {
        if let Some(p) = &o.data_dir {
            self.data_dir = p.clone();
        }
        if let Some(p) = &o.model_dir {
            self.model_dir = p.clone();
        }
        if let Some(p) = &o.account_dir {
            self.account_dir = p.clone();
        }
        if let Some(p) = &o.session_file {
            self.session_file = p.clone();
        }
        if let Some(n) = o.seed {
            self.seed = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_any_layer() {
        let c = Config::resolve_with(None, &Overrides::default(), env_of(&[])).unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.seed, 42);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("medidx.json");
        fs::write(&path, r#"{"model_dir": "/srv/models", "seed": 7}"#).unwrap();
        let c = Config::from_file(&path).unwrap();
        assert_eq!(c.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(c.seed, 7);
        assert_eq!(c.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn layers_apply_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("medidx.json");
        fs::write(&path, r#"{"data_dir": "from-file", "seed": 7}"#).unwrap();
        let env = env_of(&[
            (CONFIG_ENV, path.to_str().unwrap()),
            ("MEDIDX_DATA_DIR", "from-env"),
            ("MEDIDX_SEED", "9"),
        ]);
        let overrides = Overrides {
            seed: Some(11),
            ..Overrides::default()
        };
        let c = Config::resolve_with(None, &overrides, env).unwrap();
        assert_eq!(c.data_dir, PathBuf::from("from-env"));
        assert_eq!(c.seed, 11);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let env = env_of(&[("MEDIDX_SEED", "lots"), ("MEDIDX_MODEL_DIR", "")]);
        let c = Config::resolve_with(None, &Overrides::default(), env).unwrap();
        assert_eq!(c.seed, DEFAULT_SEED);
        assert_eq!(c.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn unreadable_or_invalid_files_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("none.json");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));
        let bad = tmp.path().join("bad.json");
        fs::write(&bad, "{\"seed\": \"x\"}").unwrap();
        assert!(matches!(
            Config::resolve_with(Some(&bad), &Overrides::default(), env_of(&[])),
            Err(ConfigError::Parse { .. })
        ));
    }
}
