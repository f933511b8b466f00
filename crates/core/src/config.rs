//! Load configuration.
//!
//! Options can be built in code or read from a `parspec.toml` file:
//!
//! ```toml
//! sources = ["src/pks", "src/operators"]
//!
//! [load]
//! on_error = "warn"     # raise | warn | ignore
//! on_empty = "ignore"
//! suffix = ".hh"
//! exclude = ["_reg.hh"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What to do when a file fails to load or yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Abort the whole load.
    #[default]
    Raise,
    /// Log a warning and skip the file.
    Warn,
    /// Skip the file silently.
    Ignore,
}

/// Per-load options: error and empty-result policies plus the filename filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub on_error: Policy,
    pub on_empty: Policy,
    /// Only files whose name ends with this are read.
    pub suffix: String,
    /// Files whose name ends with any of these are skipped, e.g. generated
    /// registration units.
    pub exclude: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            on_error: Policy::Warn,
            on_empty: Policy::Ignore,
            suffix: ".hh".to_owned(),
            exclude: vec!["_reg.hh".to_owned()],
        }
    }
}

impl LoadOptions {
    /// Options that abort on any problem; used by tests and `--strict` runs.
    pub fn strict() -> Self {
        LoadOptions {
            on_error: Policy::Raise,
            on_empty: Policy::Ignore,
            ..LoadOptions::default()
        }
    }

    /// Does `path` pass the suffix filter and miss every exclusion?
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        name.ends_with(&self.suffix) && !self.exclude.iter().any(|x| name.ends_with(x.as_str()))
    }

    /// The file stem used to name headerless scopes: the filename with the
    /// suffix removed.
    pub fn stem(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match name.strip_suffix(&self.suffix) {
            Some(stem) => stem.to_owned(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(name),
        }
    }
}

/// Top-level `parspec.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source roots, relative to the config file's directory.
    pub sources: Vec<PathBuf>,
    pub load: LoadOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a config file; relative source roots are resolved against the
    /// file's directory.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut config = Config::from_toml_str(&text)?;
        if let Some(dir) = path.parent() {
            config.sources = config
                .sources
                .into_iter()
                .map(|s| if s.is_relative() { dir.join(s) } else { s })
                .collect();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_warn_on_error_and_filter_hh() {
        let opts = LoadOptions::default();
        assert_eq!(opts.on_error, Policy::Warn);
        assert!(opts.accepts(Path::new("src/Richards.hh")));
        assert!(!opts.accepts(Path::new("src/Richards.cc")));
        assert!(!opts.accepts(Path::new("src/pks_reg.hh")));
    }

    #[test]
    fn stem_strips_configured_suffix() {
        let opts = LoadOptions::default();
        assert_eq!(opts.stem(Path::new("a/b/BDF_FnBase.hh")), "BDF_FnBase");
    }

    #[test]
    fn parses_partial_toml() {
        let config = Config::from_toml_str(
            r#"
sources = ["src"]

[load]
on_error = "ignore"
exclude = ["_reg.hh", "Factory.hh"]
"#,
        )
        .unwrap();
        assert_eq!(config.sources, vec![PathBuf::from("src")]);
        assert_eq!(config.load.on_error, Policy::Ignore);
        assert_eq!(config.load.on_empty, Policy::Ignore);
        assert_eq!(config.load.suffix, ".hh");
        assert_eq!(config.load.exclude.len(), 2);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = Config::from_toml_str("[load]\non_error = \"explode\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
