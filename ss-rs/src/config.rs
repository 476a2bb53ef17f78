//! Engine configuration.
//!
//! An [`EngineConfig`] is read from TOML:
//!
//! | Key | Type | Default | Meaning |
//! |-----|------|---------|---------|
//! | `max_loop_iterations` | integer | `1000000` | per-loop cap; `0` = unlimited |
//! | `standard_functions` | bool | `true` | register the stock `@functions` |
//! | `default_mime_type` | string | `"text/html"` | mime type of new contexts |
//!
//! Every key is optional.  Unknown keys are an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{RequestContext, DEFAULT_MIME_TYPE};
use crate::script::interp::{Interpreter, DEFAULT_MAX_LOOP_ITERATIONS};

// ── Public API ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_loop_iterations: u64,
    pub standard_functions: bool,
    pub default_mime_type: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            standard_functions: true,
            default_mime_type: DEFAULT_MIME_TYPE.to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    /// Serialize back to TOML, e.g. to write out a starter file.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    pub fn interpreter(&self) -> Interpreter {
        Interpreter::with_config(self)
    }

    /// A buffered context carrying the configured mime type.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::buffered().with_mime_type(self.default_mime_type.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use std::io::Write;

    #[test]
    fn empty_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = EngineConfig::from_toml_str("max_loop_iterations = 0\n").unwrap();
        assert_eq!(cfg.max_loop_iterations, 0);
        assert!(cfg.standard_functions);
        assert_eq!(cfg.default_mime_type, "text/html");
    }

    #[test]
    fn unknown_key_rejected() {
        let err = EngineConfig::from_toml_str("max_loops = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn wrong_type_rejected() {
        assert!(EngineConfig::from_toml_str("standard_functions = \"yes\"\n").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let cfg = EngineConfig {
            max_loop_iterations: 10,
            standard_functions: false,
            default_mime_type: "text/plain".into(),
        };
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_mime_type = \"text/plain\"").unwrap();
        writeln!(file, "max_loop_iterations = 25").unwrap();
        let cfg = EngineConfig::load_file(file.path()).unwrap();
        assert_eq!(cfg.max_loop_iterations, 25);
        assert_eq!(cfg.interpreter().max_loop_iterations(), 25);
        assert_eq!(cfg.request_context().mime_type(), "text/plain");
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
