use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading or writing a configuration or style file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("top level is not a JSON object")]
    NotAnObject,
    #[error("missing key \"{0}\"")]
    MissingKey(&'static str),
    #[error("invalid binding \"{shortcut}\": {reason}")]
    InvalidBinding { shortcut: String, reason: String },
    #[error("shortcut \"{0}\" is bound both as a hotkey and as a custom shortcut")]
    Conflict(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Edit-time rejection of a shortcut assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingConflict {
    #[error("Hotkey \"{0}\" is already assigned!")]
    AlreadyAssigned(String),
    #[error("no shortcut given")]
    Unassigned,
    #[error("no marker with id {0}")]
    UnknownMarker(usize),
    #[error("marker size must be positive, got {w}x{h}")]
    InvalidSize { w: i32, h: i32 },
    #[error("invalid edit: {0}")]
    Invalid(String),
}
