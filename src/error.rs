//! Error types, one enum per concern.

use std::path::PathBuf;

/// Errors raised by the display adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("No {expected} input request is pending")]
    NoPendingInput { expected: &'static str },

    #[error("Input is disabled until the VM asks for more")]
    InputDisabled,

    #[error("No file prompt is pending")]
    NoPendingPrompt,

    #[error("No autosave to restore")]
    NothingToRestore,

    #[error("VM halted: {0}")]
    Halted(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vm(#[from] VmError),
}

/// Errors from the platform speech engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    /// Speech was cut short by a stop or a newer utterance.
    #[error("Speech interrupted")]
    Interrupted,

    #[error("Speech failed: {0}")]
    Failed(String),
}

/// Errors from a save store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Could not determine a data directory for saves")]
    NoSaveDir,

    #[error("Save file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Save record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors talking to the VM.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("VM link is closed")]
    Disconnected,

    #[error("Failed to read VM transcript: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid VM message on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("VM state could not be restored: {0}")]
    Restore(String),
}

/// Errors loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid TOML document: {0}")]
    Document(#[from] toml_edit::TomlError),
}
