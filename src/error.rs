//! Error types for the patcher.
//!
//! Scanning never fails: records that do not match and links that do not
//! resolve are skipped. What remains are hard failures, and each of them
//! aborts the whole run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::{FormKey, RecordKind};
use crate::storage::StorageError;

/// Failures while creating or editing records in the output plugin.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The output plugin refused a new mirror.
    #[error("Failed to create mirror of {kind} {record}: {source}")]
    Storage {
        /// Type of the record being mirrored.
        kind: RecordKind,
        /// Label of the aimed source record.
        record: String,
        /// Underlying plugin error.
        #[source]
        source: StorageError,
    },

    /// A record added earlier in the run could not be found again.
    #[error("{kind} {form_key} vanished from the output plugin while being patched")]
    MissingOutputRecord {
        /// Type of the missing record.
        kind: RecordKind,
        /// Key it was added under.
        form_key: FormKey,
    },
}

/// Failures of the pre-run check for the companion script.
#[derive(Debug, Error)]
pub enum RunnabilityError {
    /// The patcher only targets the Skyrim family.
    #[error("Game release {release} is not supported")]
    UnsupportedRelease {
        /// Name of the rejected release.
        release: String,
    },

    /// The compiled companion script is neither loose nor archived.
    #[error("Required script not found: {}", path.display())]
    MissingScript {
        /// Loose path that was checked.
        path: PathBuf,
    },

    /// The data folder could not be inspected.
    #[error("Failed to check {} for the companion script: {source}", path.display())]
    Io {
        /// Path being inspected.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Failures while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("Failed to read settings from {}: {source}", path.display())]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Malformed JSON or an unknown key.
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Writing the output plugin failed.
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The companion script is missing.
    #[error("Runnability check failed: {0}")]
    Runnability(#[from] RunnabilityError),

    /// Settings could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PatchError {
    /// Returns true if the run failed while writing records.
    #[must_use]
    pub const fn is_synthesis(&self) -> bool {
        matches!(self, Self::Synthesis(_))
    }

    /// Returns true if the run was refused before it started.
    #[must_use]
    pub const fn is_runnability(&self) -> bool {
        matches!(self, Self::Runnability(_))
    }

    /// Returns true if settings could not be loaded.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for patcher operations.
pub type PatchResult<T> = Result<T, PatchError>;
