//! Patcher settings.
//!
//! Settings are read from a JSON document (`settings.json` next to the
//! patcher). Every key is optional; missing keys take the defaults below and
//! unknown keys are rejected so typos surface instead of being ignored.
//! The PascalCase key names of existing settings files are accepted too,
//! including the historical `ReplacmentWordsForDescription` spelling.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default suffix appended to mirror names.
pub const DEFAULT_SPELL_SUFFIX: &str = " (Next to Caster)";

/// Default phrase replaced in mirror descriptions.
pub const DEFAULT_DESCRIPTION_FIND: &str = "wherever the caster is pointing";

/// Default replacement for [`DEFAULT_DESCRIPTION_FIND`].
pub const DEFAULT_DESCRIPTION_REPLACE: &str = "right next to the caster";

/// User-facing text settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Prepended to every mirror's display name.
    #[serde(alias = "SpellPrefix")]
    pub spell_prefix: String,

    /// Appended to every mirror's display name.
    #[serde(alias = "SpellSuffix")]
    pub spell_suffix: String,

    /// Literal text searched for in magic effect descriptions.
    #[serde(alias = "WordsToReplaceInDescription")]
    pub words_to_replace_in_description: String,

    /// Literal text substituted for each match.
    #[serde(alias = "ReplacmentWordsForDescription")]
    pub replacement_words_for_description: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spell_prefix: String::new(),
            spell_suffix: DEFAULT_SPELL_SUFFIX.to_string(),
            words_to_replace_in_description: DEFAULT_DESCRIPTION_FIND.to_string(),
            replacement_words_for_description: DEFAULT_DESCRIPTION_REPLACE.to_string(),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON string.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown keys.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from `path`, falling back to the defaults when the
    /// file does not exist.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] when the file exists but cannot be read,
    /// and [`ConfigError::Parse`] when its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
