//! Pre-run check that the companion script is installed.
//!
//! The patch is useless without the runtime script that reads the bound
//! mirror spell, so the runner refuses to start when the compiled script can
//! be found neither as a loose file nor inside an archive.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binder::SCRIPT_NAME;
use crate::error::RunnabilityError;

/// Game releases a host may run the patcher for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameRelease {
    /// Skyrim Legendary Edition.
    SkyrimLE,
    /// Skyrim Special Edition.
    SkyrimSE,
    /// Skyrim VR.
    SkyrimVR,
    /// Enderal on the LE engine.
    EnderalLE,
    /// Enderal on the SE engine.
    EnderalSE,
    /// Not supported.
    Fallout4,
    /// Not supported.
    Oblivion,
}

impl GameRelease {
    /// Returns true for the releases whose script engine runs the companion
    /// script.
    #[must_use]
    pub const fn supports_companion_script(self) -> bool {
        matches!(
            self,
            Self::SkyrimLE | Self::SkyrimSE | Self::SkyrimVR | Self::EnderalLE | Self::EnderalSE
        )
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::SkyrimLE => "SkyrimLE",
            Self::SkyrimSE => "SkyrimSE",
            Self::SkyrimVR => "SkyrimVR",
            Self::EnderalLE => "EnderalLE",
            Self::EnderalSE => "EnderalSE",
            Self::Fallout4 => "Fallout4",
            Self::Oblivion => "Oblivion",
        }
    }
}

impl fmt::Display for GameRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameRelease {
    type Err = RunnabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::SkyrimLE,
            Self::SkyrimSE,
            Self::SkyrimVR,
            Self::EnderalLE,
            Self::EnderalSE,
            Self::Fallout4,
            Self::Oblivion,
        ]
        .into_iter()
        .find(|release| release.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| RunnabilityError::UnsupportedRelease {
            release: s.to_string(),
        })
    }
}

/// Lookup of files packed inside the game's archives.
///
/// Reading archive containers is the host's job; the check only needs to ask
/// whether a path is present.
pub trait ArchiveIndex: Send + Sync {
    /// Returns true if any archive holds `path`.
    ///
    /// `path` uses `/` separators and is compared case-insensitively.
    fn contains(&self, path: &str) -> bool;
}

/// An install without archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArchives;

impl ArchiveIndex for NoArchives {
    fn contains(&self, _path: &str) -> bool {
        false
    }
}

/// Archive listing held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchiveIndex {
    paths: BTreeSet<String>,
}

impl InMemoryArchiveIndex {
    /// Creates an empty listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a packed file. Either separator is accepted.
    pub fn insert(&mut self, path: &str) {
        self.paths.insert(normalize(path));
    }
}

impl<S: AsRef<str>> FromIterator<S> for InMemoryArchiveIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = Self::new();
        for path in iter {
            index.insert(path.as_ref());
        }
        index
    }
}

impl ArchiveIndex for InMemoryArchiveIndex {
    fn contains(&self, path: &str) -> bool {
        self.paths.contains(&normalize(path))
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

/// Where and for which release the patch will be run.
pub struct RunnabilityCheck {
    /// Release the patch targets.
    pub release: GameRelease,
    /// Game data folder holding loose scripts.
    pub data_folder: PathBuf,
    /// Files packed in the loaded archives.
    pub archives: Box<dyn ArchiveIndex>,
}

impl RunnabilityCheck {
    /// A check against loose files only.
    #[must_use]
    pub fn new(release: GameRelease, data_folder: impl Into<PathBuf>) -> Self {
        Self {
            release,
            data_folder: data_folder.into(),
            archives: Box::new(NoArchives),
        }
    }

    /// Also searches `archives`.
    #[must_use]
    pub fn with_archives(mut self, archives: impl ArchiveIndex + 'static) -> Self {
        self.archives = Box::new(archives);
        self
    }

    /// Verifies the companion script is installed.
    ///
    /// # Errors
    /// See [`must_have_script`].
    pub fn verify(&self) -> Result<(), RunnabilityError> {
        must_have_script(
            SCRIPT_NAME,
            self.release,
            &self.data_folder,
            self.archives.as_ref(),
        )
    }
}

/// Fails unless the compiled `script` exists for `release`, either loose
/// under `data_folder` or inside one of `archives`.
///
/// # Errors
/// - `UnsupportedRelease`: `release` cannot run the script
/// - `MissingScript`: the script is nowhere to be found
/// - `Io`: the data folder could not be inspected
pub fn must_have_script(
    script: &str,
    release: GameRelease,
    data_folder: &Path,
    archives: &dyn ArchiveIndex,
) -> Result<(), RunnabilityError> {
    if !release.supports_companion_script() {
        return Err(RunnabilityError::UnsupportedRelease {
            release: release.to_string(),
        });
    }

    let file_name = format!("{script}.pex");
    let loose = data_folder.join("Scripts").join(&file_name);
    let exists = loose.try_exists().map_err(|source| RunnabilityError::Io {
        path: loose.clone(),
        source,
    })?;
    if exists {
        debug!(path = %loose.display(), "found loose companion script");
        return Ok(());
    }

    let packed = format!("Scripts/{file_name}");
    if archives.contains(&packed) {
        debug!(path = %packed, "found archived companion script");
        return Ok(());
    }

    Err(RunnabilityError::MissingScript { path: loose })
}
