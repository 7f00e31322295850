//! # ConjureNextToCaster - self-targeted summoning spell patcher
//!
//! Scans the winning spell tomes of a load order for spells that summon at an
//! aimed location and produces, in a single output plugin, a self-targeted
//! mirror of each such spell and of its summon effects. The mirror is bound
//! onto an override of the tome through a script property, where the
//! companion script picks it up and teaches it alongside the original.
//!
//! ## Core Concepts
//!
//! - **Link cache**: resolves record links to the winning override
//! - **Mirror**: a copy of an aimed record with target mode forced to self
//! - **Attachment point**: the `DankAddSecondSpell.SecondSpell` property on a tome
//! - **Correlation**: matching mirror effects to source effects by summoned actor
//!
//! Runs are idempotent: a mirror already bound onto a tome, whether by an
//! earlier run or by hand, is overridden rather than duplicated.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::path::Path;
//! use conjure_next_to_caster::{run_patch, LoadOrder, ModKey, ModType, Settings};
//!
//! let load_order: LoadOrder = plugins.into_iter().collect();
//! let output = run_patch(
//!     &load_order,
//!     ModKey::new("ConjureNextToCaster", ModType::Plugin),
//!     &Settings::load(Path::new("settings.json"))?,
//!     None,
//! )?;
//! println!("patched {} tomes", output.report.books_patched);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Records and storage
pub mod record;
pub mod storage;

// Patching
pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod runnability;
pub mod scanner;
pub mod text;

// Re-export primary types at crate root for convenience
pub use binder::{PROPERTY_NAME, SCRIPT_NAME};
pub use config::Settings;
pub use engine::{MirrorEngine, PatchOutput, RunReport};
pub use error::{ConfigError, PatchError, PatchResult, RunnabilityError, SynthesisError};
pub use pipeline::run_patch;
pub use record::{
    Book, FormKey, FormLink, MagicEffect, MajorRecord, ModKey, ModType, Npc, Record, RecordKind,
    Spell, TargetType,
};
pub use runnability::{ArchiveIndex, GameRelease, RunnabilityCheck};
pub use scanner::{Candidate, Candidates};
pub use storage::{
    ImmutableLinkCache, LinkCache, LinkCacheExt, LoadOrder, Plugin, Resolution, StorageError,
    WinningOverrides,
};
