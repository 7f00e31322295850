//! Mirror engine.
//!
//! One [`MirrorEngine`] performs one run: it scans the winning spell tomes,
//! synthesizes a self-targeted mirror for every aimed summoning spell it
//! finds, and binds that mirror onto an override of the tome. All writes go to
//! the output plugin the engine owns; the mirror caches live exactly as long as
//! the engine and are dropped when [`MirrorEngine::run`] returns.

mod correlate;
mod lookup;
mod mirror;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::binder::{self, PROPERTY_NAME, SCRIPT_NAME};
use crate::config::Settings;
use crate::error::PatchResult;
use crate::record::{Book, FormKey, Record, Spell};
use crate::scanner::Candidates;
use crate::storage::{ImmutableLinkCache, LinkCache, Plugin, WinningOverrides};
use crate::text::TextTransform;

pub use correlate::index_by_association;
pub use lookup::find_existing_spell;
pub use mirror::{MirrorCache, SelfTargeted, MIRROR_EDITOR_ID_SUFFIX};

/// Counters describing what a run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Tomes overridden with the attachment point.
    pub books_patched: usize,
    /// Mirror spells created or re-synchronized.
    pub spells_mirrored: usize,
    /// Mirror magic effects created or re-synchronized.
    pub magic_effects_mirrored: usize,
    /// Mirrors that overrode a pre-existing record instead of adding a new one.
    pub existing_mirrors_reused: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PatchOutput {
    /// The output plugin, holding every new and overridden record.
    pub plugin: Plugin,
    /// What the run wrote.
    pub report: RunReport,
}

/// Single-run mirror synthesizer.
pub struct MirrorEngine {
    links: Arc<dyn LinkCache>,
    overrides: Arc<dyn WinningOverrides>,
    patch: Plugin,
    text: TextTransform,
    spell_mirrors: MirrorCache,
    effect_mirrors: MirrorCache,
    report: RunReport,
}

impl MirrorEngine {
    /// Creates an engine reading through `links`/`overrides` and writing to `patch`.
    #[must_use]
    pub fn new(
        links: Arc<dyn LinkCache>,
        overrides: Arc<dyn WinningOverrides>,
        patch: Plugin,
        settings: &Settings,
    ) -> Self {
        Self {
            links,
            overrides,
            patch,
            text: TextTransform::new(settings),
            spell_mirrors: MirrorCache::default(),
            effect_mirrors: MirrorCache::default(),
            report: RunReport::default(),
        }
    }

    /// Creates an engine over an in-memory link cache.
    #[must_use]
    pub fn from_link_cache(
        cache: Arc<ImmutableLinkCache>,
        patch: Plugin,
        settings: &Settings,
    ) -> Self {
        let links: Arc<dyn LinkCache> = cache.clone();
        Self::new(links, cache, patch, settings)
    }

    /// The output plugin as written so far.
    #[must_use]
    pub const fn patch(&self) -> &Plugin {
        &self.patch
    }

    /// Counters so far.
    #[must_use]
    pub const fn report(&self) -> &RunReport {
        &self.report
    }

    /// Scans every winning tome and patches each candidate.
    ///
    /// # Errors
    /// Any synthesis failure aborts the run; the partially written plugin is
    /// discarded with the engine.
    pub fn run(mut self) -> PatchResult<PatchOutput> {
        let links = Arc::clone(&self.links);
        let overrides = Arc::clone(&self.overrides);

        for candidate in Candidates::new(overrides.as_ref(), links.as_ref()) {
            self.process_book(candidate.book, candidate.spell)?;
        }

        info!(
            books = self.report.books_patched,
            spells = self.report.spells_mirrored,
            magic_effects = self.report.magic_effects_mirrored,
            reused = self.report.existing_mirrors_reused,
            "patch complete"
        );
        Ok(PatchOutput {
            plugin: self.patch,
            report: self.report,
        })
    }

    /// Mirrors `aimed` and binds the mirror onto an override of `book`.
    /// Returns the mirror spell's identity.
    ///
    /// # Errors
    /// Propagates synthesis failures.
    pub fn process_book(&mut self, book: &Book, aimed: &Spell) -> PatchResult<FormKey> {
        info!("Processing summoning spell book {book}");

        let links = Arc::clone(&self.links);
        let existing = find_existing_spell(links.as_ref(), book);
        if let Some(existing) = existing {
            debug!(%book, %existing, "found existing mirror through attachment point");
        }

        let mirror = self.mirror_spell(aimed, existing)?;

        let patched = self.patch.get_or_add_as_override(book);
        let entry = binder::get_or_create_script_entry(patched, SCRIPT_NAME);
        binder::get_or_create_object_property(entry, PROPERTY_NAME)
            .set_object(mirror.clone());
        self.report.books_patched += 1;

        Ok(mirror)
    }

    /// Read-only lookup of the mirror a previous run (or a hand edit) bound
    /// onto `book`.
    #[must_use]
    pub fn find_existing_spell(&self, book: &Book) -> Option<&Spell> {
        find_existing_spell(self.links.as_ref(), book)
    }

    /// Cached mirror of `aimed`, if this run already produced one.
    #[must_use]
    pub fn spell_mirror_of(&self, aimed: &Spell) -> Option<&FormKey> {
        self.spell_mirrors.get(aimed.form_key())
    }
}
