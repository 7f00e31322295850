//! Memoized find-or-create of mirror records.

use std::collections::HashMap;

use tracing::debug;

use super::MirrorEngine;
use crate::error::{PatchResult, SynthesisError};
use crate::record::{
    DeepCopyIn, FormKey, MagicEffect, MagicEffectCopyMask, Record, Spell, SpellCopyMask,
    TargetType,
};
use crate::storage::{Grouped, Plugin};
use crate::text::TextTransform;

/// Appended to the source editor id when a mirror is created from scratch.
pub const MIRROR_EDITOR_ID_SUFFIX: &str = "_Self";

/// Per-run map from an aimed record to its mirror.
#[derive(Debug, Default)]
pub struct MirrorCache {
    mirrors: HashMap<FormKey, FormKey>,
}

impl MirrorCache {
    /// The mirror already produced for `aimed`.
    #[must_use]
    pub fn get(&self, aimed: &FormKey) -> Option<&FormKey> {
        self.mirrors.get(aimed)
    }

    /// Records the mirror of `aimed`.
    pub fn insert(&mut self, aimed: FormKey, mirror: FormKey) {
        self.mirrors.insert(aimed, mirror);
    }

    /// Number of mirrors produced.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    /// Returns true before the first mirror.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }
}

/// Record types that can be mirrored into a self-targeted variant.
pub trait SelfTargeted: Grouped + DeepCopyIn {
    /// Fields left out of the bulk copy; set explicitly afterwards.
    const MIRROR_MASK: Self::Mask;

    /// Forces the self-targeting invariants.
    fn make_self_targeted(&mut self);

    /// Rewrites display text from the aimed source.
    fn apply_text(&mut self, source: &Self, text: &TextTransform);
}

impl SelfTargeted for Spell {
    const MIRROR_MASK: SpellCopyMask = SpellCopyMask::MIRROR;

    fn make_self_targeted(&mut self) {
        self.target_type = TargetType::Caster;
        self.range = 0.0;
    }

    fn apply_text(&mut self, source: &Self, text: &TextTransform) {
        text.edit_name(source.name.as_deref(), &mut self.name);
    }
}

impl SelfTargeted for MagicEffect {
    const MIRROR_MASK: MagicEffectCopyMask = MagicEffectCopyMask::MIRROR;

    fn make_self_targeted(&mut self) {
        self.target_type = TargetType::Caster;
    }

    fn apply_text(&mut self, source: &Self, text: &TextTransform) {
        text.edit_name(source.name.as_deref(), &mut self.name);
        text.edit_description(source.description.as_deref(), &mut self.description);
    }
}

/// Overrides `existing` in `patch`, or adds `<aimed>_Self`, and brings it in
/// line with `aimed`.
fn synthesize<T: SelfTargeted>(
    patch: &mut Plugin,
    text: &TextTransform,
    aimed: &T,
    existing: Option<&T>,
) -> Result<FormKey, SynthesisError> {
    let mirror = match existing {
        Some(found) => patch.get_or_add_as_override(found),
        None => {
            let editor_id = format!(
                "{}{MIRROR_EDITOR_ID_SUFFIX}",
                aimed.editor_id().unwrap_or_default()
            );
            patch
                .add_new::<T>(editor_id)
                .map_err(|source| SynthesisError::Storage {
                    kind: T::KIND,
                    record: aimed.label(),
                    source,
                })?
        }
    };

    mirror.deep_copy_in(aimed, &T::MIRROR_MASK);
    mirror.make_self_targeted();
    mirror.apply_text(aimed, text);
    Ok(mirror.form_key().clone())
}

impl MirrorEngine {
    /// Returns the self-targeted mirror of `aimed`, creating it on first use.
    ///
    /// `existing` is a mirror found on the tome; when given it is overridden
    /// rather than a new record being added. Repeated calls for the same
    /// `aimed` return the first mirror regardless of `existing`.
    ///
    /// # Errors
    /// Fails when the output plugin cannot take the new record.
    pub fn mirror_spell(
        &mut self,
        aimed: &Spell,
        existing: Option<&Spell>,
    ) -> PatchResult<FormKey> {
        if let Some(mirror) = self.spell_mirrors.get(aimed.form_key()) {
            debug!(%aimed, %mirror, "reusing spell mirror");
            return Ok(mirror.clone());
        }

        let mirror = synthesize(&mut self.patch, &self.text, aimed, existing)?;
        self.correlate_effects(&mirror, existing)?;

        debug!(%aimed, %mirror, overridden = existing.is_some(), "mirrored spell");
        self.spell_mirrors.insert(aimed.form_key().clone(), mirror.clone());
        self.report.spells_mirrored += 1;
        if existing.is_some() {
            self.report.existing_mirrors_reused += 1;
        }
        Ok(mirror)
    }

    /// Returns the self-targeted mirror of `aimed`, creating it on first use.
    ///
    /// # Errors
    /// Fails when the output plugin cannot take the new record.
    pub fn mirror_magic_effect(
        &mut self,
        aimed: &MagicEffect,
        existing: Option<&MagicEffect>,
    ) -> PatchResult<FormKey> {
        if let Some(mirror) = self.effect_mirrors.get(aimed.form_key()) {
            debug!(%aimed, %mirror, "reusing magic effect mirror");
            return Ok(mirror.clone());
        }

        let mirror = synthesize(&mut self.patch, &self.text, aimed, existing)?;

        debug!(%aimed, %mirror, overridden = existing.is_some(), "mirrored magic effect");
        self.effect_mirrors.insert(aimed.form_key().clone(), mirror.clone());
        self.report.magic_effects_mirrored += 1;
        if existing.is_some() {
            self.report.existing_mirrors_reused += 1;
        }
        Ok(mirror)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Settings;
    use crate::error::PatchError;
    use crate::record::{ModKey, ModType};
    use crate::storage::{ImmutableLinkCache, LoadOrder};

    fn patch_key() -> ModKey {
        ModKey::new("Patch", ModType::Plugin)
    }

    fn engine_over(master: Plugin) -> MirrorEngine {
        let load_order: LoadOrder = std::iter::once(master).collect();
        MirrorEngine::from_link_cache(
            Arc::new(load_order.to_immutable_link_cache()),
            Plugin::new(patch_key()),
            &Settings::default(),
        )
    }

    fn empty_engine() -> MirrorEngine {
        MirrorEngine::from_link_cache(
            Arc::new(ImmutableLinkCache::default()),
            Plugin::new(patch_key()),
            &Settings::default(),
        )
    }

    fn aimed_spell() -> Spell {
        let mut master = Plugin::new(ModKey::new("Master", ModType::Master));
        let spell = master.add_new::<Spell>("Original_Spell").unwrap();
        spell.name = Some("Fireball".to_string());
        spell.target_type = TargetType::Aimed;
        spell.range = 42.0;
        spell.base_cost = 90;
        spell.clone()
    }

    #[test]
    fn new_spell_mirror_is_self_targeted_and_named() {
        let aimed = aimed_spell();
        let mut engine = empty_engine();

        let mirror_key = engine.mirror_spell(&aimed, None).unwrap();
        let mirror = engine.patch().get::<Spell>(&mirror_key).unwrap();

        assert_eq!(mirror.editor_id.as_deref(), Some("Original_Spell_Self"));
        assert_eq!(mirror.form_key.mod_key(), &patch_key());
        assert_eq!(mirror.target_type, TargetType::Caster);
        assert!(mirror.range.abs() < f32::EPSILON);
        assert_eq!(mirror.name.as_deref(), Some("Fireball (Next to Caster)"));
        assert_eq!(mirror.base_cost, 90);
    }

    #[test]
    fn spell_mirror_is_memoized() {
        let aimed = aimed_spell();
        let mut engine = empty_engine();

        let first = engine.mirror_spell(&aimed, None).unwrap();
        let second = engine.mirror_spell(&aimed, None).unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.patch().group::<Spell>().len(), 1);
        assert_eq!(engine.report().spells_mirrored, 1);
        assert_eq!(engine.spell_mirror_of(&aimed), Some(&first));
    }

    #[test]
    fn existing_spell_mirror_is_overridden_not_duplicated() {
        let aimed = aimed_spell();
        let mut previous = Plugin::new(ModKey::new("Previous", ModType::Plugin));
        let existing = previous.add_new::<Spell>("Modified_Spell").unwrap();
        existing.target_type = TargetType::Aimed;
        existing.range = 32.0;
        existing.description = Some("Hand written".to_string());
        let existing = existing.clone();

        let mut engine = engine_over(previous);
        let first = engine.mirror_spell(&aimed, Some(&existing)).unwrap();
        let second = engine.mirror_spell(&aimed, Some(&existing)).unwrap();

        assert_eq!(first, existing.form_key);
        assert_eq!(first, second);
        let mirror = engine.patch().get::<Spell>(&first).unwrap();
        assert_eq!(mirror.editor_id.as_deref(), Some("Modified_Spell"));
        assert_eq!(mirror.description.as_deref(), Some("Hand written"));
        assert_eq!(mirror.target_type, TargetType::Caster);
        assert!(mirror.range.abs() < f32::EPSILON);
        assert_eq!(engine.patch().record_count(), 1);
        assert_eq!(engine.report().existing_mirrors_reused, 1);
    }

    #[test]
    fn magic_effect_mirror_rewrites_text_and_target() {
        let mut master = Plugin::new(ModKey::new("Master", ModType::Master));
        let effect = master.add_new::<MagicEffect>("Original_Effect").unwrap();
        effect.name = Some("Summon Familiar".to_string());
        effect.description =
            Some("Summons a familiar wherever the caster is pointing.".into());
        effect.target_type = TargetType::TargetLocation;
        let aimed = effect.clone();

        let mut engine = empty_engine();
        let first = engine.mirror_magic_effect(&aimed, None).unwrap();
        let second = engine.mirror_magic_effect(&aimed, None).unwrap();
        assert_eq!(first, second);

        let mirror = engine.patch().get::<MagicEffect>(&first).unwrap();
        assert_eq!(mirror.editor_id.as_deref(), Some("Original_Effect_Self"));
        assert_eq!(mirror.target_type, TargetType::Caster);
        assert_eq!(
            mirror.name.as_deref(),
            Some("Summon Familiar (Next to Caster)")
        );
        assert_eq!(
            mirror.description.as_deref(),
            Some("Summons a familiar right next to the caster.")
        );
    }

    #[test]
    fn existing_magic_effect_keeps_editor_id() {
        let aimed = MagicEffect {
            form_key: "000800:Master.esm".parse().unwrap(),
            editor_id: Some("Original_Effect".to_string()),
            target_type: TargetType::Aimed,
            ..MagicEffect::default()
        };
        let existing = MagicEffect {
            form_key: "000800:Previous.esp".parse().unwrap(),
            editor_id: Some("Modified_Effect".to_string()),
            target_type: TargetType::Aimed,
            name: Some("Stale".to_string()),
            ..MagicEffect::default()
        };

        let mut engine = empty_engine();
        let key = engine.mirror_magic_effect(&aimed, Some(&existing)).unwrap();

        let mirror = engine.patch().get::<MagicEffect>(&key).unwrap();
        assert_eq!(key, existing.form_key);
        assert_eq!(mirror.editor_id.as_deref(), Some("Modified_Effect"));
        assert_eq!(mirror.target_type, TargetType::Caster);
        assert_eq!(mirror.name, None);
    }

    #[test]
    fn editor_id_collision_is_fatal_and_names_the_source() {
        let aimed = aimed_spell();
        let mut patch = Plugin::new(patch_key());
        patch.add_new::<MagicEffect>("Original_Spell_Self").unwrap();

        let mut engine = MirrorEngine::from_link_cache(
            Arc::new(ImmutableLinkCache::default()),
            patch,
            &Settings::default(),
        );
        let err = engine.mirror_spell(&aimed, None).unwrap_err();

        assert!(err.is_synthesis());
        let PatchError::Synthesis(SynthesisError::Storage { record, .. }) = err else {
            panic!("expected storage failure");
        };
        assert!(record.contains("Original_Spell"));
    }

    #[test]
    fn mirror_cache_basics() {
        let mut cache = MirrorCache::default();
        assert!(cache.is_empty());
        let aimed: FormKey = "000800:Master.esm".parse().unwrap();
        let mirror: FormKey = "000800:Patch.esp".parse().unwrap();
        cache.insert(aimed.clone(), mirror.clone());
        assert_eq!(cache.get(&aimed), Some(&mirror));
        assert_eq!(cache.len(), 1);
    }
}
