//! Alignment of a mirror's effects with a previously authored mirror.
//!
//! Effects are matched by the actor they summon, never by position: a hand
//! edited mirror may list its effects in another order, or lack effects the
//! source gained later.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::MirrorEngine;
use crate::error::{PatchResult, SynthesisError};
use crate::record::{FormKey, FormLink, MagicEffect, Npc, RecordKind, Spell};
use crate::storage::{LinkCache, LinkCacheExt};

/// Maps each summoned actor to the fire-and-forget summon effect of `spell`
/// that summons it. Other effects, and dangling ones, are left out.
///
/// When two effects summon the same actor the first one is kept.
#[must_use]
pub fn index_by_association<'a>(
    links: &'a dyn LinkCache,
    spell: &Spell,
) -> HashMap<&'a FormLink<Npc>, &'a MagicEffect> {
    let mut index = HashMap::new();
    let summons = spell
        .effects
        .iter()
        .filter_map(|effect| links.resolve_link(&effect.base_effect).resolved())
        .filter(|magic_effect| magic_effect.is_fire_and_forget_summon());

    for magic_effect in summons {
        let Some(association) = magic_effect.summon_association() else {
            continue;
        };
        if let Some(kept) = index.get(association) {
            debug!(
                %spell,
                %association,
                %kept,
                dropped = %magic_effect,
                "duplicate summon association"
            );
            continue;
        }
        index.insert(association, magic_effect);
    }
    index
}

impl MirrorEngine {
    /// Redirects every summon effect of the mirror spell `mirror` to the
    /// mirror of its magic effect, reusing the effect of `existing` that
    /// summons the same actor when there is one.
    pub(crate) fn correlate_effects(
        &mut self,
        mirror: &FormKey,
        existing: Option<&Spell>,
    ) -> PatchResult<()> {
        let links = Arc::clone(&self.links);
        let previous = existing
            .map(|spell| index_by_association(links.as_ref(), spell))
            .unwrap_or_default();

        let effects = self
            .patch
            .get::<Spell>(mirror)
            .ok_or_else(|| missing_spell(mirror))?
            .effects
            .clone();

        let mut redirects = Vec::new();
        for (index, effect) in effects.iter().enumerate() {
            let Some(aimed) = links.resolve_link(&effect.base_effect).resolved() else {
                continue;
            };
            if !aimed.is_fire_and_forget_summon() {
                continue;
            }
            let per_effect = aimed
                .summon_association()
                .and_then(|association| previous.get(association))
                .copied();
            let mirrored = self.mirror_magic_effect(aimed, per_effect)?;
            redirects.push((index, mirrored));
        }

        let spell = self
            .patch
            .get_mut::<Spell>(mirror)
            .ok_or_else(|| missing_spell(mirror))?;
        for (index, mirrored) in redirects {
            if let Some(effect) = spell.effects.get_mut(index) {
                effect.base_effect.set_to(mirrored);
            }
        }
        Ok(())
    }
}

fn missing_spell(form_key: &FormKey) -> SynthesisError {
    SynthesisError::MissingOutputRecord {
        kind: RecordKind::Spell,
        form_key: form_key.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::record::{Archetype, CastType, Effect, ModKey, ModType, Record, TargetType};
    use crate::storage::{LoadOrder, Plugin};

    struct World {
        master: Plugin,
        previous: Plugin,
    }

    impl World {
        fn new() -> Self {
            Self {
                master: Plugin::new(ModKey::new("Master", ModType::Master)),
                previous: Plugin::new(ModKey::new("Previous", ModType::Plugin)),
            }
        }

        fn npc(&mut self, editor_id: &str) -> FormLink<Npc> {
            let npc = self.master.add_new::<Npc>(editor_id).unwrap();
            FormLink::new(npc.form_key.clone())
        }

        fn summon(
            plugin: &mut Plugin,
            editor_id: &str,
            npc: &FormLink<Npc>,
        ) -> FormLink<MagicEffect> {
            let effect = plugin.add_new::<MagicEffect>(editor_id).unwrap();
            effect.cast_type = CastType::FireAndForget;
            effect.target_type = TargetType::TargetLocation;
            effect.archetype = Some(Archetype::summon(npc.clone()));
            FormLink::new(effect.form_key.clone())
        }

        fn spell(
            plugin: &mut Plugin,
            editor_id: &str,
            effects: &[FormLink<MagicEffect>],
        ) -> Spell {
            let spell = plugin.add_new::<Spell>(editor_id).unwrap();
            spell.target_type = TargetType::TargetLocation;
            spell.effects = effects.iter().cloned().map(Effect::new).collect();
            spell.clone()
        }

        fn engine(self) -> MirrorEngine {
            let load_order: LoadOrder = vec![self.master, self.previous].into_iter().collect();
            MirrorEngine::from_link_cache(
                Arc::new(load_order.to_immutable_link_cache()),
                Plugin::new(ModKey::new("Patch", ModType::Plugin)),
                &Settings::default(),
            )
        }
    }

    fn base_effects(engine: &MirrorEngine, spell: &FormKey) -> Vec<FormKey> {
        engine
            .patch()
            .get::<Spell>(spell)
            .unwrap()
            .effects
            .iter()
            .map(|effect| effect.base_effect.form_key().clone())
            .collect()
    }

    #[test]
    fn correlates_by_association_not_position() {
        let mut world = World::new();
        let npc_a = world.npc("NpcA");
        let npc_b = world.npc("NpcB");
        let aimed_a = World::summon(&mut world.master, "SummonA", &npc_a);
        let aimed_b = World::summon(&mut world.master, "SummonB", &npc_b);
        let aimed = World::spell(&mut world.master, "SummonPair", &[aimed_a, aimed_b]);

        let mirror_b = World::summon(&mut world.previous, "SummonB_Hand", &npc_b);
        let mirror_a = World::summon(&mut world.previous, "SummonA_Hand", &npc_a);
        let existing = World::spell(
            &mut world.previous,
            "SummonPair_Hand",
            &[mirror_b.clone(), mirror_a.clone()],
        );

        let mut engine = world.engine();
        let mirror = engine.mirror_spell(&aimed, Some(&existing)).unwrap();

        assert_eq!(
            base_effects(&engine, &mirror),
            vec![mirror_a.form_key().clone(), mirror_b.form_key().clone()]
        );
        let reused = engine
            .patch()
            .get::<MagicEffect>(mirror_a.form_key())
            .unwrap();
        assert_eq!(reused.editor_id.as_deref(), Some("SummonA_Hand"));
        assert_eq!(reused.summon_association(), Some(&npc_a));
        assert_eq!(engine.report().existing_mirrors_reused, 3);
    }

    #[test]
    fn new_summon_without_counterpart_gets_fresh_mirror() {
        let mut world = World::new();
        let npc_a = world.npc("NpcA");
        let npc_b = world.npc("NpcB");
        let aimed_a = World::summon(&mut world.master, "SummonA", &npc_a);
        let aimed_b = World::summon(&mut world.master, "SummonB", &npc_b);
        let aimed = World::spell(&mut world.master, "SummonPair", &[aimed_a, aimed_b]);

        let mirror_a = World::summon(&mut world.previous, "SummonA_Hand", &npc_a);
        let existing = World::spell(&mut world.previous, "SummonPair_Hand", &[mirror_a.clone()]);

        let mut engine = world.engine();
        let mirror = engine.mirror_spell(&aimed, Some(&existing)).unwrap();
        let effects = base_effects(&engine, &mirror);

        assert_eq!(effects[0], *mirror_a.form_key());
        let fresh = engine.patch().get::<MagicEffect>(&effects[1]).unwrap();
        assert_eq!(fresh.editor_id.as_deref(), Some("SummonB_Self"));
        assert_eq!(fresh.form_key.mod_key().name(), "Patch");
        assert_eq!(engine.report().magic_effects_mirrored, 2);
    }

    #[test]
    fn non_summon_effects_are_not_redirected() {
        let mut world = World::new();
        let npc = world.npc("Npc");
        let summon = World::summon(&mut world.master, "Summon", &npc);
        let light = {
            let effect = world.master.add_new::<MagicEffect>("Light").unwrap();
            effect.archetype = Some(Archetype::Light { light: FormKey::null() });
            FormLink::new(effect.form_key.clone())
        };
        let dangling = FormLink::new("000FFF:Missing.esp".parse().unwrap());
        let aimed = World::spell(
            &mut world.master,
            "Mixed",
            &[light.clone(), summon.clone(), dangling.clone()],
        );

        let mut engine = world.engine();
        let mirror = engine.mirror_spell(&aimed, None).unwrap();
        let effects = base_effects(&engine, &mirror);

        assert_eq!(effects[0], *light.form_key());
        assert_ne!(effects[1], *summon.form_key());
        assert_eq!(effects[2], *dangling.form_key());
        assert_eq!(engine.patch().group::<MagicEffect>().len(), 1);
    }

    #[test]
    fn shared_summon_effect_is_mirrored_once() {
        let mut world = World::new();
        let npc = world.npc("Npc");
        let summon = World::summon(&mut world.master, "Summon", &npc);
        let first = World::spell(&mut world.master, "First", &[summon.clone()]);
        let second = World::spell(&mut world.master, "Second", &[summon]);

        let mut engine = world.engine();
        let first = engine.mirror_spell(&first, None).unwrap();
        let second = engine.mirror_spell(&second, None).unwrap();

        assert_eq!(
            base_effects(&engine, &first),
            base_effects(&engine, &second)
        );
        assert_eq!(engine.patch().group::<MagicEffect>().len(), 1);
    }

    #[test]
    fn index_keeps_first_of_duplicate_associations() {
        let mut world = World::new();
        let npc = world.npc("Npc");
        let first = World::summon(&mut world.master, "First", &npc);
        let second = World::summon(&mut world.master, "Second", &npc);
        let spell = World::spell(&mut world.master, "Twice", &[first, second]);

        let load_order: LoadOrder = std::iter::once(world.master).collect();
        let cache = load_order.to_immutable_link_cache();
        let index = index_by_association(&cache, &spell);

        assert_eq!(index.len(), 1);
        assert_eq!(index[&npc].editor_id(), Some("First"));
    }
}
