//! Field-masked deep copies between records of the same type.
//!
//! `deep_copy_in` copies every field of the source except the ones its mask
//! switches off. The record identity (`form_key`) is never copied. Each
//! implementation destructures the source exhaustively, so adding a field to a
//! record fails to compile until the copy decides what to do with it.

use super::magic_effect::MagicEffect;
use super::spell::Spell;

/// Copies fields from another record of the same type, subject to a mask.
pub trait DeepCopyIn {
    /// Per-type selection of copyable fields.
    type Mask;

    /// Overwrites `self` with the fields of `source` enabled in `mask`.
    fn deep_copy_in(&mut self, source: &Self, mask: &Self::Mask);
}

/// Selects which of a spell's identity and presentation fields are copied.
/// Every other field is always copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpellCopyMask {
    /// Copy the editor id.
    pub editor_id: bool,
    /// Copy the display name.
    pub name: bool,
    /// Copy the description.
    pub description: bool,
    /// Copy the target type.
    pub target_type: bool,
    /// Copy the range.
    pub range: bool,
}

impl SpellCopyMask {
    /// Copies everything.
    pub const ALL: Self = Self {
        editor_id: true,
        name: true,
        description: true,
        target_type: true,
        range: true,
    };

    /// Leaves identity, presentation, targeting and range to the mirror logic.
    pub const MIRROR: Self = Self {
        editor_id: false,
        name: false,
        description: false,
        target_type: false,
        range: false,
    };
}

/// Selects which of a magic effect's identity and presentation fields are copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicEffectCopyMask {
    /// Copy the editor id.
    pub editor_id: bool,
    /// Copy the display name.
    pub name: bool,
    /// Copy the description.
    pub description: bool,
    /// Copy the target type.
    pub target_type: bool,
}

impl MagicEffectCopyMask {
    /// Copies everything.
    pub const ALL: Self = Self {
        editor_id: true,
        name: true,
        description: true,
        target_type: true,
    };

    /// Leaves identity, presentation and targeting to the mirror logic.
    pub const MIRROR: Self = Self {
        editor_id: false,
        name: false,
        description: false,
        target_type: false,
    };
}

impl DeepCopyIn for Spell {
    type Mask = SpellCopyMask;

    fn deep_copy_in(&mut self, source: &Self, mask: &SpellCopyMask) {
        let Spell {
            form_key: _,
            editor_id,
            name,
            description,
            keywords,
            menu_display_object,
            equipment_type,
            base_cost,
            flags,
            spell_type,
            charge_time,
            cast_type,
            target_type,
            cast_duration,
            range,
            half_cost_perk,
            effects,
        } = source;

        if mask.editor_id {
            self.editor_id.clone_from(editor_id);
        }
        if mask.name {
            self.name.clone_from(name);
        }
        if mask.description {
            self.description.clone_from(description);
        }
        if mask.target_type {
            self.target_type = *target_type;
        }
        if mask.range {
            self.range = *range;
        }

        self.keywords.clone_from(keywords);
        self.menu_display_object.clone_from(menu_display_object);
        self.equipment_type.clone_from(equipment_type);
        self.base_cost = *base_cost;
        self.flags = *flags;
        self.spell_type = *spell_type;
        self.charge_time = *charge_time;
        self.cast_type = *cast_type;
        self.cast_duration = *cast_duration;
        self.half_cost_perk.clone_from(half_cost_perk);
        self.effects.clone_from(effects);
    }
}

impl DeepCopyIn for MagicEffect {
    type Mask = MagicEffectCopyMask;

    fn deep_copy_in(&mut self, source: &Self, mask: &MagicEffectCopyMask) {
        let MagicEffect {
            form_key: _,
            editor_id,
            name,
            description,
            keywords,
            base_cost,
            flags,
            minimum_skill_level,
            spellmaking_area,
            spellmaking_casting_time,
            cast_type,
            target_type,
            archetype,
            casting_art,
            hit_effect_art,
            sounds,
        } = source;

        if mask.editor_id {
            self.editor_id.clone_from(editor_id);
        }
        if mask.name {
            self.name.clone_from(name);
        }
        if mask.description {
            self.description.clone_from(description);
        }
        if mask.target_type {
            self.target_type = *target_type;
        }

        self.keywords.clone_from(keywords);
        self.base_cost = *base_cost;
        self.flags = *flags;
        self.minimum_skill_level = *minimum_skill_level;
        self.spellmaking_area = *spellmaking_area;
        self.spellmaking_casting_time = *spellmaking_casting_time;
        self.cast_type = *cast_type;
        self.archetype.clone_from(archetype);
        self.casting_art.clone_from(casting_art);
        self.hit_effect_art.clone_from(hit_effect_art);
        self.sounds.clone_from(sounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Archetype, CastType, Effect, FormKey, FormLink, SpellType, TargetType};

    fn key(s: &str) -> FormKey {
        s.parse().unwrap()
    }

    fn source_spell() -> Spell {
        Spell {
            form_key: key("000800:Master.esm"),
            editor_id: Some("ConjureFamiliar".to_string()),
            name: Some("Conjure Familiar".to_string()),
            description: Some("Summons a familiar wherever the caster is pointing.".into()),
            keywords: vec![key("000900:Master.esm")],
            base_cost: 35,
            flags: 0x10,
            spell_type: SpellType::Spell,
            charge_time: 0.5,
            cast_type: CastType::FireAndForget,
            target_type: TargetType::TargetLocation,
            range: 250.0,
            effects: vec![Effect::new(FormLink::new(key("000801:Master.esm")))],
            ..Spell::default()
        }
    }

    #[test]
    fn test_spell_mirror_mask_skips_exactly_the_excluded_fields() {
        let source = source_spell();
        let mut target = Spell {
            form_key: key("000800:Patch.esp"),
            editor_id: Some("Hand_Authored".to_string()),
            name: Some("Hand Name".to_string()),
            description: Some("Hand description".to_string()),
            target_type: TargetType::Aimed,
            range: 32.0,
            ..Spell::default()
        };

        target.deep_copy_in(&source, &SpellCopyMask::MIRROR);

        assert_eq!(target.form_key, key("000800:Patch.esp"));
        assert_eq!(target.editor_id.as_deref(), Some("Hand_Authored"));
        assert_eq!(target.name.as_deref(), Some("Hand Name"));
        assert_eq!(target.description.as_deref(), Some("Hand description"));
        assert_eq!(target.target_type, TargetType::Aimed);
        assert!((target.range - 32.0).abs() < f32::EPSILON);

        assert_eq!(target.keywords, source.keywords);
        assert_eq!(target.base_cost, 35);
        assert_eq!(target.flags, 0x10);
        assert!((target.charge_time - 0.5).abs() < f32::EPSILON);
        assert_eq!(target.effects, source.effects);
    }

    #[test]
    fn test_spell_full_mask_copies_everything_but_identity() {
        let source = source_spell();
        let mut target = Spell {
            form_key: key("000800:Patch.esp"),
            ..Spell::default()
        };

        target.deep_copy_in(&source, &SpellCopyMask::ALL);

        let expected = Spell {
            form_key: key("000800:Patch.esp"),
            ..source
        };
        assert_eq!(target, expected);
    }

    #[test]
    fn test_magic_effect_mirror_mask_skips_exactly_the_excluded_fields() {
        let npc = FormLink::new(key("000A00:Master.esm"));
        let source = MagicEffect {
            form_key: key("000801:Master.esm"),
            editor_id: Some("SummonFamiliarFX".to_string()),
            name: Some("Summon Familiar".to_string()),
            description: Some("wherever the caster is pointing".to_string()),
            base_cost: 12.5,
            cast_type: CastType::FireAndForget,
            target_type: TargetType::TargetLocation,
            archetype: Some(Archetype::summon(npc)),
            ..MagicEffect::default()
        };
        let mut target = MagicEffect {
            form_key: key("000801:Patch.esp"),
            editor_id: Some("Kept".to_string()),
            target_type: TargetType::Aimed,
            ..MagicEffect::default()
        };

        target.deep_copy_in(&source, &MagicEffectCopyMask::MIRROR);

        assert_eq!(target.form_key, key("000801:Patch.esp"));
        assert_eq!(target.editor_id.as_deref(), Some("Kept"));
        assert_eq!(target.name, None);
        assert_eq!(target.description, None);
        assert_eq!(target.target_type, TargetType::Aimed);
        assert_eq!(target.archetype, source.archetype);
        assert!((target.base_cost - 12.5).abs() < f32::EPSILON);
    }
}
