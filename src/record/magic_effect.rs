//! Magic effect records.

use serde::{Deserialize, Serialize};

use super::key::{FormKey, FormLink};
use super::npc::Npc;
use super::spell::TargetType;

/// How long an effect stays applied once cast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastType {
    /// Always applied.
    ConstantEffect,
    /// Applied once when the cast completes.
    #[default]
    FireAndForget,
    /// Applied while the caster keeps casting.
    Concentration,
    /// Cast from a scroll.
    Scroll,
}

/// Special mechanical behaviour attached to a magic effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Archetype {
    /// Changes an actor value.
    ValueModifier,
    /// Runs attached scripts only.
    Script,
    /// Casts a light.
    Light {
        /// The light record.
        light: FormKey,
    },
    /// Conjures a bound item.
    Bound {
        /// The conjured item.
        item: FormKey,
    },
    /// Summons the associated actor.
    SummonCreature {
        /// The summoned actor.
        #[serde(default)]
        association: FormLink<Npc>,
    },
    /// Paralyzes the target.
    Paralysis,
    /// Surrounds the caster with a cloak effect.
    Cloak,
}

impl Archetype {
    /// A summon archetype for `npc`.
    #[must_use]
    pub fn summon(npc: FormLink<Npc>) -> Self {
        Self::SummonCreature { association: npc }
    }
}

/// A magic effect definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagicEffect {
    /// Identity.
    pub form_key: FormKey,

    /// Editor id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,

    /// In-game display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Text shown in the magic menu; mirrors rewrite it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Keyword records.
    #[serde(default)]
    pub keywords: Vec<FormKey>,

    /// Magicka cost per unit of magnitude.
    pub base_cost: f32,
    /// Raw effect flags.
    pub flags: u32,
    /// Skill needed to cast at full effect.
    pub minimum_skill_level: u32,
    /// Area used by spellmaking.
    pub spellmaking_area: u32,
    /// Cast time used by spellmaking.
    pub spellmaking_casting_time: f32,
    /// How long the effect stays applied.
    pub cast_type: CastType,
    /// How the effect picks its target.
    pub target_type: TargetType,

    /// Special behaviour, summons included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype: Option<Archetype>,

    /// Art shown while casting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casting_art: Option<FormKey>,

    /// Art shown on the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_effect_art: Option<FormKey>,

    /// Sound descriptors.
    #[serde(default)]
    pub sounds: Vec<FormKey>,
}

impl MagicEffect {
    /// The summoned actor, when this effect has the summon archetype.
    #[must_use]
    pub fn summon_association(&self) -> Option<&FormLink<Npc>> {
        match &self.archetype {
            Some(Archetype::SummonCreature { association }) => Some(association),
            _ => None,
        }
    }

    /// Returns true for fire-and-forget summons, the shape the patcher
    /// correlates mirrors by.
    #[must_use]
    pub fn is_fire_and_forget_summon(&self) -> bool {
        self.cast_type == CastType::FireAndForget && self.summon_association().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summon_association_only_for_summons() {
        let npc: FormKey = "000900:Master.esm".parse().unwrap();
        let mut effect = MagicEffect {
            archetype: Some(Archetype::summon(FormLink::new(npc.clone()))),
            ..MagicEffect::default()
        };
        assert_eq!(
            effect.summon_association().map(FormLink::form_key),
            Some(&npc)
        );
        assert!(effect.is_fire_and_forget_summon());

        effect.cast_type = CastType::Concentration;
        assert!(!effect.is_fire_and_forget_summon());

        effect.archetype = Some(Archetype::Cloak);
        assert!(effect.summon_association().is_none());
    }
}
