//! Spell records and their effect lists.

use serde::{Deserialize, Serialize};

use super::key::{FormKey, FormLink};
use super::magic_effect::{CastType, MagicEffect};

/// How a spell or effect picks its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Targets the caster.
    #[default]
    #[serde(rename = "self")]
    Caster,
    /// Targets what the caster touches.
    Touch,
    /// Fired as a projectile.
    Aimed,
    /// Targets the actor under the crosshair.
    TargetActor,
    /// Targets the spot under the crosshair.
    TargetLocation,
}

/// Spell category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellType {
    /// A regular spell.
    #[default]
    Spell,
    /// A disease.
    Disease,
    /// A once-a-day power.
    Power,
    /// A power usable at will.
    LesserPower,
    /// A permanent ability.
    Ability,
    /// A poison.
    Poison,
    /// An addiction.
    Addiction,
    /// A shout.
    Voice,
}

/// Magnitude, area and duration of one effect entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectData {
    /// Strength.
    pub magnitude: f32,
    /// Area of effect in feet.
    pub area: u32,
    /// Duration in seconds.
    pub duration: u32,
}

/// One entry of a spell's effect list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// The magic effect this entry applies.
    pub base_effect: FormLink<MagicEffect>,

    /// Magnitude, area and duration.
    #[serde(default)]
    pub data: EffectData,

    /// Opaque condition blocks, carried through untouched.
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Effect {
    /// An entry applying `base_effect` with zeroed data.
    #[must_use]
    pub fn new(base_effect: FormLink<MagicEffect>) -> Self {
        Self {
            base_effect,
            ..Self::default()
        }
    }
}

/// A spell definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    /// Identity.
    pub form_key: FormKey,

    /// Editor id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,

    /// In-game display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Keyword records.
    #[serde(default)]
    pub keywords: Vec<FormKey>,

    /// Model shown in the magic menu.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_display_object: Option<FormKey>,

    /// Hand slot the spell is equipped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<FormKey>,

    /// Magicka cost before perks.
    pub base_cost: u32,
    /// Raw spell flags.
    pub flags: u32,
    /// Spell category.
    pub spell_type: SpellType,
    /// Seconds to charge.
    pub charge_time: f32,
    /// How long the spell stays applied.
    pub cast_type: CastType,
    /// How the spell picks its target.
    pub target_type: TargetType,
    /// Seconds the cast lasts.
    pub cast_duration: f32,
    /// Reach for aimed spells; zero when self-targeted.
    pub range: f32,

    /// Perk that halves the cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_cost_perk: Option<FormKey>,

    /// Ordered effect list.
    #[serde(default)]
    pub effects: Vec<Effect>,
}
