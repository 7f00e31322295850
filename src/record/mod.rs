//! Definition records.
//!
//! The record layer models the subset of authored game content the patcher
//! reads and writes: spell tomes, spells, magic effects and the NPCs that
//! summoning effects point at. Records reference each other only through
//! [`FormLink`]s; nothing here holds a direct pointer to another record.

mod book;
mod copy;
mod key;
mod magic_effect;
mod npc;
mod spell;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use book::{
    Book, BookTeaches, ObjectRef, PropertyFlags, PropertyValue, ScriptEntry, ScriptEntryFlags,
    ScriptProperty, VirtualMachineAdapter,
};
pub use copy::{DeepCopyIn, MagicEffectCopyMask, SpellCopyMask};
pub use key::{FormKey, FormLink, KeyParseError, ModKey, ModType, MAX_FORM_ID};
pub use magic_effect::{Archetype, CastType, MagicEffect};
pub use npc::Npc;
pub use spell::{Effect, EffectData, Spell, SpellType, TargetType};

/// Discriminates the record groups a plugin holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// `BOOK`
    Book,
    /// `MGEF`
    MagicEffect,
    /// `NPC_`
    Npc,
    /// `SPEL`
    Spell,
}

impl RecordKind {
    /// Four-character record signature.
    #[must_use]
    pub const fn signature(self) -> &'static str {
        match self {
            Self::Book => "BOOK",
            Self::MagicEffect => "MGEF",
            Self::Npc => "NPC_",
            Self::Spell => "SPEL",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// Behaviour shared by every major record type.
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Group this type lives in.
    const KIND: RecordKind;

    /// Creates an empty record with the given identity.
    fn with_identity(form_key: FormKey, editor_id: Option<String>) -> Self;

    /// Stable identity.
    fn form_key(&self) -> &FormKey;

    /// Editor-facing name, if any.
    fn editor_id(&self) -> Option<&str>;

    /// Borrows the typed record out of a [`MajorRecord`] of the right kind.
    fn from_major(record: &MajorRecord) -> Option<&Self>;

    /// Wraps the record.
    fn into_major(self) -> MajorRecord;

    /// Short `EditorId [FormKey]` label for logs and errors.
    fn label(&self) -> String {
        format!(
            "{} [{}]",
            self.editor_id().unwrap_or("<no editor id>"),
            self.form_key()
        )
    }
}

macro_rules! impl_record {
    ($ty:ident, $kind:ident) => {
        impl Record for $ty {
            const KIND: RecordKind = RecordKind::$kind;

            fn with_identity(form_key: FormKey, editor_id: Option<String>) -> Self {
                Self {
                    form_key,
                    editor_id,
                    ..Self::default()
                }
            }

            fn form_key(&self) -> &FormKey {
                &self.form_key
            }

            fn editor_id(&self) -> Option<&str> {
                self.editor_id.as_deref()
            }

            fn from_major(record: &MajorRecord) -> Option<&Self> {
                match record {
                    MajorRecord::$kind(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_major(self) -> MajorRecord {
                MajorRecord::$kind(self)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.label())
            }
        }
    };
}

impl_record!(Book, Book);
impl_record!(MagicEffect, MagicEffect);
impl_record!(Npc, Npc);
impl_record!(Spell, Spell);

/// Any record the link cache can hand out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MajorRecord {
    /// A book.
    Book(Book),
    /// A magic effect.
    MagicEffect(MagicEffect),
    /// An NPC.
    Npc(Npc),
    /// A spell.
    Spell(Spell),
}

impl MajorRecord {
    /// Kind of the wrapped record.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Book(_) => RecordKind::Book,
            Self::MagicEffect(_) => RecordKind::MagicEffect,
            Self::Npc(_) => RecordKind::Npc,
            Self::Spell(_) => RecordKind::Spell,
        }
    }

    /// Identity of the wrapped record.
    #[must_use]
    pub fn form_key(&self) -> &FormKey {
        match self {
            Self::Book(r) => r.form_key(),
            Self::MagicEffect(r) => r.form_key(),
            Self::Npc(r) => r.form_key(),
            Self::Spell(r) => r.form_key(),
        }
    }

    /// Editor id of the wrapped record.
    #[must_use]
    pub fn editor_id(&self) -> Option<&str> {
        match self {
            Self::Book(r) => r.editor_id(),
            Self::MagicEffect(r) => r.editor_id(),
            Self::Npc(r) => r.editor_id(),
            Self::Spell(r) => r.editor_id(),
        }
    }
}
