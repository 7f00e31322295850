//! Book records and their embedded script attachments.
//!
//! A book may carry a [`VirtualMachineAdapter`]: a list of script entries,
//! each with named properties the attached runtime script reads. The patcher
//! uses one object property on one entry as the attachment point for the
//! mirror spell.

use serde::{Deserialize, Serialize};

use super::key::{FormKey, FormLink};
use super::spell::Spell;

/// What reading a book teaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookTeaches {
    /// A spell tome.
    Spell {
        /// The spell learned on reading.
        spell: FormLink<Spell>,
    },
    /// A skill book.
    Skill {
        /// Name of the skill raised.
        skill: String,
    },
    /// A perk book.
    Perk {
        /// The perk granted.
        perk: FormKey,
    },
}

impl BookTeaches {
    /// The taught spell, for spell tomes.
    #[must_use]
    pub fn spell(&self) -> Option<&FormLink<Spell>> {
        match self {
            Self::Spell { spell } => Some(spell),
            _ => None,
        }
    }
}

/// Property flag bits as the serializer writes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// The value differs from the script's template default.
    pub const EDITED: Self = Self(1);
    /// The property is removed from the inherited script.
    pub const REMOVED: Self = Self(3);

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// A reference held by an object property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Referenced record; null when unset.
    pub form_key: FormKey,
    /// Quest alias, or -1.
    #[serde(default = "ObjectRef::no_alias")]
    pub alias: i16,
}

impl ObjectRef {
    const fn no_alias() -> i16 {
        -1
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self {
            form_key: FormKey::null(),
            alias: Self::no_alias(),
        }
    }
}

/// Typed value of a script property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// A record reference.
    Object(ObjectRef),
    /// A string.
    String(String),
    /// An integer.
    Int(i32),
    /// A float.
    Float(f32),
    /// A boolean.
    Bool(bool),
}

/// A named property on a script entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptProperty {
    /// Name the script reads the property by.
    pub name: String,
    /// Serializer flags.
    #[serde(default)]
    pub flags: PropertyFlags,
    /// Typed value.
    pub value: PropertyValue,
}

impl ScriptProperty {
    /// An object property holding the null reference.
    #[must_use]
    pub fn object(name: impl Into<String>, flags: PropertyFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            value: PropertyValue::Object(ObjectRef::default()),
        }
    }

    /// The held reference, for object properties.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match &self.value {
            PropertyValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns true for object properties.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.as_object().is_some()
    }

    /// Points the property at `form_key`, keeping its alias if it already
    /// held an object.
    pub fn set_object(&mut self, form_key: FormKey) {
        match &mut self.value {
            PropertyValue::Object(object) => object.form_key = form_key,
            other => {
                *other = PropertyValue::Object(ObjectRef {
                    form_key,
                    ..ObjectRef::default()
                });
            }
        }
    }
}

/// Script entry flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptEntryFlags {
    /// Declared on this record.
    #[default]
    Local,
    /// Taken from a template.
    Inherited,
    /// Removed from this record.
    Removed,
    /// Taken from a template and removed.
    InheritedAndRemoved,
}

/// One script attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    /// Script name, matched case-sensitively.
    pub name: String,
    /// Entry flags.
    #[serde(default)]
    pub flags: ScriptEntryFlags,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<ScriptProperty>,
}

impl ScriptEntry {
    /// An entry with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The script-extension container of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachineAdapter {
    /// Serializer version.
    pub version: i16,
    /// Encoding of object properties.
    pub object_format: u16,
    /// Attached scripts in order.
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
}

impl Default for VirtualMachineAdapter {
    fn default() -> Self {
        Self {
            version: 5,
            object_format: 2,
            scripts: Vec::new(),
        }
    }
}

/// A book definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Identity.
    pub form_key: FormKey,

    /// Editor id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Inventory description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Text shown when the book is opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_text: Option<String>,

    /// Keyword records.
    #[serde(default)]
    pub keywords: Vec<FormKey>,

    /// Gold value.
    pub value: u32,
    /// Carry weight.
    pub weight: f32,
    /// Raw book flags.
    pub flags: u8,

    /// What reading the book teaches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teaches: Option<BookTeaches>,

    /// Attached scripts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_machine_adapter: Option<VirtualMachineAdapter>,
}

impl Book {
    /// The taught spell link, when this book is a spell tome.
    #[must_use]
    pub fn taught_spell(&self) -> Option<&FormLink<Spell>> {
        self.teaches.as_ref().and_then(BookTeaches::spell)
    }
}
