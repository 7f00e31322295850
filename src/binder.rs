//! Find-or-create of the attachment point on a book.
//!
//! The companion script reads the mirror spell from one object property on
//! one script entry. Both lookups are idempotent: calling them again on the
//! same book returns the entry and property created the first time.

use crate::record::{Book, PropertyFlags, ScriptEntry, ScriptProperty};

/// Script attached to patched books.
pub const SCRIPT_NAME: &str = "DankAddSecondSpell";

/// Object property on [`SCRIPT_NAME`] that holds the mirror spell.
pub const PROPERTY_NAME: &str = "SecondSpell";

/// Returns the book's script entry called `name`, creating the script
/// container and the entry as needed.
pub fn get_or_create_script_entry<'a>(book: &'a mut Book, name: &str) -> &'a mut ScriptEntry {
    let adapter = book.virtual_machine_adapter.get_or_insert_with(Default::default);
    let index = match adapter.scripts.iter().position(|entry| entry.name == name) {
        Some(index) => index,
        None => {
            adapter.scripts.push(ScriptEntry::new(name));
            adapter.scripts.len() - 1
        }
    };
    &mut adapter.scripts[index]
}

/// Returns the entry's object property called `name`, appending one flagged
/// as edited when none exists.
///
/// A property with the right name but a non-object value does not count.
pub fn get_or_create_object_property<'a>(
    entry: &'a mut ScriptEntry,
    name: &str,
) -> &'a mut ScriptProperty {
    let found = entry
        .properties
        .iter()
        .position(|property| property.name == name && property.is_object());
    let index = match found {
        Some(index) => index,
        None => {
            entry
                .properties
                .push(ScriptProperty::object(name, PropertyFlags::EDITED));
            entry.properties.len() - 1
        }
    };
    &mut entry.properties[index]
}
