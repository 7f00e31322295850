//! Discovery of a mirror bound onto a tome by an earlier run or by hand.

use crate::binder::{PROPERTY_NAME, SCRIPT_NAME};
use crate::record::{Book, Spell};
use crate::storage::{LinkCache, LinkCacheExt, Resolution};

/// Returns the spell bound to the tome's attachment point, if any.
///
/// Only object properties named [`PROPERTY_NAME`] on script entries named
/// [`SCRIPT_NAME`] are considered. The first one that resolves to a spell with
/// at least one fire-and-forget summon effect wins; anything else, dangling
/// links included, is ignored.
#[must_use]
pub fn find_existing_spell<'a>(links: &'a dyn LinkCache, book: &Book) -> Option<&'a Spell> {
    let adapter = book.virtual_machine_adapter.as_ref()?;
    adapter
        .scripts
        .iter()
        .filter(|entry| entry.name == SCRIPT_NAME)
        .flat_map(|entry| entry.properties.iter())
        .filter(|property| property.name == PROPERTY_NAME)
        .filter_map(|property| property.as_object())
        .map(|object| links.resolve_key::<Spell>(&object.form_key))
        .filter_map(Resolution::resolved)
        .find(|spell| has_summon_effect(links, spell))
}

fn has_summon_effect(links: &dyn LinkCache, spell: &Spell) -> bool {
    spell.effects.iter().any(|effect| {
        links
            .resolve_link(&effect.base_effect)
            .resolved()
            .is_some_and(|magic_effect| magic_effect.is_fire_and_forget_summon())
    })
}
