//! Candidate scanning over winning book overrides.
//!
//! A book is a candidate when it teaches a spell aimed at a location and at
//! least one of that spell's effects is a location-aimed, fire-and-forget
//! summon. Everything that does not match, including dangling links, is
//! skipped silently.

use tracing::trace;

use crate::record::{Book, MagicEffect, Record, RecordKind, Spell, TargetType};
use crate::storage::{LinkCache, LinkCacheExt, WinningOverrides};

/// A spell tome whose spell should get a self-targeted mirror.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The tome, as it wins in the load order.
    pub book: &'a Book,
    /// The aimed spell it teaches.
    pub spell: &'a Spell,
    /// The first effect that qualified the pair.
    pub summon: &'a MagicEffect,
}

/// Lazy iterator over [`Candidate`]s, in winning-override order.
pub struct Candidates<'a> {
    books: Box<dyn Iterator<Item = &'a Book> + 'a>,
    links: &'a dyn LinkCache,
}

impl<'a> Candidates<'a> {
    /// Scans the winning books of `overrides`, resolving links through `links`.
    pub fn new(overrides: &'a dyn WinningOverrides, links: &'a dyn LinkCache) -> Self {
        let books = overrides
            .winning_overrides(RecordKind::Book)
            .filter_map(Book::from_major);
        Self {
            books: Box::new(books),
            links,
        }
    }
}

impl<'a> Iterator for Candidates<'a> {
    type Item = Candidate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let links = self.links;
        self.books.by_ref().find_map(|book| match_book(links, book))
    }
}

/// Checks one book against the pattern.
#[must_use]
pub fn match_book<'a>(links: &'a dyn LinkCache, book: &'a Book) -> Option<Candidate<'a>> {
    let link = book.taught_spell()?;
    let Some(spell) = links.resolve_link(link).resolved() else {
        trace!(%book, spell = %link, "taught spell does not resolve");
        return None;
    };
    if spell.target_type != TargetType::TargetLocation {
        trace!(%book, %spell, "spell is not aimed at a location");
        return None;
    }
    let Some(summon) = first_aimed_summon(links, spell) else {
        trace!(%book, %spell, "spell has no aimed fire-and-forget summon");
        return None;
    };
    Some(Candidate { book, spell, summon })
}

/// First effect of `spell`, in declaration order, that resolves to a
/// location-aimed fire-and-forget summon.
#[must_use]
pub fn first_aimed_summon<'a>(links: &'a dyn LinkCache, spell: &Spell) -> Option<&'a MagicEffect> {
    spell
        .effects
        .iter()
        .filter_map(|effect| links.resolve_link(&effect.base_effect).resolved())
        .find(|magic_effect| {
            magic_effect.is_fire_and_forget_summon()
                && magic_effect.target_type == TargetType::TargetLocation
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Archetype, BookTeaches, CastType, Effect, FormLink, ModKey, ModType, Npc};
    use crate::storage::{ImmutableLinkCache, LoadOrder, Plugin};

    struct Fixture {
        master: Plugin,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                master: Plugin::new(ModKey::new("Master", ModType::Master)),
            }
        }

        fn summon(
            &mut self,
            editor_id: &str,
            cast: CastType,
            target: TargetType,
            summon: bool,
        ) -> FormLink<MagicEffect> {
            let npc = self
                .master
                .add_new::<Npc>(format!("{editor_id}_NPC"))
                .unwrap()
                .form_key
                .clone();
            let effect = self.master.add_new::<MagicEffect>(editor_id).unwrap();
            effect.cast_type = cast;
            effect.target_type = target;
            if summon {
                effect.archetype = Some(Archetype::summon(FormLink::new(npc)));
            }
            FormLink::new(effect.form_key.clone())
        }

        fn tome(&mut self, name: &str, target: TargetType, effects: Vec<FormLink<MagicEffect>>) {
            let spell = self
                .master
                .add_new::<Spell>(format!("{name}Spell"))
                .unwrap();
            spell.target_type = target;
            spell.effects = effects.into_iter().map(Effect::new).collect();
            let spell = FormLink::new(spell.form_key.clone());
            let book = self
                .master
                .add_new::<Book>(format!("{name}Book"))
                .unwrap();
            book.teaches = Some(BookTeaches::Spell { spell });
        }

        fn cache(self) -> ImmutableLinkCache {
            let load_order: LoadOrder = std::iter::once(self.master).collect();
            load_order.to_immutable_link_cache()
        }
    }

    fn scan(cache: &ImmutableLinkCache) -> Vec<String> {
        Candidates::new(cache, cache)
            .map(|candidate| candidate.book.editor_id().unwrap_or_default())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn matches_aimed_summon_tome() {
        let mut fixture = Fixture::new();
        let effect = fixture.summon(
            "Summon",
            CastType::FireAndForget,
            TargetType::TargetLocation,
            true,
        );
        fixture.tome("Familiar", TargetType::TargetLocation, vec![effect]);

        assert_eq!(scan(&fixture.cache()), vec!["FamiliarBook".to_string()]);
    }

    #[test]
    fn each_condition_is_required() {
        let mut fixture = Fixture::new();
        let not_summon = fixture.summon(
            "NotSummon",
            CastType::FireAndForget,
            TargetType::TargetLocation,
            false,
        );
        let concentration = fixture.summon(
            "Concentration",
            CastType::Concentration,
            TargetType::TargetLocation,
            true,
        );
        let aimed = fixture.summon(
            "Aimed",
            CastType::FireAndForget,
            TargetType::Aimed,
            true,
        );
        let good = fixture.summon(
            "Good",
            CastType::FireAndForget,
            TargetType::TargetLocation,
            true,
        );

        fixture.tome("NoArchetype", TargetType::TargetLocation, vec![not_summon]);
        fixture.tome("Sustained", TargetType::TargetLocation, vec![concentration]);
        fixture.tome("EffectAimed", TargetType::TargetLocation, vec![aimed]);
        fixture.tome("SpellSelf", TargetType::Caster, vec![good]);
        fixture.master.add_new::<Book>("PlainBook").unwrap();

        assert!(scan(&fixture.cache()).is_empty());
    }

    #[test]
    fn dangling_links_are_non_matches() {
        let mut fixture = Fixture::new();
        let dangling = FormLink::new("000FFF:Missing.esp".parse().unwrap());
        let good = fixture.summon(
            "Good",
            CastType::FireAndForget,
            TargetType::TargetLocation,
            true,
        );
        fixture.tome("Dangling", TargetType::TargetLocation, vec![dangling, good]);
        let ghost = FormLink::new("000FFE:Missing.esp".parse().unwrap());
        let book = fixture.master.add_new::<Book>("GhostBook").unwrap();
        book.teaches = Some(BookTeaches::Spell { spell: ghost });

        assert_eq!(scan(&fixture.cache()), vec!["DanglingBook".to_string()]);
    }

    #[test]
    fn first_qualifying_effect_wins() {
        let mut fixture = Fixture::new();
        let other = fixture.summon(
            "Other",
            CastType::Concentration,
            TargetType::TargetLocation,
            true,
        );
        let first = fixture.summon(
            "First",
            CastType::FireAndForget,
            TargetType::TargetLocation,
            true,
        );
        let second = fixture.summon(
            "Second",
            CastType::FireAndForget,
            TargetType::TargetLocation,
            true,
        );
        fixture.tome(
            "Pair",
            TargetType::TargetLocation,
            vec![other, first, second],
        );

        let cache = fixture.cache();
        let candidate = Candidates::new(&cache, &cache).next().unwrap();
        assert_eq!(candidate.summon.editor_id.as_deref(), Some("First"));
    }
}
