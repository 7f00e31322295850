//! In-memory storage backend.
//!
//! This module provides in-memory plugins, a priority-ordered load order and
//! an immutable link cache snapshotting it. It is the reference implementation
//! of the storage traits and what the tests and benches run against.

use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::record::{
    Book, FormKey, MagicEffect, MajorRecord, ModKey, Npc, Record, RecordKind, Spell, MAX_FORM_ID,
};
use crate::storage::traits::{LinkCache, Resolution, StorageError, WinningOverrides};

/// First local id handed out for new records.
pub const FIRST_FORM_ID: u32 = 0x800;

/// Records of one kind inside a plugin, ordered by identity.
#[derive(Debug, Clone)]
pub struct Group<T> {
    records: BTreeMap<FormKey, T>,
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<T: Record> Group<T> {
    /// Looks up a record.
    #[must_use]
    pub fn get(&self, key: &FormKey) -> Option<&T> {
        self.records.get(key)
    }

    /// Looks up a record for editing.
    pub fn get_mut(&mut self, key: &FormKey) -> Option<&mut T> {
        self.records.get_mut(key)
    }

    /// Returns true if the group holds `key`.
    #[must_use]
    pub fn contains(&self, key: &FormKey) -> bool {
        self.records.contains_key(key)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in identity order.
    pub fn iter(&self) -> btree_map::Values<'_, FormKey, T> {
        self.records.values()
    }

    fn insert(&mut self, record: T) -> &mut T {
        match self.records.entry(record.form_key().clone()) {
            btree_map::Entry::Occupied(mut slot) => {
                slot.insert(record);
                slot.into_mut()
            }
            btree_map::Entry::Vacant(slot) => slot.insert(record),
        }
    }
}

/// Record types a [`Plugin`] has a group for.
pub trait Grouped: Record + Default {
    /// The plugin's group for this type.
    fn group(plugin: &Plugin) -> &Group<Self>;

    /// The plugin's group for this type, mutably.
    fn group_mut(plugin: &mut Plugin) -> &mut Group<Self>;
}

macro_rules! impl_grouped {
    ($ty:ty, $field:ident) => {
        impl Grouped for $ty {
            fn group(plugin: &Plugin) -> &Group<Self> {
                &plugin.$field
            }

            fn group_mut(plugin: &mut Plugin) -> &mut Group<Self> {
                &mut plugin.$field
            }
        }
    };
}

impl_grouped!(Book, books);
impl_grouped!(MagicEffect, magic_effects);
impl_grouped!(Npc, npcs);
impl_grouped!(Spell, spells);

/// A data package: new records it defines plus overrides of records defined
/// by earlier plugins.
///
/// Editor ids are indexed when a record enters the plugin; they are expected
/// to stay fixed afterwards.
#[derive(Debug, Clone)]
pub struct Plugin {
    mod_key: ModKey,
    next_form_id: u32,
    editor_ids: HashMap<String, FormKey>,
    books: Group<Book>,
    magic_effects: Group<MagicEffect>,
    npcs: Group<Npc>,
    spells: Group<Spell>,
}

impl Plugin {
    /// Creates an empty plugin.
    #[must_use]
    pub fn new(mod_key: ModKey) -> Self {
        Self {
            mod_key,
            next_form_id: FIRST_FORM_ID,
            editor_ids: HashMap::new(),
            books: Group::default(),
            magic_effects: Group::default(),
            npcs: Group::default(),
            spells: Group::default(),
        }
    }

    /// Identity of this plugin.
    #[must_use]
    pub const fn mod_key(&self) -> &ModKey {
        &self.mod_key
    }

    /// The group holding records of type `T`.
    #[must_use]
    pub fn group<T: Grouped>(&self) -> &Group<T> {
        T::group(self)
    }

    /// Looks up a record of type `T`.
    #[must_use]
    pub fn get<T: Grouped>(&self, key: &FormKey) -> Option<&T> {
        T::group(self).get(key)
    }

    /// Looks up a record of type `T` for editing.
    pub fn get_mut<T: Grouped>(&mut self, key: &FormKey) -> Option<&mut T> {
        T::group_mut(self).get_mut(key)
    }

    /// Total number of records across all groups.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.books.len() + self.magic_effects.len() + self.npcs.len() + self.spells.len()
    }

    /// Returns true when the plugin holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Iterates every record, group by group.
    pub fn major_records(&self) -> impl Iterator<Item = MajorRecord> + '_ {
        let books = self.books.iter().cloned().map(Record::into_major);
        let effects = self.magic_effects.iter().cloned().map(Record::into_major);
        let npcs = self.npcs.iter().cloned().map(Record::into_major);
        let spells = self.spells.iter().cloned().map(Record::into_major);
        books.chain(effects).chain(npcs).chain(spells)
    }

    /// Adds a new record owned by this plugin, allocating the next local id.
    ///
    /// # Errors
    /// - `DuplicateEditorId`: another record in this plugin already uses `editor_id`
    /// - `FormIdsExhausted`: the plugin has allocated every 24-bit id
    pub fn add_new<T: Grouped>(
        &mut self,
        editor_id: impl Into<String>,
    ) -> Result<&mut T, StorageError> {
        let editor_id = editor_id.into();
        if let Some(existing) = self.editor_ids.get(&editor_id) {
            return Err(StorageError::DuplicateEditorId {
                editor_id,
                existing: existing.clone(),
                mod_key: self.mod_key.clone(),
            });
        }
        if self.next_form_id > MAX_FORM_ID {
            return Err(StorageError::FormIdsExhausted {
                mod_key: self.mod_key.clone(),
            });
        }

        let form_key = FormKey::new(self.mod_key.clone(), self.next_form_id).map_err(|_| {
            StorageError::FormIdsExhausted {
                mod_key: self.mod_key.clone(),
            }
        })?;
        self.next_form_id += 1;
        self.editor_ids.insert(editor_id.clone(), form_key.clone());
        debug!(%form_key, %editor_id, kind = %T::KIND, "added new record");

        let record = T::with_identity(form_key, Some(editor_id));
        Ok(T::group_mut(self).insert(record))
    }

    /// Returns this plugin's version of `record`, copying it in as an
    /// override first if the plugin does not hold it yet.
    pub fn get_or_add_as_override<T: Grouped>(&mut self, record: &T) -> &mut T {
        let key = record.form_key().clone();
        if !T::group(self).contains(&key) {
            if let Some(editor_id) = record.editor_id() {
                self.editor_ids
                    .entry(editor_id.to_string())
                    .or_insert_with(|| key.clone());
            }
            debug!(form_key = %key, kind = %T::KIND, "added override");
        }
        match T::group_mut(self).records.entry(key) {
            btree_map::Entry::Occupied(slot) => slot.into_mut(),
            btree_map::Entry::Vacant(slot) => slot.insert(record.clone()),
        }
    }

    /// Inserts or replaces a fully-formed record, keeping its identity.
    ///
    /// Used to author fixtures and hand-made records; the plugin's id
    /// allocator is advanced past any id it owns.
    pub fn upsert<T: Grouped>(&mut self, record: T) -> &mut T {
        let key = record.form_key().clone();
        if key.mod_key() == &self.mod_key && key.id() >= self.next_form_id {
            self.next_form_id = key.id() + 1;
        }
        if let Some(editor_id) = record.editor_id() {
            self.editor_ids.insert(editor_id.to_string(), key);
        }
        T::group_mut(self).insert(record)
    }
}

/// A plugin's slot in the load order.
#[derive(Debug, Clone)]
pub struct ModListing {
    /// The plugin contents.
    pub plugin: Plugin,
    /// Disabled listings are skipped.
    pub enabled: bool,
}

/// Plugins in ascending priority: later listings override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct LoadOrder {
    listings: Vec<ModListing>,
}

impl LoadOrder {
    /// Creates an empty load order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin at the highest priority.
    pub fn push(&mut self, plugin: Plugin, enabled: bool) {
        self.listings.push(ModListing { plugin, enabled });
    }

    /// Number of listings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Returns true when nothing is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listings from lowest to highest priority.
    pub fn listings(&self) -> impl Iterator<Item = &ModListing> {
        self.listings.iter()
    }

    /// Enabled plugins from highest to lowest priority.
    pub fn priority_order(&self) -> impl Iterator<Item = &Plugin> {
        self.listings
            .iter()
            .rev()
            .filter(|listing| listing.enabled)
            .map(|listing| &listing.plugin)
    }

    /// Snapshots the current load order into a link cache.
    #[must_use]
    pub fn to_immutable_link_cache(&self) -> ImmutableLinkCache {
        ImmutableLinkCache::from_plugins(self.priority_order())
    }
}

impl FromIterator<Plugin> for LoadOrder {
    fn from_iter<I: IntoIterator<Item = Plugin>>(iter: I) -> Self {
        Self {
            listings: iter
                .into_iter()
                .map(|plugin| ModListing {
                    plugin,
                    enabled: true,
                })
                .collect(),
        }
    }
}

/// Winning-override snapshot of a load order.
///
/// Implements both [`LinkCache`] and [`WinningOverrides`]. Later changes to the
/// load order are not reflected.
#[derive(Debug, Clone, Default)]
pub struct ImmutableLinkCache {
    records: HashMap<FormKey, MajorRecord>,
    order: HashMap<RecordKind, Vec<FormKey>>,
}

impl ImmutableLinkCache {
    /// Builds the snapshot from plugins given highest priority first.
    pub fn from_plugins<'a>(plugins: impl IntoIterator<Item = &'a Plugin>) -> Self {
        let mut cache = Self::default();
        for plugin in plugins {
            for record in plugin.major_records() {
                if cache.records.contains_key(record.form_key()) {
                    continue;
                }
                cache
                    .order
                    .entry(record.kind())
                    .or_default()
                    .push(record.form_key().clone());
                cache.records.insert(record.form_key().clone(), record);
            }
        }
        cache
    }

    /// Number of distinct identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LinkCache for ImmutableLinkCache {
    fn resolve(&self, key: &FormKey, kind: RecordKind) -> Resolution<&MajorRecord> {
        self.records
            .get(key)
            .filter(|record| record.kind() == kind)
            .into()
    }
}

impl WinningOverrides for ImmutableLinkCache {
    fn winning_overrides(&self, kind: RecordKind) -> Box<dyn Iterator<Item = &MajorRecord> + '_> {
        let keys = self.order.get(&kind).map(Vec::as_slice).unwrap_or_default();
        Box::new(keys.iter().filter_map(|key| self.records.get(key)))
    }
}
