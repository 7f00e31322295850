//! Record identity: plugin keys, form keys and typed links.
//!
//! A [`FormKey`] is the stable identity of a record across the whole load
//! order. It never changes when a record is overridden by a later plugin, which
//! is what makes it usable as the key of every per-run cache.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest local form id a plugin can allocate.
pub const MAX_FORM_ID: u32 = 0x00FF_FFFF;

/// Errors raised while parsing plugin or form keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// The file name does not end in a plugin extension.
    #[error("Plugin name '{0}' has no recognised extension (.esm, .esp, .esl)")]
    UnknownExtension(String),

    /// Nothing before the extension.
    #[error("Plugin name cannot be empty")]
    EmptyName,

    /// Not of the `<hex id>:<plugin>` shape.
    #[error("Form key '{0}' must look like 000800:Plugin.esp")]
    MalformedFormKey(String),

    /// The id does not fit in 24 bits.
    #[error("Form id {0:#X} exceeds the 24-bit local id range")]
    FormIdOutOfRange(u32),
}

/// Kind of data package a plugin is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModType {
    /// `.esm`
    Master,
    /// `.esp`
    Plugin,
    /// `.esl`
    Light,
}

impl ModType {
    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Master => "esm",
            Self::Plugin => "esp",
            Self::Light => "esl",
        }
    }
}

/// Identity of a data package in the load order, e.g. `Skyrim.esm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModKey {
    name: Arc<str>,
    mod_type: ModType,
}

impl ModKey {
    /// Creates a key from a bare name and a type.
    #[must_use]
    pub fn new(name: &str, mod_type: ModType) -> Self {
        Self {
            name: Arc::from(name),
            mod_type,
        }
    }

    /// Parses a file name such as `Patch.esp`.
    ///
    /// # Errors
    /// Returns [`KeyParseError`] when the name is empty or has no plugin extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, KeyParseError> {
        let (stem, ext) = file_name
            .rsplit_once('.')
            .ok_or_else(|| KeyParseError::UnknownExtension(file_name.to_string()))?;
        let mod_type = match ext.to_ascii_lowercase().as_str() {
            "esm" => ModType::Master,
            "esp" => ModType::Plugin,
            "esl" => ModType::Light,
            _ => return Err(KeyParseError::UnknownExtension(file_name.to_string())),
        };
        if stem.trim().is_empty() {
            return Err(KeyParseError::EmptyName);
        }
        Ok(Self::new(stem, mod_type))
    }

    /// The placeholder key used by null links.
    #[must_use]
    pub fn null() -> Self {
        Self::new("", ModType::Plugin)
    }

    /// Returns true for the placeholder key.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    /// Bare name without extension.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugin type.
    #[must_use]
    pub const fn mod_type(&self) -> ModType {
        self.mod_type
    }

    /// Name with extension, as it appears in the data folder.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.mod_type.extension())
    }
}

impl fmt::Display for ModKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Null");
        }
        write!(f, "{}.{}", self.name, self.mod_type.extension())
    }
}

impl FromStr for ModKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_file_name(s)
    }
}

/// Globally stable identity of a record: the plugin that first defined it
/// plus a 24-bit local id.
///
/// # Examples
///
/// ```
/// use conjure_next_to_caster::FormKey;
///
/// let key: FormKey = "000D64:Skyrim.esm".parse().unwrap();
/// assert_eq!(key.id(), 0xD64);
/// assert_eq!(key.to_string(), "000D64:Skyrim.esm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormKey {
    mod_key: ModKey,
    id: u32,
}

impl FormKey {
    /// Creates a form key.
    ///
    /// # Errors
    /// Returns [`KeyParseError::FormIdOutOfRange`] when `id` does not fit in 24 bits.
    pub fn new(mod_key: ModKey, id: u32) -> Result<Self, KeyParseError> {
        if id > MAX_FORM_ID {
            return Err(KeyParseError::FormIdOutOfRange(id));
        }
        Ok(Self { mod_key, id })
    }

    /// The null form key. Links holding it never resolve.
    #[must_use]
    pub fn null() -> Self {
        Self {
            mod_key: ModKey::null(),
            id: 0,
        }
    }

    /// Returns true for the null key.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.mod_key.is_null() && self.id == 0
    }

    /// Plugin that owns this identity.
    #[must_use]
    pub const fn mod_key(&self) -> &ModKey {
        &self.mod_key
    }

    /// Local 24-bit id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl Default for FormKey {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for FormKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Null");
        }
        write!(f, "{:06X}:{}", self.id, self.mod_key)
    }
}

impl FromStr for FormKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, plugin) = s
            .split_once(':')
            .ok_or_else(|| KeyParseError::MalformedFormKey(s.to_string()))?;
        let id = u32::from_str_radix(id, 16)
            .map_err(|_| KeyParseError::MalformedFormKey(s.to_string()))?;
        Self::new(plugin.parse()?, id)
    }
}

/// A link to a record of type `T`, held by identity and resolved through a
/// [`LinkCache`](crate::storage::LinkCache).
///
/// The type parameter only fixes which record kind the link expects; a link
/// whose key resolves to a different kind is treated as unresolved.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct FormLink<T> {
    form_key: FormKey,
    #[serde(skip)]
    _kind: PhantomData<fn() -> T>,
}

impl<T> FormLink<T> {
    /// Links to `form_key`.
    #[must_use]
    pub fn new(form_key: FormKey) -> Self {
        Self {
            form_key,
            _kind: PhantomData,
        }
    }

    /// A link that points nowhere.
    #[must_use]
    pub fn null() -> Self {
        Self::new(FormKey::null())
    }

    /// Returns true when the link holds the null key.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.form_key.is_null()
    }

    /// Target identity.
    #[must_use]
    pub const fn form_key(&self) -> &FormKey {
        &self.form_key
    }

    /// Points the link at another record.
    pub fn set_to(&mut self, form_key: FormKey) {
        self.form_key = form_key;
    }
}

impl<T> Clone for FormLink<T> {
    fn clone(&self) -> Self {
        Self::new(self.form_key.clone())
    }
}

impl<T> PartialEq for FormLink<T> {
    fn eq(&self, other: &Self) -> bool {
        self.form_key == other.form_key
    }
}

impl<T> Eq for FormLink<T> {}

impl<T> PartialOrd for FormLink<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for FormLink<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.form_key.cmp(&other.form_key)
    }
}

impl<T> Hash for FormLink<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.form_key.hash(state);
    }
}

impl<T> Default for FormLink<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> fmt::Debug for FormLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FormLink").field(&self.form_key).finish()
    }
}

impl<T> fmt::Display for FormLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.form_key.fmt(f)
    }
}

impl<T> From<FormKey> for FormLink<T> {
    fn from(form_key: FormKey) -> Self {
        Self::new(form_key)
    }
}
