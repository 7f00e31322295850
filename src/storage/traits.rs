//! Abstract record-access traits.
//!
//! These traits are the contract between the patcher and whatever host owns
//! the load order. The patcher only ever reads through them:
//! - [`LinkCache`] resolves a link to the winning version of its target
//! - [`WinningOverrides`] enumerates the winning version of every record of a kind
//!
//! Writing happens exclusively through the output [`Plugin`](super::Plugin).

use thiserror::Error;

use crate::record::{FormKey, FormLink, MajorRecord, ModKey, Record, RecordKind};

/// Errors raised by plugin mutation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Another record in the same plugin already uses this editor id.
    #[error("Editor ID '{editor_id}' is already used by {existing} in {mod_key}")]
    DuplicateEditorId {
        /// The requested editor id.
        editor_id: String,
        /// The record already using it.
        existing: FormKey,
        /// The plugin being edited.
        mod_key: ModKey,
    },

    /// The plugin ran out of 24-bit local ids.
    #[error("Plugin {mod_key} has no form ids left")]
    FormIdsExhausted {
        /// The full plugin.
        mod_key: ModKey,
    },

    /// A record expected in the plugin is not there.
    #[error("Record not found: {0}")]
    RecordNotFound(FormKey),
}

/// Outcome of resolving a link.
///
/// Dangling and null links are not errors; they resolve to [`Resolution::Unresolved`]
/// and callers treat them as non-matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The link points at a record of the requested type.
    Resolved(T),
    /// Null, dangling, or of another type.
    Unresolved,
}

impl<T> Resolution<T> {
    /// Converts into an `Option`.
    #[must_use]
    pub fn resolved(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved => None,
        }
    }

    /// Returns true when the link resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Maps the resolved value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Resolved(value) => Resolution::Resolved(f(value)),
            Self::Unresolved => Resolution::Unresolved,
        }
    }

    /// Chains another fallible resolution step.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Resolution<U>) -> Resolution<U> {
        match self {
            Self::Resolved(value) => f(value),
            Self::Unresolved => Resolution::Unresolved,
        }
    }
}

impl<T> From<Option<T>> for Resolution<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unresolved, Self::Resolved)
    }
}

/// Resolves identities to the winning record across the load order.
pub trait LinkCache: Send + Sync {
    /// Resolves `key` to a record of `kind`. A record of another kind under the
    /// same key does not count.
    fn resolve(&self, key: &FormKey, kind: RecordKind) -> Resolution<&MajorRecord>;
}

/// Typed resolution on top of [`LinkCache`].
pub trait LinkCacheExt: LinkCache {
    /// Resolves a typed link.
    fn resolve_link<T: Record>(&self, link: &FormLink<T>) -> Resolution<&T> {
        self.resolve_key::<T>(link.form_key())
    }

    /// Resolves an untyped key as a `T`.
    fn resolve_key<T: Record>(&self, key: &FormKey) -> Resolution<&T> {
        if key.is_null() {
            return Resolution::Unresolved;
        }
        self.resolve(key, T::KIND)
            .and_then(|record| T::from_major(record).into())
    }
}

impl<C: LinkCache + ?Sized> LinkCacheExt for C {}

/// Enumerates winning overrides.
pub trait WinningOverrides: Send + Sync {
    /// Yields the winning version of every record of `kind`, exactly once per
    /// identity, highest-priority plugin first.
    fn winning_overrides(&self, kind: RecordKind) -> Box<dyn Iterator<Item = &MajorRecord> + '_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_link_cache_object_safe(_: &dyn LinkCache) {}
    fn _assert_winning_overrides_object_safe(_: &dyn WinningOverrides) {}

    #[test]
    fn test_resolution_combinators() {
        let hit: Resolution<u32> = Some(3).into();
        assert!(hit.is_resolved());
        assert_eq!(hit.map(|v| v * 2), Resolution::Resolved(6));
        assert_eq!(
            hit.and_then(|_| Resolution::<u32>::Unresolved),
            Resolution::Unresolved
        );

        let miss: Resolution<u32> = None.into();
        assert!(!miss.is_resolved());
        assert_eq!(miss.resolved(), None);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::RecordNotFound("000800:Patch.esp".parse().unwrap());
        assert!(err.to_string().contains("000800:Patch.esp"));

        let err = StorageError::FormIdsExhausted {
            mod_key: "Patch.esp".parse().unwrap(),
        };
        assert!(err.to_string().contains("no form ids left"));
    }
}
