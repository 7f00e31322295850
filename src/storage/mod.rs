//! Record storage for the patcher.
//!
//! The traits define what the patcher reads from the host; the in-memory
//! module provides plugins, load orders and a link cache over them.

mod memory;
mod traits;

pub use memory::{
    Group, Grouped, ImmutableLinkCache, LoadOrder, ModListing, Plugin, FIRST_FORM_ID,
};
pub use traits::{LinkCache, LinkCacheExt, Resolution, StorageError, WinningOverrides};
