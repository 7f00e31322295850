//! Host-facing entry point: check, snapshot, run.

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::engine::{MirrorEngine, PatchOutput};
use crate::error::PatchResult;
use crate::record::ModKey;
use crate::runnability::RunnabilityCheck;
use crate::storage::{ImmutableLinkCache, LoadOrder, Plugin};

/// Patches `load_order` into a fresh plugin named `patch_mod_key`.
///
/// When `runnability` is given the companion script must be installed or the
/// engine never starts. A stale copy of the patch itself in the load order is
/// ignored, so re-running against last run's output converges.
///
/// # Errors
/// Runnability failures and any synthesis failure of the run.
pub fn run_patch(
    load_order: &LoadOrder,
    patch_mod_key: ModKey,
    settings: &Settings,
    runnability: Option<&RunnabilityCheck>,
) -> PatchResult<PatchOutput> {
    if let Some(check) = runnability {
        check.verify()?;
    }

    let cache = ImmutableLinkCache::from_plugins(
        load_order
            .priority_order()
            .filter(|plugin| plugin.mod_key() != &patch_mod_key),
    );
    info!(records = cache.len(), patch = %patch_mod_key, "starting patch run");

    MirrorEngine::from_link_cache(Arc::new(cache), Plugin::new(patch_mod_key), settings).run()
}
