//! NPC records. Only identity and name matter here; summons point at them.

use serde::{Deserialize, Serialize};

use super::key::FormKey;

/// An actor definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Identity.
    pub form_key: FormKey,

    /// Editor id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
