//! Runtime configuration injected into a [`NetworkArena`](crate::NetworkArena).

use oxygrid_core::world::NetworkType;
use serde::{Deserialize, Serialize};

/// Settings fixed at arena construction and read once per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Resource carried by networks created in the arena.
    pub network_type: NetworkType,
    /// Feed [`Capability::FixedShare`](oxygrid_core::world::Capability)
    /// acceptors an equal split of the supply. Off unless the companion
    /// subsystem providing such acceptors is present.
    pub fixed_share_fallback: bool,
    /// Maximum positions a single connectivity search may close before
    /// giving up. `None` is unbounded.
    pub search_limit: Option<usize>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_type: NetworkType::Oxygen,
            fixed_share_fallback: false,
            search_limit: None,
        }
    }
}
