use oxygrid_core::id::NetworkId;

/// Topology changes recorded by a [`NetworkArena`](crate::NetworkArena).
///
/// Buffered until the host calls
/// [`drain_events`](crate::NetworkArena::drain_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A network was added to the arena.
    Created { network: NetworkId },
    /// Two networks were joined into a new one.
    Merged {
        sources: [NetworkId; 2],
        into: NetworkId,
    },
    /// Removing a transmitter broke `source` into itself plus `created`.
    Split {
        source: NetworkId,
        created: Vec<NetworkId>,
    },
    /// A network lost its last transmitter and was dropped.
    Retired { network: NetworkId },
}
