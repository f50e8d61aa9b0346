//! Consistency checks for an arena's partition of transmitters.
//!
//! Hosts and tests call [`check_partition`] after a batch of topology
//! changes to confirm that every transmitter sits in exactly one network and
//! that the ownership table agrees with the networks' membership sets.

use std::collections::BTreeMap;

use oxygrid_core::id::{NetworkId, NodeId};
use oxygrid_core::world::World;

use crate::arena::NetworkArena;

// ---------------------------------------------------------------------------
// Violation types
// ---------------------------------------------------------------------------

/// One broken partition rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionViolation {
    /// A transmitter is listed by more than one network.
    #[error("node {node:?} is listed by networks {networks:?}")]
    Duplicated {
        node: NodeId,
        networks: Vec<NetworkId>,
    },
    /// The ownership table disagrees with the network that lists the node.
    #[error("node {node:?} is listed by {listed:?} but owned by {owner:?}")]
    OwnerMismatch {
        node: NodeId,
        listed: Option<NetworkId>,
        owner: Option<NetworkId>,
    },
    /// A valid transmitter belongs to no network.
    #[error("transmitter {0:?} belongs to no network")]
    Orphan(NodeId),
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// Check the arena's partition. `candidates` are nodes that must be owned
/// when they are valid transmitters of the arena's type (usually every
/// transmitter the host has placed).
pub fn check_partition<W: World + ?Sized>(
    arena: &NetworkArena,
    world: &W,
    candidates: impl IntoIterator<Item = NodeId>,
) -> Vec<PartitionViolation> {
    let mut violations = Vec::new();

    let mut listed: BTreeMap<NodeId, Vec<NetworkId>> = BTreeMap::new();
    for network in arena.networks() {
        for &node in network.transmitters() {
            listed.entry(node).or_default().push(network.id);
        }
    }

    for (&node, networks) in &listed {
        if networks.len() > 1 {
            violations.push(PartitionViolation::Duplicated {
                node,
                networks: networks.clone(),
            });
            continue;
        }
        let owner = arena.network_of(node);
        if owner != networks.first().copied() {
            violations.push(PartitionViolation::OwnerMismatch {
                node,
                listed: networks.first().copied(),
                owner,
            });
        }
    }

    for (node, owner) in arena.owners() {
        if !listed.contains_key(&node) {
            violations.push(PartitionViolation::OwnerMismatch {
                node,
                listed: None,
                owner: Some(owner),
            });
        }
    }

    let network_type = arena.config().network_type;
    for node in candidates {
        if world.is_transmitter(node, network_type) && !listed.contains_key(&node) {
            violations.push(PartitionViolation::Orphan(node));
        }
    }

    violations
}
