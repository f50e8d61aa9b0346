//! A single transmitter network: its pipes, the acceptors they feed, and the
//! per-step distribution of supply across those acceptors.
//!
//! # Distribution
//!
//! The demand denominator is the *average* of eligible per-direction
//! requests, not their sum. Shares are `supply * request / average`, so with
//! several requesters the total handed out can exceed the supply and the
//! returned remainder can go negative. Hosts depend on this allocation
//! formula, so it is kept as is.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use oxygrid_core::direction::Direction;
use oxygrid_core::fixed::{Fixed64, checked_div_64};
use oxygrid_core::id::{NetworkId, NodeId};
use oxygrid_core::world::{Capability, NetworkType, NodeKind, World};
use serde::{Deserialize, Serialize};

/// A connected group of transmitters and the acceptors they reach.
///
/// `acceptors` is a cache derived from `transmitters` and the world's current
/// adjacency. Only [`OxygenNetwork::refresh`] writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OxygenNetwork {
    /// Network identifier.
    pub id: NetworkId,
    /// Resource this network carries.
    pub network_type: NetworkType,
    transmitters: BTreeSet<NodeId>,
    acceptors: BTreeMap<NodeId, Vec<Direction>>,
}

impl OxygenNetwork {
    /// Create an empty network.
    pub fn new(id: NetworkId, network_type: NetworkType) -> Self {
        Self {
            id,
            network_type,
            transmitters: BTreeSet::new(),
            acceptors: BTreeMap::new(),
        }
    }

    pub fn transmitters(&self) -> &BTreeSet<NodeId> {
        &self.transmitters
    }

    pub fn acceptors(&self) -> &BTreeMap<NodeId, Vec<Direction>> {
        &self.acceptors
    }

    /// Directions (from a transmitter toward `acceptor`) through which the
    /// acceptor was discovered, or `None` if this network does not feed it.
    pub fn acceptor_directions(&self, acceptor: NodeId) -> Option<&[Direction]> {
        self.acceptors.get(&acceptor).map(Vec::as_slice)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.transmitters.contains(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.transmitters.is_empty()
    }

    /// Add a transmitter. Does not touch the acceptor cache.
    pub fn add_transmitter(&mut self, node: NodeId) -> bool {
        self.transmitters.insert(node)
    }

    /// Remove a transmitter. Does not touch the acceptor cache.
    pub fn remove_transmitter(&mut self, node: NodeId) -> bool {
        self.transmitters.remove(&node)
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Rebuild the acceptor cache from the current transmitters.
    ///
    /// Transmitters that are no longer valid (or no longer carry this
    /// network's resource) are pruned first and returned. A failed adjacency
    /// lookup is logged and skipped; the rest of the rebuild still runs.
    pub fn refresh<W: World + ?Sized>(&mut self, world: &W) -> Vec<NodeId> {
        self.acceptors.clear();

        let stale: Vec<NodeId> = self
            .transmitters
            .iter()
            .copied()
            .filter(|&node| !world.is_transmitter(node, self.network_type))
            .collect();
        for node in &stale {
            self.transmitters.remove(node);
        }

        for &transmitter in &self.transmitters {
            let connections = match world.adjacent_connections(transmitter) {
                Ok(connections) => connections,
                Err(err) => {
                    tracing::warn!(network = %self.id, %err, "failed to refresh transmitter");
                    continue;
                }
            };

            for (dir, neighbor) in Direction::ALL.into_iter().zip(connections) {
                let Some(acceptor) = neighbor else {
                    continue;
                };
                if world.is_valid(acceptor)
                    && world.node_kind(acceptor) == Some(NodeKind::Acceptor)
                    && world.can_connect(acceptor, dir.opposite(), self.network_type)
                {
                    self.acceptors.entry(acceptor).or_default().push(dir);
                }
            }
        }

        stale
    }

    // -----------------------------------------------------------------------
    // Distribution
    // -----------------------------------------------------------------------

    /// Directions of `acceptor` that accept this network's resource and face
    /// one of this network's transmitters.
    fn fed_directions<W: World + ?Sized>(&self, world: &W, acceptor: NodeId) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| {
                world.can_connect(acceptor, dir, self.network_type)
                    && world
                        .neighbor(acceptor, dir)
                        .is_some_and(|node| self.transmitters.contains(&node))
            })
            .collect()
    }

    /// Average per-direction request of the demand acceptors this network
    /// genuinely feeds, skipping `exclude`. Zero when nothing qualifies.
    pub fn request<W: World + ?Sized>(&self, world: &W, exclude: &[NodeId]) -> Fixed64 {
        let mut total = Fixed64::ZERO;
        let mut count: u32 = 0;

        for &acceptor in self.acceptors.keys() {
            if exclude.contains(&acceptor)
                || !world.is_valid(acceptor)
                || world.capability(acceptor) != Capability::Demand
            {
                continue;
            }
            for dir in self.fed_directions(world, acceptor) {
                total = total.saturating_add(world.requested_amount(acceptor, dir));
                count += 1;
            }
        }

        if count == 0 {
            return Fixed64::ZERO;
        }
        checked_div_64(total, Fixed64::from_num(count)).unwrap_or(Fixed64::ZERO)
    }

    /// Hand out `total_supply` across the fed acceptors, skipping `exclude`.
    /// Returns what is left after subtracting every absorbed amount.
    ///
    /// Demand acceptors get `total_supply * request / average_request` per
    /// fed direction. Fixed-share acceptors, when `fixed_share` is set, get
    /// `floor(total_supply / acceptor_count)` per fed direction.
    pub fn produce<W: World + ?Sized>(
        &self,
        world: &mut W,
        total_supply: Fixed64,
        exclude: &[NodeId],
        fixed_share: bool,
    ) -> Fixed64 {
        let mut remaining = total_supply;

        if self.acceptors.is_empty() {
            return remaining;
        }

        let total_request = self.request(&*world, exclude);
        if total_request <= Fixed64::ZERO {
            return remaining;
        }

        let even_split = checked_div_64(total_supply, Fixed64::from_num(self.acceptors.len()))
            .unwrap_or(Fixed64::ZERO)
            .floor();

        for &acceptor in self.acceptors.keys() {
            if exclude.contains(&acceptor) || !world.is_valid(acceptor) {
                continue;
            }

            match world.capability(acceptor) {
                Capability::Demand => {
                    for dir in self.fed_directions(&*world, acceptor) {
                        let ratio =
                            checked_div_64(world.requested_amount(acceptor, dir), total_request)
                                .unwrap_or(Fixed64::ZERO);
                        let share = total_supply.saturating_mul(ratio);
                        if share > Fixed64::ZERO {
                            let absorbed = world.deliver(acceptor, dir, share, false);
                            remaining = remaining.saturating_sub(absorbed);
                        }
                    }
                }
                Capability::FixedShare if fixed_share => {
                    for dir in self.fed_directions(&*world, acceptor) {
                        if even_split > Fixed64::ZERO {
                            let absorbed = world.deliver(acceptor, dir, even_split, false);
                            remaining = remaining.saturating_sub(absorbed);
                        }
                    }
                }
                Capability::FixedShare | Capability::Unsupported => {}
            }
        }

        remaining
    }
}

impl fmt::Display for OxygenNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OxygenNetwork[{}|Pipes:{}|Acceptors:{}]",
            self.id,
            self.transmitters.len(),
            self.acceptors.len()
        )
    }
}
