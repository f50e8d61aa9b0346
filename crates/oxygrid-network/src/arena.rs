//! The arena that owns every network and the node -> network ownership table.
//!
//! # Ownership
//!
//! A transmitter is listed by a network's transmitter set exactly when the
//! ownership table maps it to that network. Whenever a network claims a node
//! (on refresh), the node is taken out of its previous owner, and that owner
//! is rebuilt in turn. A network left without transmitters is retired.
//!
//! # Splitting
//!
//! When a transmitter is removed, its transmitter neighbors (the frontier)
//! are grouped by connectivity, walking the frontier in direction order and
//! comparing each member against the first member of every group found so
//! far. The group holding the first frontier member stays in the original
//! network; every other group becomes a new network built from an exhaustive
//! search. A node is claimed by at most one new network.

use std::collections::{BTreeMap, BTreeSet};

use oxygrid_core::direction::{BlockPos, Direction};
use oxygrid_core::fixed::Fixed64;
use oxygrid_core::id::{NetworkId, NodeId};
use oxygrid_core::world::{NetworkType, NodeKind, World};
use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::event::NetworkEvent;
use crate::network::OxygenNetwork;
use crate::pathfinder::Pathfinder;
use crate::NetworkError;

/// Owns all networks of one resource type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkArena {
    /// All networks, keyed by network ID.
    networks: BTreeMap<NetworkId, OxygenNetwork>,
    /// Which network each claimed transmitter belongs to.
    owners: BTreeMap<NodeId, NetworkId>,
    /// Next network ID to assign.
    next_network_id: u32,
    config: NetworkConfig,
    #[serde(skip)]
    events: Vec<NetworkEvent>,
}

impl NetworkArena {
    /// Create an empty arena with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty arena with an injected configuration.
    pub fn with_config(config: NetworkConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Get a network by ID.
    pub fn network(&self, id: NetworkId) -> Option<&OxygenNetwork> {
        self.networks.get(&id)
    }

    /// All live networks, in ID order.
    pub fn networks(&self) -> impl Iterator<Item = &OxygenNetwork> {
        self.networks.values()
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// The network that owns `node`, if any.
    pub fn network_of(&self, node: NodeId) -> Option<NetworkId> {
        self.owners.get(&node).copied()
    }

    /// Every `(node, network)` entry of the ownership table, in node order.
    pub fn owners(&self) -> impl Iterator<Item = (NodeId, NetworkId)> + '_ {
        self.owners.iter().map(|(&node, &id)| (node, id))
    }

    /// Transmitters of a network.
    pub fn transmitters(&self, id: NetworkId) -> Option<&BTreeSet<NodeId>> {
        self.networks.get(&id).map(OxygenNetwork::transmitters)
    }

    /// Directions through which network `id` reaches `acceptor`.
    pub fn acceptor_directions(&self, id: NetworkId, acceptor: NodeId) -> Option<&[Direction]> {
        self.networks.get(&id)?.acceptor_directions(acceptor)
    }

    /// Take every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a new empty network and return its ID.
    pub fn create_network(&mut self) -> NetworkId {
        let id = NetworkId(self.next_network_id);
        self.next_network_id += 1;
        self.networks
            .insert(id, OxygenNetwork::new(id, self.config.network_type));
        self.events.push(NetworkEvent::Created { network: id });
        id
    }

    /// Create a network holding `nodes` and refresh it.
    ///
    /// The returned network may already be retired if none of `nodes` is a
    /// valid transmitter.
    pub fn create_network_with<W: World + ?Sized>(
        &mut self,
        nodes: impl IntoIterator<Item = NodeId>,
        world: &W,
    ) -> NetworkId {
        let id = self.create_network();
        if let Some(network) = self.networks.get_mut(&id) {
            for node in nodes {
                network.add_transmitter(node);
            }
        }
        self.rebuild_cascade(id, world);
        id
    }

    /// Drop networks that have no transmitters or own none of them.
    /// Returns how many were retired.
    pub fn collect_garbage(&mut self) -> usize {
        let dead: Vec<NetworkId> = self
            .networks
            .values()
            .filter(|network| {
                !network
                    .transmitters()
                    .iter()
                    .any(|node| self.owners.get(node) == Some(&network.id))
            })
            .map(|network| network.id)
            .collect();
        for id in &dead {
            self.retire(*id);
        }
        dead.len()
    }

    fn retire(&mut self, id: NetworkId) {
        if let Some(network) = self.networks.remove(&id) {
            for node in network.transmitters() {
                if self.owners.get(node) == Some(&id) {
                    self.owners.remove(node);
                }
            }
            tracing::debug!(network = %id, "retired network");
            self.events.push(NetworkEvent::Retired { network: id });
        }
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Rebuild a network's acceptor cache and claim its transmitters.
    ///
    /// Networks that lose nodes to the claim are rebuilt too. A network left
    /// empty is retired.
    pub fn refresh<W: World + ?Sized>(&mut self, id: NetworkId, world: &W) -> Result<(), NetworkError> {
        if !self.networks.contains_key(&id) {
            return Err(NetworkError::UnknownNetwork(id));
        }
        self.rebuild_cascade(id, world);
        Ok(())
    }

    /// Refresh every network with a transmitter at or next to `pos`. Call
    /// after an acceptor is placed, removed or reconfigured there.
    pub fn refresh_around<W: World + ?Sized>(&mut self, pos: BlockPos, world: &W) {
        let ids: BTreeSet<NetworkId> = std::iter::once(pos)
            .chain(pos.neighbors().map(|(_, p)| p))
            .filter_map(|p| world.node_at(p))
            .filter_map(|node| self.network_of(node))
            .collect();
        for id in ids {
            if self.networks.contains_key(&id) {
                self.rebuild_cascade(id, world);
            }
        }
    }

    fn rebuild_cascade<W: World + ?Sized>(&mut self, id: NetworkId, world: &W) {
        let mut pending = vec![id];
        let mut done = BTreeSet::new();
        while let Some(next) = pending.pop() {
            if done.insert(next) {
                pending.extend(self.rebuild(next, world));
            }
        }
    }

    /// Refresh one network, claim its members, and report which other
    /// networks lost nodes to it.
    fn rebuild<W: World + ?Sized>(&mut self, id: NetworkId, world: &W) -> BTreeSet<NetworkId> {
        let Some(network) = self.networks.get_mut(&id) else {
            return BTreeSet::new();
        };
        let stale = network.refresh(world);
        let members: Vec<NodeId> = network.transmitters().iter().copied().collect();

        for node in stale {
            if self.owners.get(&node) == Some(&id) {
                self.owners.remove(&node);
            }
        }

        let disturbed = self.adopt(id, &members);
        if members.is_empty() {
            self.retire(id);
        }
        disturbed
    }

    fn adopt(&mut self, id: NetworkId, nodes: &[NodeId]) -> BTreeSet<NetworkId> {
        let mut disturbed = BTreeSet::new();
        for &node in nodes {
            match self.owners.insert(node, id) {
                Some(previous) if previous != id => {
                    if let Some(other) = self.networks.get_mut(&previous) {
                        other.remove_transmitter(node);
                        disturbed.insert(previous);
                    }
                }
                _ => {}
            }
        }
        disturbed
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    /// Join two networks into a new one holding the union of their
    /// transmitters.
    ///
    /// Returns `id` unchanged when `other` is `None` or equal to `id`.
    /// Otherwise both inputs are retired once the new network has claimed
    /// their nodes.
    pub fn merge<W: World + ?Sized>(
        &mut self,
        id: NetworkId,
        other: Option<NetworkId>,
        world: &W,
    ) -> Result<NetworkId, NetworkError> {
        let this = self.networks.get(&id).ok_or(NetworkError::UnknownNetwork(id))?;
        let Some(other) = other.filter(|&o| o != id) else {
            return Ok(id);
        };
        let that = self
            .networks
            .get(&other)
            .ok_or(NetworkError::UnknownNetwork(other))?;

        let union: BTreeSet<NodeId> = this
            .transmitters()
            .union(that.transmitters())
            .copied()
            .collect();

        let merged = self.create_network_with(union, world);
        // Anything still listed by the inputs was stale.
        self.retire(id);
        self.retire(other);

        tracing::debug!(from = %id, with = %other, into = %merged, "merged networks");
        self.events.push(NetworkEvent::Merged {
            sources: [id, other],
            into: merged,
        });
        Ok(merged)
    }

    // -----------------------------------------------------------------------
    // Split
    // -----------------------------------------------------------------------

    /// Take `removed` out of network `id` and break off every part of the
    /// network that no longer connects back to the rest.
    ///
    /// Must be called while `removed` is still known to the world. A node
    /// that is not one of this network's transmitters is a no-op. Returns
    /// the networks created for the detached fragments.
    pub fn split<W: World + ?Sized>(
        &mut self,
        id: NetworkId,
        removed: NodeId,
        world: &W,
    ) -> Result<Vec<NetworkId>, NetworkError> {
        let network = self
            .networks
            .get_mut(&id)
            .ok_or(NetworkError::UnknownNetwork(id))?;
        let network_type = network.network_type;
        if world.node_kind(removed) != Some(NodeKind::Transmitter(network_type))
            || !network.contains(removed)
        {
            return Ok(Vec::new());
        }

        network.remove_transmitter(removed);
        if self.owners.get(&removed) == Some(&id) {
            self.owners.remove(&removed);
        }

        let frontier = self.frontier(removed, network_type, world);
        let finder = Pathfinder::new(network_type)
            .excluding(removed)
            .with_limit(self.config.search_limit);

        // One representative per group of frontier nodes that still connect.
        let mut groups: Vec<NodeId> = Vec::new();
        if frontier.len() > 1 {
            for &node in &frontier {
                if !groups.iter().any(|&rep| finder.connected(world, rep, node)) {
                    groups.push(node);
                }
            }
        }

        let mut created = Vec::new();
        let mut claimed: BTreeSet<NodeId> = BTreeSet::new();
        for &rep in groups.iter().skip(1) {
            let fragment: BTreeSet<NodeId> = finder
                .discover(world, rep)
                .into_iter()
                .filter(|&node| claimed.insert(node))
                .collect();
            if fragment.is_empty() {
                continue;
            }
            created.push(self.create_network_with(fragment, world));
        }

        if self.networks.contains_key(&id) {
            self.rebuild_cascade(id, world);
        }
        created.retain(|c| self.networks.contains_key(c));

        tracing::debug!(
            network = %id,
            frontier = frontier.len(),
            fragments = created.len(),
            "split network"
        );
        if !created.is_empty() {
            self.events.push(NetworkEvent::Split {
                source: id,
                created: created.clone(),
            });
        }
        Ok(created)
    }

    /// Transmitter neighbors of `removed`, in direction order, deduplicated.
    fn frontier<W: World + ?Sized>(
        &self,
        removed: NodeId,
        network_type: NetworkType,
        world: &W,
    ) -> Vec<NodeId> {
        let connections = match world.adjacent_connections(removed) {
            Ok(connections) => connections,
            Err(err) => {
                tracing::warn!(%err, "could not read neighbors of removed transmitter");
                return Vec::new();
            }
        };

        let mut frontier = Vec::new();
        for node in connections.into_iter().flatten() {
            if node != removed && world.is_transmitter(node, network_type) && !frontier.contains(&node) {
                frontier.push(node);
            }
        }
        frontier
    }

    // -----------------------------------------------------------------------
    // Placement helpers
    // -----------------------------------------------------------------------

    /// Register a freshly placed transmitter: give it a network and merge
    /// that network with every adjacent transmitter's network.
    pub fn attach_transmitter<W: World + ?Sized>(
        &mut self,
        node: NodeId,
        world: &W,
    ) -> Result<NetworkId, NetworkError> {
        let network_type = self.config.network_type;
        if !world.is_transmitter(node, network_type) {
            return Err(NetworkError::NotTransmitter(node));
        }
        let connections = world.adjacent_connections(node)?;

        let mut current = match self.network_of(node) {
            Some(id) => id,
            None => self.create_network_with([node], world),
        };

        for neighbor in connections.into_iter().flatten() {
            if !world.is_transmitter(neighbor, network_type) {
                continue;
            }
            match self.network_of(neighbor) {
                Some(other) if other != current => {
                    current = self.merge(current, Some(other), world)?;
                }
                Some(_) => {}
                None => {
                    current = self.absorb_component(current, neighbor, world)?;
                }
            }
        }

        self.refresh(current, world)?;
        Ok(current)
    }

    /// Pull the component around the unowned transmitter `seed` into network
    /// `id`. Unowned members join directly; networks owning other members
    /// are merged in.
    fn absorb_component<W: World + ?Sized>(
        &mut self,
        id: NetworkId,
        seed: NodeId,
        world: &W,
    ) -> Result<NetworkId, NetworkError> {
        let component = Pathfinder::new(self.config.network_type)
            .with_limit(self.config.search_limit)
            .discover(world, seed);

        let mut foreign = BTreeSet::new();
        if let Some(network) = self.networks.get_mut(&id) {
            for &node in &component {
                match self.owners.get(&node).copied() {
                    None => {
                        network.add_transmitter(node);
                        self.owners.insert(node, id);
                    }
                    Some(other) if other != id => {
                        foreign.insert(other);
                    }
                    Some(_) => {}
                }
            }
        }

        let mut current = id;
        for other in foreign {
            if self.networks.contains_key(&other) {
                current = self.merge(current, Some(other), world)?;
            }
        }
        Ok(current)
    }

    /// Unregister a transmitter that is about to leave the world, splitting
    /// its network as needed. Unowned nodes are a no-op.
    pub fn detach_transmitter<W: World + ?Sized>(
        &mut self,
        node: NodeId,
        world: &W,
    ) -> Result<Vec<NetworkId>, NetworkError> {
        match self.network_of(node) {
            Some(id) => self.split(id, node, world),
            None => Ok(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Distribution
    // -----------------------------------------------------------------------

    /// Average demand of network `id`, skipping `exclude`.
    pub fn request<W: World + ?Sized>(
        &self,
        id: NetworkId,
        exclude: &[NodeId],
        world: &W,
    ) -> Result<Fixed64, NetworkError> {
        let network = self.networks.get(&id).ok_or(NetworkError::UnknownNetwork(id))?;
        Ok(network.request(world, exclude))
    }

    /// Distribute `total_supply` over network `id` and return the remainder.
    pub fn produce<W: World + ?Sized>(
        &self,
        id: NetworkId,
        total_supply: Fixed64,
        exclude: &[NodeId],
        world: &mut W,
    ) -> Result<Fixed64, NetworkError> {
        let network = self.networks.get(&id).ok_or(NetworkError::UnknownNetwork(id))?;
        Ok(network.produce(world, total_supply, exclude, self.config.fixed_share_fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxygrid_core::grid::GridWorld;
    use oxygrid_core::test_utils::*;

    use crate::validation::check_partition;

    fn attach_all(arena: &mut NetworkArena, world: &GridWorld, nodes: &[NodeId]) -> NetworkId {
        let mut last = None;
        for &node in nodes {
            last = Some(arena.attach_transmitter(node, world).unwrap());
        }
        last.unwrap()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn network_ids_are_unique() {
        let mut arena = NetworkArena::new();
        let a = arena.create_network();
        let b = arena.create_network();
        assert_ne!(a, b);
        assert_eq!(arena.network_count(), 2);
    }

    #[test]
    fn refresh_unknown_network_is_an_error() {
        let world = GridWorld::new();
        let mut arena = NetworkArena::new();
        let result = arena.refresh(NetworkId(99), &world);
        assert!(matches!(result, Err(NetworkError::UnknownNetwork(NetworkId(99)))));
    }

    #[test]
    fn refresh_of_empty_network_retires_it() {
        let world = GridWorld::new();
        let mut arena = NetworkArena::new();
        let id = arena.create_network();
        arena.refresh(id, &world).unwrap();
        assert!(arena.network(id).is_none());
        assert!(arena.drain_events().contains(&NetworkEvent::Retired { network: id }));
    }

    #[test]
    fn refresh_claims_and_releases_ownership() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 3);
        let mut arena = NetworkArena::new();
        let id = arena.create_network_with(pipes.clone(), &world);

        for &p in &pipes {
            assert_eq!(arena.network_of(p), Some(id));
        }

        world.invalidate(pipes[2]);
        arena.refresh(id, &world).unwrap();
        assert_eq!(arena.network_of(pipes[2]), None);
        assert_eq!(arena.transmitters(id).unwrap().len(), 2);
    }

    #[test]
    fn claiming_a_node_takes_it_from_its_previous_network() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 2);
        let mut arena = NetworkArena::new();
        let a = arena.create_network_with([pipes[0]], &world);
        let b = arena.create_network_with([pipes[0], pipes[1]], &world);

        assert_eq!(arena.network_of(pipes[0]), Some(b));
        // `a` lost its only transmitter.
        assert!(arena.network(a).is_none());
    }

    #[test]
    fn collect_garbage_drops_empty_networks() {
        let mut arena = NetworkArena::new();
        arena.create_network();
        arena.create_network();
        assert_eq!(arena.collect_garbage(), 2);
        assert_eq!(arena.network_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    #[test]
    fn merge_with_self_or_none_is_identity() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 2);
        let mut arena = NetworkArena::new();
        let id = arena.create_network_with(pipes, &world);
        let before = arena.network(id).cloned();

        assert_eq!(arena.merge(id, Some(id), &world).unwrap(), id);
        assert_eq!(arena.merge(id, None, &world).unwrap(), id);
        assert_eq!(arena.network(id).cloned(), before);
        assert_eq!(arena.network_count(), 1);
    }

    #[test]
    fn merge_unions_transmitters_and_retires_inputs() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 4);
        let r = receiver_beside(&mut world, pipes[3], Direction::Up, 5.0);
        let mut arena = NetworkArena::new();
        let a = arena.create_network_with(pipes[..2].to_vec(), &world);
        let b = arena.create_network_with(pipes[2..].to_vec(), &world);
        arena.drain_events();

        let merged = arena.merge(a, Some(b), &world).unwrap();

        assert_ne!(merged, a);
        assert_ne!(merged, b);
        assert!(arena.network(a).is_none());
        assert!(arena.network(b).is_none());
        assert_eq!(
            arena.transmitters(merged).unwrap(),
            &pipes.iter().copied().collect::<BTreeSet<_>>()
        );
        assert_eq!(arena.acceptor_directions(merged, r), Some(&[Direction::Up][..]));
        for &p in &pipes {
            assert_eq!(arena.network_of(p), Some(merged));
        }
        assert!(arena.drain_events().contains(&NetworkEvent::Merged {
            sources: [a, b],
            into: merged,
        }));
    }

    #[test]
    fn merge_unknown_network_is_an_error() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 1);
        let mut arena = NetworkArena::new();
        let id = arena.create_network_with(pipes, &world);

        let result = arena.merge(id, Some(NetworkId(42)), &world);
        assert!(matches!(result, Err(NetworkError::UnknownNetwork(NetworkId(42)))));
        assert!(arena.network(id).is_some());
    }

    // -----------------------------------------------------------------------
    // Split
    // -----------------------------------------------------------------------

    #[test]
    fn split_ring_keeps_one_network() {
        let mut world = GridWorld::new();
        let [t1, t2, t3, t4] = ring4(&mut world);
        let a1 = receiver_beside(&mut world, t1, Direction::Up, 5.0);
        let a2 = receiver_beside(&mut world, t3, Direction::Up, 5.0);
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &[t1, t2, t3, t4]);

        let created = arena.split(id, t2, &world).unwrap();
        world.remove(t2).unwrap();

        assert!(created.is_empty());
        assert_eq!(arena.network_count(), 1);
        assert_eq!(arena.transmitters(id).unwrap(), &BTreeSet::from([t1, t3, t4]));
        assert!(arena.acceptor_directions(id, a1).is_some());
        assert!(arena.acceptor_directions(id, a2).is_some());
        assert_eq!(arena.network_of(t2), None);
    }

    #[test]
    fn split_chain_into_two_networks() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 3);
        let a1 = receiver_beside(&mut world, pipes[0], Direction::Up, 5.0);
        let a2 = receiver_beside(&mut world, pipes[2], Direction::Up, 5.0);
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &pipes);
        arena.drain_events();

        let created = arena.split(id, pipes[1], &world).unwrap();
        world.remove(pipes[1]).unwrap();

        assert_eq!(created.len(), 1);
        let other = created[0];
        // West end is first in direction order, so it stays put.
        assert_eq!(arena.transmitters(id).unwrap(), &BTreeSet::from([pipes[0]]));
        assert_eq!(arena.transmitters(other).unwrap(), &BTreeSet::from([pipes[2]]));
        assert!(arena.acceptor_directions(id, a1).is_some());
        assert!(arena.acceptor_directions(id, a2).is_none());
        assert!(arena.acceptor_directions(other, a2).is_some());
        assert_eq!(arena.network_of(pipes[2]), Some(other));
        assert!(arena.drain_events().contains(&NetworkEvent::Split {
            source: id,
            created: vec![other],
        }));
    }

    #[test]
    fn split_plus_into_four_networks() {
        let mut world = GridWorld::new();
        let center = world.place_transmitter(BlockPos::new(0, 0, 0)).unwrap();
        let mut arms = Vec::new();
        for dir in [Direction::North, Direction::South, Direction::West, Direction::East] {
            let first = BlockPos::new(0, 0, 0).offset(dir);
            let a = world.place_transmitter(first).unwrap();
            let b = world.place_transmitter(first.offset(dir)).unwrap();
            arms.push([a, b]);
        }
        let mut all = vec![center];
        all.extend(arms.iter().flatten().copied());
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &all);

        let created = arena.split(id, center, &world).unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(arena.network_count(), 4);
        // North is the first frontier member in direction order.
        assert_eq!(arena.transmitters(id).unwrap(), &BTreeSet::from(arms[0]));
        for (arm, net) in arms[1..].iter().zip(&created) {
            assert_eq!(arena.transmitters(*net).unwrap(), &BTreeSet::from(*arm));
        }
    }

    #[test]
    fn split_dead_end_only_drops_the_node() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 3);
        let r = receiver_beside(&mut world, pipes[2], Direction::East, 5.0);
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &pipes);

        let created = arena.split(id, pipes[2], &world).unwrap();

        assert!(created.is_empty());
        assert_eq!(arena.transmitters(id).unwrap().len(), 2);
        assert_eq!(arena.acceptor_directions(id, r), None);
    }

    #[test]
    fn split_last_transmitter_retires_network() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 1);
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &pipes);

        arena.split(id, pipes[0], &world).unwrap();
        assert!(arena.network(id).is_none());
        assert_eq!(arena.network_count(), 0);
    }

    #[test]
    fn split_non_transmitter_is_a_no_op() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 2);
        let r = receiver_beside(&mut world, pipes[0], Direction::Up, 5.0);
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &pipes);
        let before = arena.network(id).cloned();

        assert!(arena.split(id, r, &world).unwrap().is_empty());
        assert_eq!(arena.network(id).cloned(), before);
    }

    #[test]
    fn split_unknown_network_is_an_error() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 1);
        let mut arena = NetworkArena::new();
        let result = arena.split(NetworkId(3), pipes[0], &world);
        assert!(matches!(result, Err(NetworkError::UnknownNetwork(NetworkId(3)))));
    }

    #[test]
    fn split_with_a_node_of_another_network_is_a_no_op() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 3);
        let lone = world.place_transmitter(BlockPos::new(10, 0, 0)).unwrap();
        let mut arena = NetworkArena::new();
        let lone_net = arena.attach_transmitter(lone, &world).unwrap();
        let chain_net = attach_all(&mut arena, &world, &pipes);

        let created = arena.split(lone_net, pipes[1], &world).unwrap();

        assert!(created.is_empty());
        assert_eq!(arena.network_count(), 2);
        for &p in &pipes {
            assert_eq!(arena.network_of(p), Some(chain_net));
        }
        assert_eq!(arena.transmitters(lone_net).unwrap(), &BTreeSet::from([lone]));
    }

    #[test]
    fn split_under_search_limit_keeps_a_valid_partition() {
        let mut world = GridWorld::new();
        // A 6x6 loop of pipes, 20 in total.
        let mut ring = Vec::new();
        for x in 0..6 {
            ring.push(world.place_transmitter(BlockPos::new(x, 0, 0)).unwrap());
        }
        for z in 1..6 {
            ring.push(world.place_transmitter(BlockPos::new(5, 0, z)).unwrap());
        }
        for x in (0..5).rev() {
            ring.push(world.place_transmitter(BlockPos::new(x, 0, 5)).unwrap());
        }
        for z in (1..5).rev() {
            ring.push(world.place_transmitter(BlockPos::new(0, 0, z)).unwrap());
        }
        let mut arena = NetworkArena::with_config(NetworkConfig {
            search_limit: Some(4),
            ..NetworkConfig::default()
        });
        let id = attach_all(&mut arena, &world, &ring);
        assert_eq!(arena.network_count(), 1);

        arena.split(id, ring[3], &world).unwrap();
        world.remove(ring[3]).unwrap();

        // The way around is longer than the limit, so the loop is cut apart.
        assert!(arena.network_count() >= 2);
        let survivors: Vec<NodeId> = ring.iter().copied().filter(|&n| n != ring[3]).collect();
        assert!(check_partition(&arena, &world, survivors.clone()).is_empty());
        for node in survivors {
            let owner = arena.network_of(node).unwrap();
            let listed = arena.networks().filter(|n| n.contains(node)).count();
            assert_eq!(listed, 1);
            assert!(arena.transmitters(owner).unwrap().contains(&node));
        }
    }

    // -----------------------------------------------------------------------
    // Placement helpers
    // -----------------------------------------------------------------------

    #[test]
    fn attach_joins_neighbors_into_one_network() {
        let mut world = GridWorld::new();
        let west = chain(&mut world, BlockPos::new(0, 0, 0), 2);
        let east = chain(&mut world, BlockPos::new(3, 0, 0), 2);
        let mut arena = NetworkArena::new();
        let w = attach_all(&mut arena, &world, &west);
        let e = attach_all(&mut arena, &world, &east);
        assert_ne!(w, e);
        assert_eq!(arena.network_count(), 2);

        let bridge = world.place_transmitter(BlockPos::new(2, 0, 0)).unwrap();
        let joined = arena.attach_transmitter(bridge, &world).unwrap();

        assert_eq!(arena.network_count(), 1);
        assert_eq!(arena.transmitters(joined).unwrap().len(), 5);
    }

    #[test]
    fn attach_rejects_non_transmitters() {
        let mut world = GridWorld::new();
        let r = world.place_receiver(BlockPos::new(0, 0, 0), fixed(1.0)).unwrap();
        let mut arena = NetworkArena::new();
        let result = arena.attach_transmitter(r, &world);
        assert!(matches!(result, Err(NetworkError::NotTransmitter(n)) if n == r));
    }

    #[test]
    fn attach_adopts_orphan_neighbors() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 4);
        let mut arena = NetworkArena::new();

        // Only the last pipe is announced; the rest were never registered.
        let id = arena.attach_transmitter(pipes[3], &world).unwrap();
        for &p in &pipes {
            assert_eq!(arena.network_of(p), Some(id));
        }
        assert_eq!(arena.transmitters(id).unwrap().len(), 4);
        assert!(check_partition(&arena, &world, pipes).is_empty());
    }

    #[test]
    fn attach_through_orphans_merges_the_network_beyond() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 5);
        let mut arena = NetworkArena::new();
        let far = arena.create_network_with([pipes[0]], &world);

        // pipes[1..4] are unowned; pipes[0] already has a network.
        let id = arena.attach_transmitter(pipes[4], &world).unwrap();

        assert_eq!(arena.network_count(), 1);
        assert!(arena.network(far).is_none());
        assert_eq!(
            arena.transmitters(id).unwrap(),
            &pipes.iter().copied().collect::<BTreeSet<_>>()
        );
        assert!(check_partition(&arena, &world, pipes).is_empty());
    }

    #[test]
    fn detach_unowned_node_is_a_no_op() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 1);
        let mut arena = NetworkArena::new();
        assert!(arena.detach_transmitter(pipes[0], &world).unwrap().is_empty());
    }

    #[test]
    fn refresh_around_picks_up_a_new_acceptor() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 2);
        let mut arena = NetworkArena::new();
        let id = attach_all(&mut arena, &world, &pipes);

        let pos = BlockPos::new(1, 1, 0);
        let r = world.place_receiver(pos, fixed(4.0)).unwrap();
        assert_eq!(arena.acceptor_directions(id, r), None);

        arena.refresh_around(pos, &world);
        assert_eq!(arena.acceptor_directions(id, r), Some(&[Direction::Up][..]));
    }

    // -----------------------------------------------------------------------
    // Distribution
    // -----------------------------------------------------------------------

    #[test]
    fn produce_through_arena_uses_injected_fallback() {
        let mut world = GridWorld::new();
        let pipes = chain(&mut world, BlockPos::new(0, 0, 0), 2);
        receiver_beside(&mut world, pipes[0], Direction::Up, 10.0);
        let sink = sink_beside(&mut world, pipes[1], Direction::Up);

        let mut arena = NetworkArena::with_config(NetworkConfig {
            fixed_share_fallback: true,
            ..NetworkConfig::default()
        });
        let id = attach_all(&mut arena, &world, &pipes);

        arena.produce(id, fixed(10.0), &[], &mut world).unwrap();
        assert_eq!(world.received(sink), fixed(5.0));
        assert_eq!(arena.request(id, &[], &world).unwrap(), fixed(10.0));
    }

    #[test]
    fn produce_unknown_network_is_an_error() {
        let mut world = GridWorld::new();
        let arena = NetworkArena::new();
        let result = arena.produce(NetworkId(0), fixed(1.0), &[], &mut world);
        assert!(matches!(result, Err(NetworkError::UnknownNetwork(_))));
    }
}
