//! Connectivity search over transmitter positions.
//!
//! A breadth-first walk that only expands positions holding a valid
//! transmitter of the searched [`NetworkType`]. Used to discover every
//! transmitter reachable from a seed, and to check whether two nodes are
//! still linked once a transmitter has been taken out.

use std::collections::{BTreeSet, VecDeque};

use oxygrid_core::direction::{BlockPos, Direction};
use oxygrid_core::id::NodeId;
use oxygrid_core::world::{NetworkType, World};

/// What a search found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Every position visited: expanded transmitters plus the target's
    /// position when it was reached.
    pub closed_set: BTreeSet<BlockPos>,
    /// Non-empty iff the target was reached.
    pub results: Vec<NodeId>,
    /// The search stopped at its position limit before exhausting the frontier.
    pub truncated: bool,
}

/// A configured connectivity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pathfinder {
    network_type: NetworkType,
    excluded: Option<NodeId>,
    target: Option<NodeId>,
    limit: Option<usize>,
}

impl Pathfinder {
    /// Discover-all search over transmitters carrying `network_type`.
    pub fn new(network_type: NetworkType) -> Self {
        Self {
            network_type,
            excluded: None,
            target: None,
            limit: None,
        }
    }

    /// Never expand `node`, even if it is still a valid transmitter.
    pub fn excluding(mut self, node: NodeId) -> Self {
        self.excluded = Some(node);
        self
    }

    /// Stop as soon as `node` is reached.
    pub fn targeting(mut self, node: NodeId) -> Self {
        self.target = Some(node);
        self
    }

    /// Cap the number of closed positions.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn expandable<W: World + ?Sized>(&self, world: &W, node: NodeId) -> bool {
        Some(node) != self.excluded && world.is_transmitter(node, self.network_type)
    }

    /// Run the search from `start`.
    ///
    /// An unplaced or non-transmitter start yields an empty outcome.
    pub fn search<W: World + ?Sized>(&self, world: &W, start: NodeId) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        let Some(start_pos) = world.position(start) else {
            return outcome;
        };
        if !self.expandable(world, start) {
            return outcome;
        }

        outcome.closed_set.insert(start_pos);
        if self.target == Some(start) {
            outcome.results.push(start);
            return outcome;
        }

        let mut open: VecDeque<BlockPos> = VecDeque::from([start_pos]);

        while let Some(pos) = open.pop_front() {
            for dir in Direction::ALL {
                let next = pos.offset(dir);
                if outcome.closed_set.contains(&next) {
                    continue;
                }
                // Vanished blocks read as empty space.
                let Some(node) = world.node_at(next) else {
                    continue;
                };

                if self.target == Some(node) {
                    outcome.closed_set.insert(next);
                    outcome.results.push(node);
                    return outcome;
                }

                if !self.expandable(world, node) {
                    continue;
                }

                if self.limit.is_some_and(|limit| outcome.closed_set.len() >= limit) {
                    tracing::warn!(
                        limit = outcome.closed_set.len(),
                        "connectivity search hit its position limit"
                    );
                    outcome.truncated = true;
                    return outcome;
                }

                outcome.closed_set.insert(next);
                open.push_back(next);
            }
        }

        tracing::trace!(closed = outcome.closed_set.len(), "connectivity search exhausted");
        outcome
    }

    /// All transmitters in the component containing `start`.
    pub fn discover<W: World + ?Sized>(&self, world: &W, start: NodeId) -> BTreeSet<NodeId> {
        self.search(world, start)
            .closed_set
            .into_iter()
            .filter_map(|pos| world.node_at(pos))
            .filter(|&node| self.expandable(world, node))
            .collect()
    }

    /// Whether `to` can be reached from `from` through transmitters.
    pub fn connected<W: World + ?Sized>(&self, world: &W, from: NodeId, to: NodeId) -> bool {
        !self.targeting(to).search(world, from).results.is_empty()
    }
}
