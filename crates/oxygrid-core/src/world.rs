//! The host-world interface consumed by the network engine.
//!
//! The engine never owns blocks. It asks a [`World`] what sits where, whether
//! a node is still valid, and how much an acceptor wants, and it hands
//! delivered amounts back through [`World::deliver`].

use serde::{Deserialize, Serialize};

use crate::direction::{BlockPos, Direction};
use crate::fixed::Fixed64;
use crate::id::NodeId;

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// The resource a transmitter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum NetworkType {
    Power,
    #[default]
    Oxygen,
    Hydrogen,
}

/// What role a node plays in a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A pipe segment relaying the given resource.
    Transmitter(NetworkType),
    /// An endpoint that may request and absorb resource.
    Acceptor,
    /// Occupies a position but takes no part in any network.
    Inert,
}

/// How an acceptor takes part in distribution.
///
/// Dispatched once per endpoint during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Capability {
    /// Reports a numeric request per direction; receives a demand-proportional share.
    Demand,
    /// Cannot report a request; receives an equal share of the supply.
    FixedShare,
    /// Never receives anything.
    #[default]
    Unsupported,
}

/// Errors surfaced by world lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("node {0:?} is not placed in the world")]
    NotPlaced(NodeId),
    #[error("adjacency lookup failed for node {0:?}")]
    LookupFailed(NodeId),
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Queries and callbacks the engine needs from the host simulation.
///
/// Lookups for nodes that have disappeared return `None` / `false` / zero;
/// the engine treats that as an ordinary outcome.
pub trait World {
    /// The node occupying `pos`, if any.
    fn node_at(&self, pos: BlockPos) -> Option<NodeId>;

    /// Where `node` sits, if it is placed.
    fn position(&self, node: NodeId) -> Option<BlockPos>;

    /// Whether `node` is still live in the world.
    fn is_valid(&self, node: NodeId) -> bool;

    /// The role of `node`, or `None` for unknown nodes.
    fn node_kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Distribution capability of an acceptor.
    fn capability(&self, node: NodeId) -> Capability;

    /// Whether the acceptor accepts `network_type` on its `dir` side.
    fn can_connect(&self, node: NodeId, dir: Direction, network_type: NetworkType) -> bool;

    /// Amount the acceptor requests through its `dir` side.
    fn requested_amount(&self, node: NodeId, dir: Direction) -> Fixed64;

    /// Offer `amount` through the `dir` side. Returns the amount absorbed.
    /// With `simulate` set, nothing is stored.
    fn deliver(&mut self, node: NodeId, dir: Direction, amount: Fixed64, simulate: bool) -> Fixed64;

    /// The six neighbors of `node`, indexed by [`Direction::index`].
    fn adjacent_connections(&self, node: NodeId) -> Result<[Option<NodeId>; 6], WorldError> {
        let pos = self.position(node).ok_or(WorldError::NotPlaced(node))?;
        Ok(Direction::ALL.map(|dir| self.node_at(pos.offset(dir))))
    }

    /// The node next to `node` in `dir`.
    fn neighbor(&self, node: NodeId, dir: Direction) -> Option<NodeId> {
        let pos = self.position(node)?;
        self.node_at(pos.offset(dir))
    }

    /// Whether `node` is a valid transmitter carrying `network_type`.
    fn is_transmitter(&self, node: NodeId, network_type: NetworkType) -> bool {
        self.is_valid(node) && self.node_kind(node) == Some(NodeKind::Transmitter(network_type))
    }
}
