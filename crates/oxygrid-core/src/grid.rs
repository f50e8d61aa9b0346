//! In-memory reference host for the [`World`] trait.
//!
//! Maps block positions to nodes the same way a voxel world would, with just
//! enough block behavior to drive networks: transmitters, demand receivers,
//! fixed-share sinks and inert filler. Tests, benches and the examples build
//! their topologies on top of it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::direction::{BlockPos, Direction};
use crate::fixed::Fixed64;
use crate::id::NodeId;
use crate::world::{Capability, NetworkType, NodeKind, World, WorldError};

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// An acceptor that reports a request on each connectable side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Resource this receiver accepts.
    pub network_type: NetworkType,
    /// Which sides accept a connection, indexed by [`Direction::index`].
    pub sides: [bool; 6],
    /// Amount requested on each connectable side. Also the most a single
    /// delivery can absorb.
    pub demand: Fixed64,
    /// Total absorbed so far.
    pub received: Fixed64,
}

impl Receiver {
    /// A receiver open on all six sides.
    pub fn new(network_type: NetworkType, demand: Fixed64) -> Self {
        Self {
            network_type,
            sides: [true; 6],
            demand,
            received: Fixed64::ZERO,
        }
    }
}

/// An acceptor that cannot report a request and takes whatever it is offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedShareSink {
    pub network_type: NetworkType,
    pub sides: [bool; 6],
    pub received: Fixed64,
}

impl FixedShareSink {
    pub fn new(network_type: NetworkType) -> Self {
        Self {
            network_type,
            sides: [true; 6],
            received: Fixed64::ZERO,
        }
    }
}

/// What occupies a grid position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Transmitter(NetworkType),
    Receiver(Receiver),
    FixedShareSink(FixedShareSink),
    Inert,
}

#[derive(Debug, Clone)]
struct GridNode {
    pos: BlockPos,
    block: Block,
    valid: bool,
}

/// Errors from grid placement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position {0:?} is occupied")]
    Occupied(BlockPos),
    #[error("node is not placed on the grid")]
    NotPlaced,
}

// ---------------------------------------------------------------------------
// GridWorld
// ---------------------------------------------------------------------------

/// A sparse block grid implementing [`World`].
///
/// Maintains a bidirectional mapping:
/// - `tiles`: position -> node
/// - `nodes`: node -> position, block and validity
#[derive(Debug, Default)]
pub struct GridWorld {
    nodes: SlotMap<NodeId, GridNode>,
    tiles: BTreeMap<BlockPos, NodeId>,
    faulty: BTreeSet<NodeId>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Placement --

    /// Place a block at `pos` and return its node id.
    pub fn place(&mut self, pos: BlockPos, block: Block) -> Result<NodeId, GridError> {
        if self.tiles.contains_key(&pos) {
            return Err(GridError::Occupied(pos));
        }
        let node = self.nodes.insert(GridNode {
            pos,
            block,
            valid: true,
        });
        self.tiles.insert(pos, node);
        Ok(node)
    }

    /// Place an oxygen transmitter.
    pub fn place_transmitter(&mut self, pos: BlockPos) -> Result<NodeId, GridError> {
        self.place(pos, Block::Transmitter(NetworkType::Oxygen))
    }

    /// Place an oxygen receiver requesting `demand` on every side.
    pub fn place_receiver(&mut self, pos: BlockPos, demand: Fixed64) -> Result<NodeId, GridError> {
        self.place(pos, Block::Receiver(Receiver::new(NetworkType::Oxygen, demand)))
    }

    /// Remove a block entirely. The node id becomes unknown.
    pub fn remove(&mut self, node: NodeId) -> Result<BlockPos, GridError> {
        let removed = self.nodes.remove(node).ok_or(GridError::NotPlaced)?;
        self.tiles.remove(&removed.pos);
        self.faulty.remove(&node);
        Ok(removed.pos)
    }

    /// Mark a block invalid without clearing its position, the way a host
    /// flags a block that is about to disappear.
    pub fn invalidate(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.valid = false;
        }
    }

    /// Make adjacency lookups for `node` fail (or succeed again).
    pub fn set_lookup_fault(&mut self, node: NodeId, faulty: bool) {
        if faulty {
            self.faulty.insert(node);
        } else {
            self.faulty.remove(&node);
        }
    }

    // -- Block state --

    pub fn block(&self, node: NodeId) -> Option<&Block> {
        self.nodes.get(node).map(|n| &n.block)
    }

    pub fn block_mut(&mut self, node: NodeId) -> Option<&mut Block> {
        self.nodes.get_mut(node).map(|n| &mut n.block)
    }

    /// Total absorbed by an acceptor so far; zero for anything else.
    pub fn received(&self, node: NodeId) -> Fixed64 {
        match self.block(node) {
            Some(Block::Receiver(r)) => r.received,
            Some(Block::FixedShareSink(s)) => s.received,
            _ => Fixed64::ZERO,
        }
    }

    /// Change a receiver's per-side demand.
    pub fn set_demand(&mut self, node: NodeId, demand: Fixed64) {
        if let Some(Block::Receiver(r)) = self.block_mut(node) {
            r.demand = demand;
        }
    }

    /// Open or close one side of an acceptor.
    pub fn set_side(&mut self, node: NodeId, dir: Direction, open: bool) {
        match self.block_mut(node) {
            Some(Block::Receiver(r)) => r.sides[dir.index()] = open,
            Some(Block::FixedShareSink(s)) => s.sides[dir.index()] = open,
            _ => {}
        }
    }

    /// Zero every acceptor's received counter.
    pub fn reset_received(&mut self) {
        for node in self.nodes.values_mut() {
            match &mut node.block {
                Block::Receiver(r) => r.received = Fixed64::ZERO,
                Block::FixedShareSink(s) => s.received = Fixed64::ZERO,
                _ => {}
            }
        }
    }

    // -- Iteration --

    /// Every placed node, in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    /// Every valid transmitter carrying `network_type`.
    pub fn transmitters(&self, network_type: NetworkType) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter_map(move |(id, n)| {
            (n.valid && n.block == Block::Transmitter(network_type)).then_some(id)
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl World for GridWorld {
    fn node_at(&self, pos: BlockPos) -> Option<NodeId> {
        self.tiles.get(&pos).copied()
    }

    fn position(&self, node: NodeId) -> Option<BlockPos> {
        self.nodes.get(node).map(|n| n.pos)
    }

    fn is_valid(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.valid)
    }

    fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(node).map(|n| match &n.block {
            Block::Transmitter(ty) => NodeKind::Transmitter(*ty),
            Block::Receiver(_) | Block::FixedShareSink(_) => NodeKind::Acceptor,
            Block::Inert => NodeKind::Inert,
        })
    }

    fn capability(&self, node: NodeId) -> Capability {
        match self.block(node) {
            Some(Block::Receiver(_)) => Capability::Demand,
            Some(Block::FixedShareSink(_)) => Capability::FixedShare,
            _ => Capability::Unsupported,
        }
    }

    fn can_connect(&self, node: NodeId, dir: Direction, network_type: NetworkType) -> bool {
        match self.block(node) {
            Some(Block::Receiver(r)) => r.network_type == network_type && r.sides[dir.index()],
            Some(Block::FixedShareSink(s)) => {
                s.network_type == network_type && s.sides[dir.index()]
            }
            _ => false,
        }
    }

    fn requested_amount(&self, node: NodeId, dir: Direction) -> Fixed64 {
        match self.block(node) {
            Some(Block::Receiver(r)) if r.sides[dir.index()] => r.demand,
            _ => Fixed64::ZERO,
        }
    }

    fn deliver(&mut self, node: NodeId, dir: Direction, amount: Fixed64, simulate: bool) -> Fixed64 {
        if amount <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        match self.block_mut(node) {
            Some(Block::Receiver(r)) if r.sides[dir.index()] => {
                let absorbed = amount.min(r.demand).max(Fixed64::ZERO);
                if !simulate {
                    r.received += absorbed;
                }
                absorbed
            }
            Some(Block::FixedShareSink(s)) if s.sides[dir.index()] => {
                if !simulate {
                    s.received += amount;
                }
                amount
            }
            _ => Fixed64::ZERO,
        }
    }

    fn adjacent_connections(&self, node: NodeId) -> Result<[Option<NodeId>; 6], WorldError> {
        if self.faulty.contains(&node) {
            return Err(WorldError::LookupFailed(node));
        }
        let pos = self.position(node).ok_or(WorldError::NotPlaced(node))?;
        Ok(Direction::ALL.map(|dir| self.node_at(pos.offset(dir))))
    }
}
