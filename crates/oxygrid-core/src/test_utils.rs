//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::direction::{BlockPos, Direction};
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::grid::{Block, FixedShareSink, GridWorld};
use crate::id::NodeId;
use crate::world::NetworkType;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    f64_to_fixed64(v)
}

// ===========================================================================
// Topology builders
// ===========================================================================

/// Lay `len` oxygen transmitters eastward from `origin`.
pub fn chain(world: &mut GridWorld, origin: BlockPos, len: usize) -> Vec<NodeId> {
    let mut nodes = Vec::with_capacity(len);
    let mut pos = origin;
    for _ in 0..len {
        nodes.push(world.place_transmitter(pos).unwrap());
        pos = pos.offset(Direction::East);
    }
    nodes
}

/// Four transmitters in a square loop on the y = 0 plane:
///
/// ```text
///   T1 (0,0,0) -- T2 (1,0,0)
///   |             |
///   T4 (0,0,1) -- T3 (1,0,1)
/// ```
pub fn ring4(world: &mut GridWorld) -> [NodeId; 4] {
    [
        world.place_transmitter(BlockPos::new(0, 0, 0)).unwrap(),
        world.place_transmitter(BlockPos::new(1, 0, 0)).unwrap(),
        world.place_transmitter(BlockPos::new(1, 0, 1)).unwrap(),
        world.place_transmitter(BlockPos::new(0, 0, 1)).unwrap(),
    ]
}

/// Place a receiver requesting `demand` next to `node`, in `dir`.
pub fn receiver_beside(world: &mut GridWorld, node: NodeId, dir: Direction, demand: f64) -> NodeId {
    let pos = crate::world::World::position(world, node).unwrap().offset(dir);
    world.place_receiver(pos, fixed(demand)).unwrap()
}

/// Place a fixed-share sink next to `node`, in `dir`.
pub fn sink_beside(world: &mut GridWorld, node: NodeId, dir: Direction) -> NodeId {
    let pos = crate::world::World::position(world, node).unwrap().offset(dir);
    world
        .place(pos, Block::FixedShareSink(FixedShareSink::new(NetworkType::Oxygen)))
        .unwrap()
}

/// A 2D `width` x `depth` slab of transmitters on the y = 0 plane.
pub fn slab(world: &mut GridWorld, width: i32, depth: i32) -> Vec<NodeId> {
    let mut nodes = Vec::with_capacity((width * depth).max(0) as usize);
    for z in 0..depth {
        for x in 0..width {
            nodes.push(world.place_transmitter(BlockPos::new(x, 0, z)).unwrap());
        }
    }
    nodes
}
