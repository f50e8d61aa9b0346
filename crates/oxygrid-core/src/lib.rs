//! Oxygrid Core -- shared vocabulary for transmitter networks.
//!
//! This crate holds everything the network engine needs to talk about the
//! host world without owning it:
//!
//! - [`id`] -- [`id::NodeId`] (a block in the host world) and
//!   [`id::NetworkId`] (a network in the arena).
//! - [`fixed`] -- Q32.32 fixed-point amounts for deterministic distribution.
//! - [`direction`] -- the six axis [`direction::Direction`]s and
//!   [`direction::BlockPos`].
//! - [`world`] -- the [`world::World`] trait the engine consumes, plus the
//!   value types it speaks in ([`world::NodeKind`], [`world::Capability`],
//!   [`world::NetworkType`]).
//! - [`grid`] -- [`grid::GridWorld`], an in-memory reference host used by
//!   tests, benches and the examples.

pub mod direction;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
