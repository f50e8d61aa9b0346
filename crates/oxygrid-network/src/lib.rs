//! Oxygrid networks -- dynamic transmitter networks and supply distribution.
//!
//! Transmitters placed next to each other form a network. Networks join when
//! a transmitter bridges them and break apart when one is removed. Each
//! network caches the acceptors its transmitters touch and shares a supply
//! among them according to their requests.
//!
//! # Key Types
//!
//! - [`NetworkArena`] -- Owns every network and the node -> network table.
//!   All topology changes (refresh, merge, split) go through it.
//! - [`OxygenNetwork`] -- One network: transmitters, acceptor cache, and the
//!   `request`/`produce` distribution step.
//! - [`Pathfinder`] -- Breadth-first connectivity search used by split.
//! - [`NetworkConfig`] -- Settings injected at arena construction.
//! - [`NetworkEvent`] -- Buffered record of topology changes.
//!
//! # Host Contract
//!
//! ```rust,ignore
//! let mut arena = NetworkArena::new();
//! let pipe = world.place_transmitter(pos)?;
//! arena.attach_transmitter(pipe, &world)?;
//!
//! // Before the pipe leaves the world:
//! arena.detach_transmitter(pipe, &world)?;
//! world.remove(pipe)?;
//! ```

pub mod arena;
pub mod config;
pub mod event;
pub mod network;
pub mod pathfinder;
pub mod validation;

use oxygrid_core::id::{NetworkId, NodeId};
use oxygrid_core::world::WorldError;

pub use arena::NetworkArena;
pub use config::NetworkConfig;
pub use event::NetworkEvent;
pub use network::OxygenNetwork;
pub use pathfinder::{Pathfinder, SearchOutcome};

/// Errors from arena operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("unknown network: {0}")]
    UnknownNetwork(NetworkId),
    #[error("node {0:?} is not a transmitter of this arena's type")]
    NotTransmitter(NodeId),
    #[error("world error: {0}")]
    World(#[from] WorldError),
}
