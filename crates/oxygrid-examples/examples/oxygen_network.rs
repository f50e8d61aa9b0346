//! Oxygen network example: placement, distribution, and splitting.
//!
//! Lays a loop of oxygen pipes with two vents and a scrubber attached,
//! distributes supply, then digs up pipes to show a loop surviving a cut
//! and a chain breaking into two networks.
//!
//! Run with: `RUST_LOG=debug cargo run -p oxygrid-examples --example oxygen_network`

use oxygrid_core::direction::BlockPos;
use oxygrid_core::fixed::{Fixed64, fixed64_to_f64};
use oxygrid_core::grid::{Block, FixedShareSink, GridWorld};
use oxygrid_core::id::NodeId;
use oxygrid_core::world::NetworkType;
use oxygrid_data::{Format, parse_network_config};
use oxygrid_network::NetworkArena;
use tracing_subscriber::EnvFilter;

fn print_networks(arena: &NetworkArena) {
    for network in arena.networks() {
        println!("  {network}");
    }
}

fn dig_up(arena: &mut NetworkArena, world: &mut GridWorld, node: NodeId) {
    let created = arena.detach_transmitter(node, world).unwrap();
    world.remove(node).unwrap();
    println!("  removed pipe, {} new network(s)", created.len());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let config = parse_network_config("(fixed_share_fallback: true)", Format::Ron).unwrap();
    let mut arena = NetworkArena::with_config(config);
    let mut world = GridWorld::new();

    // --- Lay a 3x3 loop of pipes ---

    let mut ring = Vec::new();
    for (x, z) in [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)] {
        let pipe = world.place_transmitter(BlockPos::new(x, 0, z)).unwrap();
        arena.attach_transmitter(pipe, &world).unwrap();
        ring.push(pipe);
    }

    // Two vents on top of opposite corners, a scrubber in the middle.
    let vent_a = world
        .place_receiver(BlockPos::new(0, 1, 0), Fixed64::from_num(12))
        .unwrap();
    let vent_b = world
        .place_receiver(BlockPos::new(2, 1, 2), Fixed64::from_num(4))
        .unwrap();
    let scrubber = world
        .place(
            BlockPos::new(1, 0, 1),
            Block::FixedShareSink(FixedShareSink::new(NetworkType::Oxygen)),
        )
        .unwrap();
    for pos in [BlockPos::new(0, 1, 0), BlockPos::new(2, 1, 2), BlockPos::new(1, 0, 1)] {
        arena.refresh_around(pos, &world);
    }

    println!("=== Scenario 1: distribution on an intact loop ===\n");
    print_networks(&arena);

    let id = arena.network_of(ring[0]).unwrap();
    let request = arena.request(id, &[], &world).unwrap();
    let remaining = arena.produce(id, Fixed64::from_num(16), &[], &mut world).unwrap();
    println!("  average request: {:.2}", fixed64_to_f64(request));
    println!("  vent A received: {:.2}", fixed64_to_f64(world.received(vent_a)));
    println!("  vent B received: {:.2}", fixed64_to_f64(world.received(vent_b)));
    println!("  scrubber received: {:.2}", fixed64_to_f64(world.received(scrubber)));
    println!("  remaining supply: {:.2}\n", fixed64_to_f64(remaining));

    // --- Scenario 2: cut the loop once ---

    println!("=== Scenario 2: one cut keeps the loop whole ===\n");
    dig_up(&mut arena, &mut world, ring[1]);
    print_networks(&arena);

    // --- Scenario 3: cut it again on the far side ---

    println!("\n=== Scenario 3: a second cut splits it ===\n");
    dig_up(&mut arena, &mut world, ring[5]);
    print_networks(&arena);

    for event in arena.drain_events() {
        println!("  event: {event:?}");
    }

    // --- Scenario 4: each half feeds only its own vent ---

    println!("\n=== Scenario 4: halves distribute independently ===\n");
    world.reset_received();
    let east = arena.network_of(ring[3]).unwrap();
    let remaining = arena.produce(east, Fixed64::from_num(10), &[], &mut world).unwrap();
    println!("  vent A received: {:.2}", fixed64_to_f64(world.received(vent_a)));
    println!("  vent B received: {:.2}", fixed64_to_f64(world.received(vent_b)));
    println!("  remaining supply: {:.2}", fixed64_to_f64(remaining));
}
