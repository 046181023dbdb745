//! Four-legged walker on an in-memory grid
//!
//! Run with `RUST_LOG=debug` to see mode switches and step advances.

use animatron_core::memory::{MemoryBlock, MemoryGrid};
use animatron_core::BlockRef;
use animatron_host::Program;
use glam::Vec3;

const CONFIG: &str = "\
[animation]
definitions=Leg Data
controller=Pilot Seat

[legs.walk]
triggers=CONTROLLER_FORWARD
repeat=true
priority=1
steps=
|- front pair swings forward while the rear pair pushes
|Move;Blocks;Front Hip;30;2;4;Continue
|Move;Blocks;Rear Hip;-30;2;4;Wait
|Move;Blocks;Front Hip;-30;2;4;Continue
|Move;Blocks;Rear Hip;30;2;4;Wait

[legs.stand]
triggers=CONTROLLER_NEITHER_FORWARD_NOR_BACKWARD
steps=
|Move;Blocks;Hip;0;1;2;Wait
|Lock;Group;Feet;true;Continue
";

const LEG_DATA: &str = "\
[lights.beacon]
triggers=CONTROLLER_FORWARD
repeat=true
steps=
|Toggle;Block;Beacon;false
|Toggle;Block;Beacon;true
";

fn main() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();

    let mut grid = MemoryGrid::new();
    let me = grid.add(MemoryBlock::program("Walker Program", CONFIG));
    grid.add(MemoryBlock::generic("Leg Data").with_custom_data(LEG_DATA));
    let seat = grid.add(MemoryBlock::controller("Pilot Seat"));
    for name in [
        "Front Hip Left",
        "Front Hip Right",
        "Rear Hip Left",
        "Rear Hip Right",
    ] {
        grid.add(MemoryBlock::rotor(name));
    }
    for name in ["Foot Left", "Foot Right"] {
        grid.add(MemoryBlock::landing_gear(name));
    }
    grid.add_group("Feet", &["Foot Left", "Foot Right"]);
    grid.add(MemoryBlock::light("Beacon"));

    let mut program = Program::new(BlockRef::new(me), grid);
    if let Some(error) = program.setup_error() {
        log::error!("setup failed: {error}");
        return;
    }

    seat.set_move_indicator(Vec3::new(0.0, 0.0, -1.0));
    for tick in 0..12 {
        if tick == 8 {
            log::info!("pilot lets go of the stick");
            seat.set_move_indicator(Vec3::ZERO);
        }
        let status = program.tick("");
        program.directory().settle();
        println!("--- tick {tick}\n{status}");
    }
}
