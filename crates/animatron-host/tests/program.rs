//! End-to-end ticks against the in-memory grid

use animatron_core::memory::{MemoryBlock, MemoryGrid};
use animatron_core::{Block, Functional};
use animatron_host::{Program, NO_SEGMENTS};
use glam::Vec3;
use std::rc::Rc;

const WALKER: &str = "\
[animation]
controllerDeadzonePercentage=10

[legs.walk]
triggers=CONTROLLER_FORWARD
repeat=true
steps=
|- lift the leg, then put it down
|Move;Block;Hip;90;1;2;Wait
|Move;;;0;;;
";

struct Rig {
    me: Rc<MemoryBlock>,
    hip: Rc<MemoryBlock>,
    seat: Rc<MemoryBlock>,
    program: Program<MemoryGrid>,
}

fn rig(config: &str) -> Rig {
    let mut grid = MemoryGrid::new();
    let me = grid.add(MemoryBlock::program("Walker Program", config));
    let hip = grid.add(MemoryBlock::rotor("Hip"));
    let seat = grid.add(MemoryBlock::controller("Pilot Seat"));
    grid.add(MemoryBlock::light("Hazard Light"));
    grid.add(MemoryBlock::light("Beacon"));
    let program = Program::new(animatron_core::BlockRef::new(me.clone()), grid);
    Rig {
        me,
        hip,
        seat,
        program,
    }
}

fn step_of(rig: &Rig, segment: &str) -> Option<usize> {
    rig.program
        .sequencer()
        .and_then(|sequencer| sequencer.progress().get(segment))
        .and_then(|progress| progress.active_step)
}

#[test]
fn test_walk_cycle() {
    let mut rig = rig(WALKER);
    rig.seat.set_move_indicator(Vec3::new(0.0, 0.0, -1.0));

    let status = rig.program.tick("");
    assert!(status.contains(" > legs.walk.0"));
    assert_eq!(rig.hip.limits(), (0.0, 90.0));
    assert_eq!(rig.hip.velocity(), 2.0);

    // Holds until the hip reaches 90 ± 1
    rig.program.tick("");
    assert_eq!(step_of(&rig, "legs"), Some(0));
    rig.hip.set_angle_deg(45.0);
    rig.program.tick("");
    assert_eq!(step_of(&rig, "legs"), Some(0));

    rig.hip.settle();
    let status = rig.program.tick("");
    assert!(status.contains(" > legs.walk.1"));
    assert!(rig.hip.velocity() < 0.0);

    rig.hip.settle();
    rig.program.tick("");
    assert_eq!(step_of(&rig, "legs"), Some(0));
    assert!(rig.hip.velocity() > 0.0);
}

#[test]
fn test_no_input_no_walk() {
    let mut rig = rig(WALKER);
    let status = rig.program.tick("");
    assert!(status.ends_with("Active animation steps:\n"));
    assert_eq!(rig.hip.velocity(), 0.0);
}

#[test]
fn test_deadzone_blocks_light_input() {
    let mut rig = rig(WALKER);
    rig.seat.set_move_indicator(Vec3::new(0.0, 0.0, -0.05));
    rig.program.tick("");
    assert_eq!(step_of(&rig, "legs"), None);
}

#[test]
fn test_priority_and_ties() {
    let config = "\
[lights.first]
triggers=ARGUMENT_go
steps=Toggle;Block;Hazard Light;false

[lights.second]
triggers=ARGUMENT_go
steps=Toggle;Block;Beacon;false

[lights.urgent]
triggers=ARGUMENT_alarm
priority=10
steps=Toggle;Block;Beacon;false

[lights.any]
triggers=ARGUMENT_alarm
priority=1
steps=Toggle;Block;Hazard Light;false
";
    let mut rig = rig(config);

    rig.program.tick("go");
    let active = |rig: &Rig| {
        rig.program
            .sequencer()
            .and_then(|sequencer| sequencer.progress().get("lights"))
            .and_then(|progress| progress.active_mode.clone())
    };
    assert_eq!(active(&rig).as_deref(), Some("first"));

    rig.program.tick("alarm");
    assert_eq!(active(&rig).as_deref(), Some("urgent"));
}

#[test]
fn test_non_repeating_mode_stays_idle() {
    let config = "\
[lights.flash]
triggers=ARGUMENT_flash
steps=
|Toggle;Block;Beacon;false
|Toggle;Block;Beacon;true
";
    let mut rig = rig(config);
    let beacon = rig.program.directory().get("Beacon").unwrap();

    rig.program.tick("flash");
    assert!(!beacon.enabled());
    rig.program.tick("");
    assert!(beacon.enabled());

    beacon.set_enabled(false);
    for _ in 0..3 {
        rig.program.tick("");
    }
    assert!(!beacon.enabled());
    assert_eq!(step_of(&rig, "lights"), Some(1));

    let lights = rig
        .program
        .sequencer()
        .and_then(|sequencer| sequencer.progress().get("lights"))
        .cloned()
        .unwrap();
    assert!(lights.is_active("flash"));

    // Firing the trigger of the already selected mode does not rewind it
    rig.program.tick("flash");
    assert_eq!(step_of(&rig, "lights"), Some(1));
}

#[test]
fn test_recording_round_trip() {
    let mut rig = rig("");
    rig.program.tick("RECORD;lights;off");
    assert!(rig.program.is_recording());

    let hazard = rig.program.directory().get("Hazard Light").unwrap();
    hazard.set_enabled(false);
    let status = rig.program.tick("RECORD_STEPS");
    assert!(status.contains("Current recorded steps count: 1"));

    // Animation is halted while recording
    let status = rig.program.tick("anything");
    assert!(!status.contains(NO_SEGMENTS));

    rig.program.tick("RECORDING_DONE");
    assert!(!rig.program.is_recording());

    let data = rig.me.custom_data();
    assert!(data.contains("[lights.off]"));
    assert!(data.contains("steps=Toggle;Block;Hazard Light;false;Wait"));
    assert!(data.contains("triggers=NONE"));
    assert!(data.contains("repeat=false"));

    let animation = rig.program.sequencer().unwrap().animation();
    assert_eq!(animation.len(), 1);
}

#[test]
fn test_circular_definitions_build_nothing() {
    let mut grid = MemoryGrid::new();
    let me = grid.add(MemoryBlock::program(
        "PB",
        "[animation]\ndefinitions=Left\n[legs.walk]\nsteps=Toggle;Block;Left;true\n",
    ));
    grid.add(MemoryBlock::generic("Left").with_custom_data("[animation]\ndefinitions=Right\n"));
    grid.add(MemoryBlock::generic("Right").with_custom_data("[animation]\ndefinitions=Left\n"));

    let mut program = Program::new(animatron_core::BlockRef::new(me), grid);
    assert!(program.sequencer().is_none());
    let error = program.setup_error().unwrap().to_string();
    assert_eq!(error, "circular definitions: Left -> Right -> Left");
    assert!(program.tick("").contains("Setup failed"));
}

#[test]
fn test_named_controller_and_surface() {
    let config = "\
[animation]
controller=Remote
surface=Status LCD

[legs.walk]
triggers=CONTROLLER_FORWARD
steps=Move;Block;Hip;90;1;2;Wait
";
    let mut grid = MemoryGrid::new();
    let me = grid.add(MemoryBlock::program("PB", config));
    let hip = grid.add(MemoryBlock::rotor("Hip"));
    let seat = grid.add(MemoryBlock::controller("Seat"));
    let remote = grid.add(MemoryBlock::controller("Remote"));
    let lcd = grid.add(MemoryBlock::surface("Status LCD"));
    seat.set_main(true);

    let mut program = Program::new(animatron_core::BlockRef::new(me.clone()), grid);

    seat.set_move_indicator(Vec3::new(0.0, 0.0, -1.0));
    program.tick("");
    assert_eq!(hip.velocity(), 0.0);

    remote.set_move_indicator(Vec3::new(0.0, 0.0, -1.0));
    let status = program.tick("");
    assert_eq!(hip.velocity(), 2.0);
    assert_eq!(lcd.text(), status);
    assert!(me.text().is_empty());
}

#[test]
fn test_main_controller_preferred() {
    let mut grid = MemoryGrid::new();
    let me = grid.add(MemoryBlock::program("PB", WALKER));
    let hip = grid.add(MemoryBlock::rotor("Hip"));
    let first = grid.add(MemoryBlock::controller("First Seat"));
    let main = grid.add(MemoryBlock::controller("Main Cockpit"));
    main.set_main(true);

    let mut program = Program::new(animatron_core::BlockRef::new(me), grid);
    first.set_move_indicator(Vec3::new(0.0, 0.0, -1.0));
    program.tick("");
    assert_eq!(hip.velocity(), 0.0);

    main.set_move_indicator(Vec3::new(0.0, 0.0, -1.0));
    program.tick("");
    assert_eq!(hip.velocity(), 2.0);
    let legs = program
        .sequencer()
        .and_then(|sequencer| sequencer.progress().get("legs"))
        .map(|progress| progress.active_step);
    assert_eq!(legs, Some(Some(0)));
}

#[test]
fn test_failed_setup_reports_on_configured_surface() {
    let config = "\
[animation]
surface=Status LCD

[legs.walk]
steps=Move;Block;Hip;90
";
    let mut grid = MemoryGrid::new();
    let me = grid.add(MemoryBlock::program("PB", config));
    let lcd = grid.add(MemoryBlock::surface("Status LCD"));

    let mut program = Program::new(animatron_core::BlockRef::new(me.clone()), grid);
    assert!(program.setup_error().is_some());
    let status = program.tick("");
    assert!(status.contains("Setup failed: step requires 7 arguments"));
    assert_eq!(lcd.text(), status);
    assert!(me.text().is_empty());
}

#[test]
fn test_unresolved_lock_moves_on() {
    let config = "\
[legs.park]
triggers=ARGUMENT_park
steps=
|Lock;Group;No Such Group;true;Wait
|Toggle;Block;Beacon;false
";
    let mut rig = rig(config);
    let beacon = rig.program.directory().get("Beacon").unwrap();

    rig.program.tick("park");
    assert_eq!(step_of(&rig, "legs"), Some(0));
    rig.program.tick("");
    assert_eq!(step_of(&rig, "legs"), Some(1));
    assert!(!beacon.enabled());
}

#[test]
fn test_recording_keeps_comments() {
    let config = "\
; walker rig, keep legs in sync
[animation]
# tuned for the big seat
controllerDeadzonePercentage=25

[lamp.on]
triggers=ARGUMENT_on
steps=Toggle;Block;Hazard Light;true
";
    let mut rig = rig(config);
    rig.program.tick("RECORD;lamp;off");
    rig.program
        .directory()
        .get("Hazard Light")
        .unwrap()
        .set_enabled(false);
    rig.program.tick("RECORD_STEPS");
    rig.program.tick("RECORDING_DONE");

    let data = rig.me.custom_data();
    assert!(data.starts_with("; walker rig, keep legs in sync\n"));
    assert!(data.contains("[animation]\n# tuned for the big seat\ncontrollerDeadzonePercentage=25\n"));
    assert!(data.contains("[lamp.off]\nsteps=Toggle;Block;Hazard Light;false;Wait\n"));
    assert!(rig.program.setup_error().is_none());
    assert_eq!(
        rig.program
            .sequencer()
            .and_then(|sequencer| sequencer.animation().segment("lamp"))
            .map(|segment| segment.mode_count()),
        Some(2)
    );
}
