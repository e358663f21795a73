mod common;

use commission_bot::angle::{needed_change, normalize_angle, Angle};
use commission_bot::clock::Clock;
use commission_bot::config::RotationConfig;
use commission_bot::rotation::{RotationController, RotationRequest, Target};
use commission_bot::world::{Command, WorldView};
use common::*;

fn looks(commands: &[Command]) -> Vec<Angle> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::Look(angle) => Some(*angle),
            _ => None,
        })
        .collect()
}

#[test]
fn clock_pause_shifts_the_deadline() {
    let mut clock = Clock::new();
    assert!(!clock.passed(1_000));
    clock.schedule(0, 1_000);
    clock.pause(400);
    assert!(!clock.passed(5_000));
    clock.resume(900);
    assert!(!clock.passed(1_400));
    assert!(clock.passed(1_500));
    clock.reset();
    assert!(!clock.passed(10_000));
}

#[test]
fn shortest_turn_wraps_around() {
    let change = needed_change(Angle::new(350.0, 0.0), Angle::new(10.0, 20.0));
    assert!((change.yaw - 20.0).abs() < 1e-4);
    assert_eq!(change.pitch, 20.0);
    assert_eq!(normalize_angle(-180.0), 180.0);
    assert_eq!(normalize_angle(f32::NAN), 0.0);
}

#[test]
fn timed_rotation_lands_exactly() {
    let mut world = flat_world();
    let mut rotation = RotationController::with_seed(RotationConfig::default(), 11);
    rotation.rotate_to(RotationRequest::new(Target::Angle(Angle::new(90.0, 0.0)), 1_000));

    let mut yaws = Vec::new();
    let mut now = 0;
    while now <= 1_000 {
        let mut commands = Vec::new();
        rotation.on_tick(now, &world, &mut commands);
        world.apply(now, &commands);
        yaws.extend(looks(&commands).iter().map(|angle| angle.yaw));
        now += 50;
    }

    assert_eq!(yaws.first(), Some(&0.0));
    assert_eq!(yaws.last(), Some(&90.0));
    assert!(yaws.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(world.facing().yaw, 90.0);
    assert!(!rotation.is_rotating());
}

#[test]
fn following_pre_empts_timed_rotations() {
    let mut world = flat_world();
    let mut rotation = RotationController::with_seed(RotationConfig::default(), 11);
    rotation.rotate_to(RotationRequest::new(Target::Angle(Angle::new(-90.0, 0.0)), 500));
    rotation.start_following(Target::Angle(Angle::new(100.0, 0.0)));

    let mut commands = Vec::new();
    rotation.on_tick(0, &world, &mut commands);
    world.apply(0, &commands);
    assert!((world.facing().yaw - 10.0).abs() < 1e-3);

    rotation.stop_following();
    assert!(rotation.is_rotating());
    rotation.stop();
    assert!(!rotation.is_busy());
}
