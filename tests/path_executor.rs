mod common;

use commission_bot::config::PathConfig;
use commission_bot::error::PathError;
use commission_bot::pathfinder::{find_path, Goal, PathExecutor, PathSegment};
use common::*;
use glam::IVec3;

fn line(from: i32, to: i32) -> PathSegment {
    let path: Vec<IVec3> = (from..=to).map(|z| IVec3::new(0, 64, z)).collect();
    PathSegment::new(path, Goal::Block(IVec3::new(0, 64, to))).unwrap()
}

#[test]
fn discontinuous_segment_fails_the_path() {
    let mut executor = PathExecutor::new(PathConfig::default());
    executor.queue_segment(line(0, 3)).unwrap();
    assert!(executor.is_enabled());

    let result = executor.queue_segment(line(5, 8));
    assert_eq!(
        result,
        Err(PathError::DiscontinuousSegment {
            start: IVec3::new(0, 64, 5),
            previous_goal: IVec3::new(0, 64, 3),
        })
    );
    assert!(executor.failed());
    assert!(!executor.is_enabled());
}

#[test]
fn stuck_actor_fails_after_timeout() {
    let mut harness = Harness::new(commission_bot::config::Config::default(), flat_world());
    harness.core.services_mut().path.queue_segment(line(0, 4)).unwrap();

    harness.run_for(1_000);
    assert!(harness.core.services().path.is_enabled());
    assert!(!harness.core.services().path.failed());

    harness.run_for(100);
    assert!(harness.core.services().path.failed());
    assert!(!harness.core.services().path.succeeded());
    assert!(!harness.world.is_pressed(commission_bot::world::Control::Forward));
}

#[test]
fn walks_a_straight_line() {
    let mut world = flat_world();
    world.simulate_movement = true;
    let mut harness = Harness::new(commission_bot::config::Config::default(), world);
    harness.core.services_mut().path.queue_segment(line(0, 3)).unwrap();
    harness.core.services_mut().path.queue_segment(line(3, 6)).unwrap();

    let done = harness.run_until(5_000, |harness| !harness.core.services().path.is_enabled());
    assert!(done);
    assert!(harness.core.services().path.succeeded());
    assert_eq!(harness.world.position.floor().as_ivec3(), IVec3::new(0, 64, 6));
}

#[test]
fn planner_steps_around_a_wall() {
    let mut world = flat_world();
    for x in -2..=2 {
        for y in 64..=65 {
            world.set_block(IVec3::new(x, y, 2), commission_bot::world::BlockState::solid(1));
        }
    }
    let segment = find_path(&world, IVec3::new(0, 64, 0), IVec3::new(0, 64, 4), 5_000).unwrap();
    assert_eq!(segment.start, IVec3::new(0, 64, 0));
    assert_eq!(segment.goal.position(), IVec3::new(0, 64, 4));
    assert!(segment.path.iter().all(|position| position.z != 2 || position.x.abs() > 2));
}

#[test]
fn rejected_segment_does_not_leak_the_stuck_timer() {
    let mut harness = Harness::new(commission_bot::config::Config::default(), flat_world());
    harness.core.services_mut().path.queue_segment(line(0, 4)).unwrap();
    harness.step();

    assert!(harness.core.services_mut().path.queue_segment(line(6, 8)).is_err());
    assert!(harness.core.services().path.failed());
    harness.run_for(5_000);

    harness.core.services_mut().path.queue_segment(line(0, 2)).unwrap();
    harness.step();
    assert!(harness.core.services().path.is_enabled());
    assert!(!harness.core.services().path.failed());
}
