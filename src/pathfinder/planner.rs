//! Block-level walking planner. Produces footing positions a [`PathSegment`]
//! can be built from.

use super::{Goal, PathSegment};
use crate::world::{WorldQueries, WorldView};
use glam::IVec3;
use log::*;
use std::collections::HashMap;

type Accesses = Vec<(IVec3, usize)>;
type AccessibleBlocks = HashMap<IVec3, (IVec3, usize)>;

const HORIZONTAL_NEIGHBORS: [IVec3; 4] = [IVec3::X, IVec3::NEG_X, IVec3::Z, IVec3::NEG_Z];

fn check_direct_neighbor(world: &dyn WorldView, feet: IVec3) -> bool {
    world.is_standable(feet)
}

/// One block up: the block in front becomes the floor and the actor needs
/// head room above its current position to jump.
fn check_uphill_neighbor(world: &dyn WorldView, from: IVec3, feet: IVec3) -> bool {
    world.is_standable(feet) && world.is_passable(from + IVec3::Y * 2)
}

fn find_accessible_neighbors(
    world: &dyn WorldView,
    from: IVec3,
    distance: usize,
    accessible_blocks: &mut AccessibleBlocks,
    accesses: &mut Accesses,
) {
    let mut add = |feet: IVec3| {
        if let Some((_, previous_distance)) = accessible_blocks.get(&feet) {
            if *previous_distance <= distance + 1 {
                return;
            }
        }
        accessible_blocks.insert(feet, (from, distance + 1));
        accesses.push((feet, distance + 1));
    };

    for offset in HORIZONTAL_NEIGHBORS {
        let side = from + offset;
        if check_direct_neighbor(world, side) {
            add(side);
            continue;
        }
        if check_uphill_neighbor(world, from, side + IVec3::Y) {
            add(side + IVec3::Y);
            continue;
        }
        // Falls of up to three blocks.
        for drop in 1..=3 {
            let feet = side - IVec3::Y * drop;
            if (0..=drop + 1).any(|y| !world.is_passable(side - IVec3::Y * drop + IVec3::Y * y)) {
                break;
            }
            if world.is_standable(feet) {
                add(feet);
                break;
            }
        }
    }
}

/// Best-first search from `start` to `destination` over standable blocks.
/// Returns `None` when the destination was not reached within `max_iterations`.
pub fn find_path(world: &dyn WorldView, start: IVec3, destination: IVec3, max_iterations: usize) -> Option<PathSegment> {
    let mut accessible_blocks = AccessibleBlocks::new();
    let mut accesses = Accesses::new();

    accessible_blocks.insert(start, (start, 0));
    accesses.push((start, 0));

    let mut counter = 0;
    while counter < max_iterations && !accessible_blocks.contains_key(&destination) {
        let (position, distance) = match accesses.pop() {
            Some(access) => access,
            None => break,
        };
        find_accessible_neighbors(world, position, distance, &mut accessible_blocks, &mut accesses);

        // Keep the most promising candidate at the end of the stack.
        accesses.sort_by_key(|(position, distance)| {
            let remaining = (*position - destination).as_dvec3().length();
            -((*distance as f64) + remaining * 2.0) as i64
        });
        counter += 1;
    }

    trace!(
        "There is at least {} accessible blocks (found in {} iterations)",
        accessible_blocks.len(),
        counter
    );

    let mut path = Vec::new();
    let mut current = destination;
    accessible_blocks.get(&destination)?;
    loop {
        path.push(current);
        if current == start {
            break;
        }
        current = accessible_blocks.get(&current)?.0;
    }
    path.reverse();

    PathSegment::new(path, Goal::Block(destination)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BlockState, SimWorld};
    use glam::DVec3;

    #[test]
    fn walks_and_climbs_one_block() {
        let mut world = SimWorld::new(DVec3::new(0.5, 1.0, 0.5));
        world.fill_floor(0, (-2, -2), (8, 2), BlockState::solid(1));
        world.set_block(IVec3::new(4, 1, 0), BlockState::solid(1));
        world.fill_floor(1, (5, -2), (8, 2), BlockState::solid(1));

        let segment = find_path(&world, IVec3::new(0, 1, 0), IVec3::new(6, 2, 0), 5_000).unwrap();
        assert_eq!(segment.start, IVec3::new(0, 1, 0));
        assert_eq!(segment.path.last(), Some(&IVec3::new(6, 2, 0)));
        for pair in segment.path.windows(2) {
            let step = pair[1] - pair[0];
            assert_eq!(step.x.abs() + step.z.abs(), 1);
            assert!(step.y <= 1);
        }
    }

    #[test]
    fn unreachable_destination() {
        let mut world = SimWorld::new(DVec3::new(0.5, 1.0, 0.5));
        world.fill_floor(0, (-2, -2), (2, 2), BlockState::solid(1));
        assert!(find_path(&world, IVec3::new(0, 1, 0), IVec3::new(20, 1, 0), 500).is_none());
    }
}
