use super::PathSegment;
use crate::angle::{rotation_to, yaw_difference};
use crate::clock::{Clock, Millis};
use crate::config::PathConfig;
use crate::error::PathError;
use crate::rotation::{RotationController, RotationRequest, Target};
use crate::world::map::{block_center, horizontal_distance};
use crate::world::{Command, Control, WorldQueries, WorldView};
use glam::{DVec3, IVec3};
use log::*;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug)]
struct LoadedSegment {
    segment: PathSegment,
    index_of: HashMap<IVec3, usize>,
    target_index: usize,
}

impl LoadedSegment {
    fn new(segment: PathSegment) -> LoadedSegment {
        let index_of = segment
            .path
            .iter()
            .enumerate()
            .map(|(idx, position)| (*position, idx))
            .collect();
        LoadedSegment {
            segment,
            index_of,
            target_index: 0,
        }
    }

    fn len(&self) -> usize {
        self.segment.path.len()
    }

    fn point(&self, idx: usize) -> Option<DVec3> {
        self.segment.path.get(idx).map(|position| walk_point(*position))
    }
}

/// Center of the floor of a footing block.
fn walk_point(position: IVec3) -> DVec3 {
    let center = block_center(position);
    DVec3::new(center.x, position.y as f64, center.z)
}

/// Walks queued path segments one tick at a time: presses movement keys,
/// requests rotations toward the upcoming waypoints, jumps over one block
/// steps and fails when the actor stops moving.
pub struct PathExecutor {
    config: PathConfig,
    queue: VecDeque<PathSegment>,
    current: Option<LoadedSegment>,
    last_goal: Option<IVec3>,
    stuck: Clock,
    pressed: BTreeMap<Control, bool>,
    enabled: bool,
    failed: bool,
    succeeded: bool,
    error: Option<PathError>,
}

impl PathExecutor {
    pub fn new(config: PathConfig) -> PathExecutor {
        PathExecutor {
            config,
            queue: VecDeque::new(),
            current: None,
            last_goal: None,
            stuck: Clock::new(),
            pressed: BTreeMap::new(),
            enabled: false,
            failed: false,
            succeeded: false,
            error: None,
        }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Appends a segment. Its start must be the goal of the previously queued
    /// segment; otherwise the whole path fails.
    pub fn queue_segment(&mut self, segment: PathSegment) -> Result<(), PathError> {
        if segment.path.is_empty() {
            return Err(self.fail_with(PathError::EmptySegment));
        }
        if let Some(previous_goal) = self.last_goal {
            if segment.start != previous_goal {
                error!("Refusing discontinuous path segment starting at {}", segment.start);
                return Err(self.fail_with(PathError::DiscontinuousSegment {
                    start: segment.start,
                    previous_goal,
                }));
            }
        }
        if !self.enabled {
            self.failed = false;
            self.succeeded = false;
            self.error = None;
            self.stuck.reset();
            self.enabled = true;
        }
        self.last_goal = Some(segment.goal.position());
        self.queue.push_back(segment);
        Ok(())
    }

    fn fail_with(&mut self, error: PathError) -> PathError {
        self.failed = true;
        self.succeeded = false;
        self.enabled = false;
        self.error = Some(error.clone());
        self.queue.clear();
        self.current = None;
        self.last_goal = None;
        self.stuck.reset();
        error
    }

    /// Cancels the path and clears all progress. Keys are released on the next tick.
    pub fn stop(&mut self) {
        self.enabled = false;
        self.queue.clear();
        self.current = None;
        self.last_goal = None;
        self.stuck.reset();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error(&self) -> Option<&PathError> {
        self.error.as_ref()
    }

    /// Index of the waypoint currently walked toward in the loaded segment.
    pub fn target_index(&self) -> Option<usize> {
        self.current.as_ref().map(|loaded| loaded.target_index)
    }

    fn set_control(&mut self, control: Control, pressed: bool, commands: &mut Vec<Command>) {
        if self.pressed.get(&control).copied().unwrap_or(false) != pressed {
            self.pressed.insert(control, pressed);
            commands.push(Command::SetControl { control, pressed });
        }
    }

    fn release_controls(&mut self, commands: &mut Vec<Command>) {
        for control in [Control::Forward, Control::Sprint, Control::Jump] {
            self.set_control(control, false, commands);
        }
    }

    fn finish(&mut self, succeeded: bool, commands: &mut Vec<Command>) {
        self.enabled = false;
        self.succeeded = succeeded;
        self.failed = !succeeded;
        self.current = None;
        self.queue.clear();
        self.last_goal = None;
        self.stuck.reset();
        self.release_controls(commands);
    }

    pub fn on_tick(&mut self, now: Millis, world: &dyn WorldView, rotation: &mut RotationController, commands: &mut Vec<Command>) {
        if !self.enabled {
            self.release_controls(commands);
            return;
        }

        let position = world.position();
        let footing = world.footing();

        // Stuck detection
        let velocity = world.velocity();
        let speed = (velocity.x * velocity.x + velocity.z * velocity.z).sqrt();
        if speed < self.config.stuck_speed {
            if !self.stuck.is_scheduled() {
                self.stuck.schedule(now, self.config.stuck_timeout);
            } else if self.stuck.passed(now) {
                warn!("Stuck at {} for {}ms, path failed", footing, self.config.stuck_timeout);
                self.finish(false, commands);
                return;
            }
        } else {
            self.stuck.reset();
        }

        loop {
            if self.current.is_none() {
                match self.queue.pop_front() {
                    Some(segment) => {
                        debug!("Loaded path segment of {} positions toward {}", segment.path.len(), segment.goal.position());
                        self.current = Some(LoadedSegment::new(segment));
                    }
                    None => {
                        debug!("Path complete at {}", footing);
                        self.finish(true, commands);
                        return;
                    }
                }
            }
            let loaded = match self.current.as_mut() {
                Some(loaded) => loaded,
                None => return,
            };

            if let Some(idx) = loaded.index_of.get(&footing) {
                if *idx >= loaded.target_index {
                    loaded.target_index = idx + 1;
                }
            }

            // Walked past the target: the following waypoint is closer than
            // the target is to it.
            if let (Some(target), Some(next)) = (loaded.point(loaded.target_index), loaded.point(loaded.target_index + 1)) {
                if horizontal_distance(position, next) < horizontal_distance(target, next) && (target.y - position.y).abs() < 1.0 {
                    loaded.target_index += 1;
                }
            }

            if loaded.target_index >= loaded.len() {
                if !loaded.segment.goal.is_end(footing) && loaded.len() > 1 {
                    // Close enough to the last position but not in it yet.
                    let last = loaded.len() - 1;
                    if horizontal_distance(position, walk_point(loaded.segment.path[last])) > 0.35 {
                        loaded.target_index = last;
                        break;
                    }
                }
                self.current = None;
                continue;
            }
            break;
        }

        let (target, aim, remaining) = match self.current.as_ref() {
            Some(loaded) => {
                let target = loaded.point(loaded.target_index).unwrap_or(position);
                let aim = (loaded.target_index..loaded.len())
                    .filter_map(|idx| loaded.point(idx))
                    .find(|point| horizontal_distance(position, *point) >= self.config.look_ahead)
                    .unwrap_or_else(|| loaded.point(loaded.len() - 1).unwrap_or(target));
                (target, aim, horizontal_distance(position, target))
            }
            None => return,
        };

        let aim = if horizontal_distance(position, aim) < 0.5 { target } else { aim };
        let wanted_yaw = rotation_to(position, aim).yaw;
        let error = yaw_difference(world.facing().yaw, wanted_yaw);
        if error > self.config.aim_tolerance && !rotation.is_rotating() {
            let span = (self.config.max_rotation_time - self.config.min_rotation_time) as f64;
            let scale = (remaining / self.config.look_ahead).clamp(0.0, 1.0);
            let duration = self.config.min_rotation_time + (span * scale) as Millis;
            let look_at = DVec3::new(aim.x, position.y + world.eye_height(), aim.z);
            let randomness = rotation.default_randomness();
            rotation.rotate_to(RotationRequest::new(Target::Position(look_at), duration).randomness(randomness));
        }

        // An obstruction exactly one block tall in front of the feet.
        let direction = (target - position) * DVec3::new(1.0, 0.0, 1.0);
        let step = if direction.length() > 1e-6 { direction.normalize() } else { DVec3::ZERO };
        let ahead = position + step;
        let jump = step != DVec3::ZERO
            && !world.can_walk_between(position, ahead)
            && world.can_walk_between(position + DVec3::Y, ahead + DVec3::Y);

        let sprint = error < self.config.sprint_tolerance && !jump;

        self.set_control(Control::Forward, true, commands);
        self.set_control(Control::Sprint, sprint, commands);
        self.set_control(Control::Jump, jump, commands);
    }
}
