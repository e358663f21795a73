//! Aim controller: timed eased rotations queued FIFO, and a continuous
//! follow mode that pre-empts them.

use crate::angle::{clamp_pitch, needed_change, rotation_to, Angle};
use crate::clock::{Clock, Millis};
use crate::config::RotationConfig;
use crate::world::map::block_center;
use crate::world::{find_entity, Command, EntityId, WorldView};
use glam::{DVec3, IVec3};
use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Something to aim at. Resolved again on every tick since entities move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Position(DVec3),
    Entity { id: EntityId, eye_offset: f64 },
    Block(IVec3),
    Angle(Angle),
}

impl Target {
    /// Angle to face the target from the actor's eyes, or `None` if it vanished.
    pub fn resolve(&self, world: &dyn WorldView) -> Option<Angle> {
        let eye = world.eye_position();
        match self {
            Target::Position(position) => Some(rotation_to(eye, *position)),
            Target::Entity { id, eye_offset } => {
                let entity = find_entity(world.entities(), *id)?;
                Some(rotation_to(eye, entity.eye_position(*eye_offset)))
            }
            Target::Block(position) => Some(rotation_to(eye, block_center(*position))),
            Target::Angle(angle) => Some(*angle),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationRequest {
    pub target: Target,
    pub duration: Millis,
    pub smooth: bool,
    /// Scales the per-tick jitter; 0 disables it.
    pub randomness: f32,
    pub priority: u8,
}

impl RotationRequest {
    pub fn new(target: Target, duration: Millis) -> RotationRequest {
        RotationRequest {
            target,
            duration,
            smooth: true,
            randomness: 0.0,
            priority: 0,
        }
    }

    pub fn smooth(mut self, smooth: bool) -> RotationRequest {
        self.smooth = smooth;
        self
    }

    pub fn randomness(mut self, randomness: f32) -> RotationRequest {
        self.randomness = randomness;
        self
    }

    pub fn priority(mut self, priority: u8) -> RotationRequest {
        self.priority = priority;
        self
    }
}

#[derive(Debug)]
struct ActiveRotation {
    request: RotationRequest,
    start: Angle,
    clock: Clock,
}

pub struct RotationController {
    config: RotationConfig,
    queue: VecDeque<RotationRequest>,
    active: Option<ActiveRotation>,
    following: Option<Target>,
    rng: StdRng,
}

/// Cubic ease-in-out over `t` in [0, 1].
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

impl RotationController {
    pub fn new(config: RotationConfig, rng: StdRng) -> RotationController {
        RotationController {
            config,
            queue: VecDeque::new(),
            active: None,
            following: None,
            rng,
        }
    }

    pub fn with_seed(config: RotationConfig, seed: u64) -> RotationController {
        RotationController::new(config, StdRng::seed_from_u64(seed))
    }

    pub fn default_randomness(&self) -> f32 {
        self.config.default_randomness
    }

    /// Queues a timed rotation. A request with a higher priority than the
    /// active one replaces it.
    pub fn rotate_to(&mut self, request: RotationRequest) {
        if let Some(active) = &self.active {
            if request.priority > active.request.priority {
                trace!("Rotation pre-empted by priority {}", request.priority);
                self.active = None;
            }
        }
        let index = self
            .queue
            .iter()
            .position(|queued| queued.priority < request.priority)
            .unwrap_or(self.queue.len());
        self.queue.insert(index, request);
    }

    /// Drops every pending rotation and starts this one on the next tick.
    pub fn rotate_now(&mut self, request: RotationRequest) {
        self.queue.clear();
        self.active = None;
        self.queue.push_back(request);
    }

    pub fn start_following(&mut self, target: Target) {
        self.following = Some(target);
    }

    pub fn stop_following(&mut self) {
        self.following = None;
    }

    pub fn stop(&mut self) {
        self.queue.clear();
        self.active = None;
        self.following = None;
    }

    pub fn is_rotating(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    pub fn is_following(&self) -> bool {
        self.following.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.is_rotating() || self.is_following()
    }

    pub fn on_tick(&mut self, now: Millis, world: &dyn WorldView, commands: &mut Vec<Command>) {
        if let Some(target) = self.following {
            match target.resolve(world) {
                Some(goal) => {
                    let current = world.facing();
                    let change = needed_change(current, goal);
                    let next = current + change * self.config.follow_fraction;
                    commands.push(Command::Look(Angle::new(next.yaw, clamp_pitch(next.pitch))));
                }
                None => {
                    debug!("Follow target lost");
                    self.following = None;
                }
            }
            return;
        }

        if self.active.is_none() {
            if let Some(request) = self.queue.pop_front() {
                let mut clock = Clock::new();
                clock.schedule(now, request.duration);
                self.active = Some(ActiveRotation {
                    request,
                    start: world.facing(),
                    clock,
                });
            }
        }

        let active = match &self.active {
            Some(active) => active,
            None => return,
        };
        let goal = match active.request.target.resolve(world) {
            Some(goal) => goal,
            None => {
                debug!("Rotation target lost");
                self.active = None;
                return;
            }
        };
        let change = needed_change(active.start, goal);

        if active.clock.passed(now) {
            let end = active.start + change;
            commands.push(Command::Look(Angle::new(end.yaw, clamp_pitch(end.pitch))));
            self.active = None;
            return;
        }

        let t = active.clock.elapsed(now) as f32 / active.request.duration.max(1) as f32;
        let progress = if active.request.smooth { ease_in_out_cubic(t) } else { t };
        let mut angle = active.start + change * progress;
        if active.request.smooth && active.request.randomness > 0.0 {
            let spread = self.config.jitter_degrees * active.request.randomness;
            angle = angle + Angle::new(self.rng.gen_range(-spread..=spread), self.rng.gen_range(-spread..=spread) * 0.5);
        }
        commands.push(Command::Look(Angle::new(angle.yaw, clamp_pitch(angle.pitch))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn higher_priority_goes_first() {
        let mut controller = RotationController::with_seed(RotationConfig::default(), 1);
        controller.rotate_to(RotationRequest::new(Target::Angle(Angle::new(10.0, 0.0)), 100));
        controller.rotate_to(RotationRequest::new(Target::Angle(Angle::new(20.0, 0.0)), 100).priority(2));
        assert_eq!(controller.queue[0].priority, 2);
        controller.stop();
        assert!(!controller.is_busy());
    }
}
