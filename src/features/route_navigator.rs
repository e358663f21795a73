//! Follows a route of graph waypoints: walks `Move` legs through the path
//! executor and uses the teleport item for `Aotv`/`Etherwarp` legs.

use super::hold_item;
use crate::clock::Millis;
use crate::config::NavigatorConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Failsafe, Feature, FeatureBase};
use crate::graph::{TransportMethod, Waypoint};
use crate::pathfinder::find_path;
use crate::rotation::{RotationRequest, Target};
use crate::world::map::block_center;
use crate::world::{Command, Control, WorldView};
use glam::{DVec3, IVec3};
use log::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorError {
    #[error("the route is empty")]
    NoRoute,

    #[error("could not walk to the next waypoint")]
    PathFailed,

    #[error("the teleport item is not in the inventory")]
    NoTeleportItem,

    #[error("teleporting to the next waypoint failed")]
    TeleportFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavigatorState {
    NextLeg,
    /// Walking until the waypoint before `until` is reached.
    Walking { until: usize },
    Aiming,
    Teleporting,
}

pub struct RouteNavigator {
    base: FeatureBase,
    config: NavigatorConfig,
    state: NavigatorState,
    route: Vec<Waypoint>,
    index: usize,
    attempts: u32,
    sneaking: bool,
    succeeded: bool,
    error: Option<NavigatorError>,
}

fn arrival_point(position: IVec3) -> DVec3 {
    let center = block_center(position);
    DVec3::new(center.x, position.y as f64, center.z)
}

impl RouteNavigator {
    pub const NAME: &'static str = "RouteNavigator";

    pub fn new(config: NavigatorConfig) -> RouteNavigator {
        RouteNavigator {
            base: FeatureBase::new(Self::NAME).ignoring(&[Failsafe::Teleport, Failsafe::Rotation]),
            config,
            state: NavigatorState::NextLeg,
            route: Vec::new(),
            index: 0,
            attempts: 0,
            sneaking: false,
            succeeded: false,
            error: None,
        }
    }

    pub fn start(&mut self, route: Vec<Waypoint>, world: &dyn WorldView) -> Result<(), NavigatorError> {
        self.error = None;
        self.succeeded = false;
        if route.is_empty() {
            return Err(self.refuse(NavigatorError::NoRoute));
        }
        let teleports = route.iter().any(|waypoint| waypoint.action != TransportMethod::Move);
        if teleports && world.inventory().find_item(&self.config.teleport_item).is_none() {
            return Err(self.refuse(NavigatorError::NoTeleportItem));
        }
        info!("Following a route of {} waypoints", route.len());
        self.route = route;
        self.index = 0;
        self.attempts = 0;
        self.state = NavigatorState::NextLeg;
        self.base.enable();
        Ok(())
    }

    fn refuse(&mut self, error: NavigatorError) -> NavigatorError {
        error!("Cannot navigate: {}", error);
        self.error = Some(error);
        error
    }

    pub fn error(&self) -> Option<NavigatorError> {
        self.error
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Index of the waypoint currently travelled to.
    pub fn index(&self) -> usize {
        self.index
    }

    fn fail(&mut self, error: NavigatorError, services: &mut Services) {
        error!("Navigation stopped at waypoint {}: {}", self.index, error);
        self.stop(services);
        self.error = Some(error);
    }

    fn release_sneak(&mut self, services: &mut Services) {
        if self.sneaking {
            self.sneaking = false;
            services.push(Command::SetControl {
                control: Control::Sneak,
                pressed: false,
            });
        }
    }

    fn next_leg(&mut self, ctx: &mut TickContext) -> NavigatorState {
        let waypoint = match self.route.get(self.index) {
            Some(waypoint) => *waypoint,
            None => {
                info!("Route complete");
                self.stop(ctx.services);
                self.succeeded = true;
                return NavigatorState::NextLeg;
            }
        };
        if waypoint.action != TransportMethod::Move {
            return NavigatorState::Aiming;
        }

        // Chain every consecutive walking waypoint into one continuous path.
        let world = ctx.world;
        let iterations = ctx.services.path.config().planner_iterations;
        ctx.services.path.stop();
        let mut from = world.footing();
        let mut until = self.index;
        while let Some(waypoint) = self.route.get(until).filter(|waypoint| waypoint.action == TransportMethod::Move) {
            if waypoint.position != from {
                let segment = match find_path(world, from, waypoint.position, iterations) {
                    Some(segment) => segment,
                    None => {
                        warn!("No walkable path from {} to waypoint {}", from, waypoint.id);
                        self.fail(NavigatorError::PathFailed, ctx.services);
                        return NavigatorState::NextLeg;
                    }
                };
                if let Err(e) = ctx.services.path.queue_segment(segment) {
                    warn!("{}", e);
                    self.fail(NavigatorError::PathFailed, ctx.services);
                    return NavigatorState::NextLeg;
                }
            }
            from = waypoint.position;
            until += 1;
        }
        if !ctx.services.path.is_enabled() {
            // Already standing on every waypoint of the leg.
            self.index = until;
            return NavigatorState::NextLeg;
        }
        debug!("Walking to waypoints {}..{}", self.index, until);
        NavigatorState::Walking { until }
    }

    fn aiming(&mut self, ctx: &mut TickContext) -> NavigatorState {
        let waypoint = match self.route.get(self.index) {
            Some(waypoint) => *waypoint,
            None => return NavigatorState::NextLeg,
        };
        if !hold_item(ctx.world, &mut ctx.services.commands, &self.config.teleport_item) {
            self.fail(NavigatorError::NoTeleportItem, ctx.services);
            return NavigatorState::NextLeg;
        }
        let target = match waypoint.action {
            TransportMethod::Etherwarp => {
                if !self.sneaking {
                    self.sneaking = true;
                    ctx.push(Command::SetControl {
                        control: Control::Sneak,
                        pressed: true,
                    });
                }
                Target::Block(waypoint.position - IVec3::Y)
            }
            _ => Target::Position(block_center(waypoint.position)),
        };
        ctx.services
            .rotation
            .rotate_now(RotationRequest::new(target, self.config.rotation_time).priority(2));
        self.base.timer.reset();
        NavigatorState::Teleporting
    }

    fn teleporting(&mut self, ctx: &mut TickContext) -> NavigatorState {
        let waypoint = match self.route.get(self.index) {
            Some(waypoint) => *waypoint,
            None => return NavigatorState::NextLeg,
        };
        if ctx.world.position().distance(arrival_point(waypoint.position)) <= self.config.arrive_distance {
            debug!("Teleported to waypoint {}", waypoint.id);
            self.release_sneak(ctx.services);
            self.base.timer.reset();
            self.attempts = 0;
            self.index += 1;
            return NavigatorState::NextLeg;
        }
        if !self.base.timer.is_scheduled() {
            if !ctx.services.rotation.is_rotating() {
                ctx.push(Command::UseItem);
                self.base.timer.schedule(ctx.now, self.config.teleport_timeout);
            }
            return NavigatorState::Teleporting;
        }
        if self.base.timer.passed(ctx.now) {
            self.attempts += 1;
            self.base.timer.reset();
            if self.attempts >= self.config.max_teleport_attempts {
                self.fail(NavigatorError::TeleportFailed, ctx.services);
            } else {
                warn!("Teleport to waypoint {} failed ({}/{})", waypoint.id, self.attempts, self.config.max_teleport_attempts);
                return NavigatorState::Aiming;
            }
        }
        NavigatorState::Teleporting
    }
}

impl Feature for RouteNavigator {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        let next = match self.state {
            NavigatorState::NextLeg => self.next_leg(ctx),
            NavigatorState::Walking { until } => {
                let path = &ctx.services.path;
                if path.is_enabled() {
                    NavigatorState::Walking { until }
                } else if path.succeeded() {
                    self.index = until;
                    NavigatorState::NextLeg
                } else {
                    self.fail(NavigatorError::PathFailed, ctx.services);
                    NavigatorState::NextLeg
                }
            }
            NavigatorState::Aiming => self.aiming(ctx),
            NavigatorState::Teleporting => self.teleporting(ctx),
        };
        if self.base.is_enabled() {
            self.state = next;
        }
        Ok(())
    }

    fn stop(&mut self, services: &mut Services) {
        if let NavigatorState::Walking { .. } = self.state {
            services.path.stop();
        }
        self.release_sneak(services);
        self.base.disable();
        self.state = NavigatorState::NextLeg;
        self.attempts = 0;
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    /// Walking is re-planned from the current waypoint on resume.
    fn pause(&mut self, now: Millis, services: &mut Services) {
        services.path.stop();
        self.release_sneak(services);
        self.state = NavigatorState::NextLeg;
        self.base.timer.reset();
        self.base.pause(now);
    }

    crate::impl_feature_any!();
}
