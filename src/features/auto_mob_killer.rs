use super::hold_item;
use crate::clock::{Clock, Millis};
use crate::config::MobKillerConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Failsafe, Feature, FeatureBase};
use crate::pathfinder::find_path;
use crate::rotation::Target;
use crate::world::{entities_matching, find_entity, Command, EntityId, EntityKind, WorldView};
use glam::IVec3;
use log::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobKillerError {
    #[error("no mob to kill was found")]
    NoEntities,

    #[error("the weapon is not in the inventory")]
    NoWeapon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MobKillerParams {
    pub mobs: Vec<String>,
    pub weapon: String,
}

impl MobKillerParams {
    pub fn new(mobs: &[&str], weapon: &str) -> MobKillerParams {
        MobKillerParams {
            mobs: mobs.iter().map(|mob| mob.to_string()).collect(),
            weapon: weapon.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KillerState {
    Searching,
    /// Walking toward a mob; `goal` is where the current path ends.
    Approaching { id: EntityId, goal: IVec3 },
    Attacking(EntityId),
}

pub struct AutoMobKiller {
    base: FeatureBase,
    config: MobKillerConfig,
    state: KillerState,
    params: MobKillerParams,
    attack_cooldown: Clock,
    kills: u32,
    error: Option<MobKillerError>,
}

impl AutoMobKiller {
    pub const NAME: &'static str = "AutoMobKiller";

    pub fn new(config: MobKillerConfig) -> AutoMobKiller {
        AutoMobKiller {
            base: FeatureBase::new(Self::NAME).ignoring(&[Failsafe::Damage, Failsafe::Knockback]),
            config,
            state: KillerState::Searching,
            params: MobKillerParams::new(&[], ""),
            attack_cooldown: Clock::new(),
            kills: 0,
            error: None,
        }
    }

    pub fn start(&mut self, params: MobKillerParams, world: &dyn WorldView) -> Result<(), MobKillerError> {
        self.error = None;
        if world.inventory().find_item(&params.weapon).is_none() {
            error!("Cannot start killing mobs: {}", MobKillerError::NoWeapon);
            self.error = Some(MobKillerError::NoWeapon);
            return Err(MobKillerError::NoWeapon);
        }
        info!("Killing {:?} with {}", params.mobs, params.weapon);
        self.params = params;
        self.state = KillerState::Searching;
        self.attack_cooldown.reset();
        self.base.enable();
        Ok(())
    }

    pub fn error(&self) -> Option<MobKillerError> {
        self.error
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn target(&self) -> Option<EntityId> {
        match self.state {
            KillerState::Searching => None,
            KillerState::Approaching { id, .. } | KillerState::Attacking(id) => Some(id),
        }
    }

    fn give_up(&mut self, id: EntityId, ctx: &mut TickContext, reason: &str) -> KillerState {
        debug!("Giving up on mob {}: {}", id, reason);
        ctx.services.queues.mobs.blacklist(id, ctx.now + self.config.blacklist_time);
        ctx.services.path.stop();
        ctx.services.rotation.stop_following();
        self.base.timer.reset();
        KillerState::Searching
    }

    fn searching(&mut self, ctx: &mut TickContext) -> KillerState {
        let world = ctx.world;
        let now = ctx.now;
        ctx.services.queues.mobs.prune(now);
        let mobs = &ctx.services.queues.mobs;
        let target = entities_matching(world.entities(), EntityKind::Mob, &self.params.mobs, world.position(), self.config.search_radius)
            .into_iter()
            .find(|mob| !mobs.is_blacklisted(mob.id, now))
            .map(|mob| mob.id);

        match target {
            Some(id) => {
                debug!("Targeting mob {}", id);
                self.base.timer.reset();
                self.base.timer.schedule(now, self.config.approach_timeout);
                KillerState::Approaching { id, goal: world.footing() }
            }
            None => {
                if !self.base.timer.is_scheduled() {
                    self.base.timer.schedule(now, self.config.search_timeout);
                } else if self.base.timer.passed(now) {
                    error!("Mob killing stopped: {}", MobKillerError::NoEntities);
                    self.stop(ctx.services);
                    self.error = Some(MobKillerError::NoEntities);
                }
                KillerState::Searching
            }
        }
    }

    fn approaching(&mut self, ctx: &mut TickContext, id: EntityId, goal: IVec3) -> KillerState {
        let world = ctx.world;
        let mob = match find_entity(world.entities(), id).filter(|mob| mob.is_alive()) {
            Some(mob) => mob,
            None => {
                ctx.services.path.stop();
                self.base.timer.reset();
                return KillerState::Searching;
            }
        };
        if self.base.timer.passed(ctx.now) {
            return self.give_up(id, ctx, "approach timed out");
        }
        if mob.position.distance(world.position()) <= self.config.attack_range {
            ctx.services.path.stop();
            ctx.services.rotation.start_following(Target::Entity {
                id,
                eye_offset: mob.height * 0.5,
            });
            self.base.timer.reset();
            self.base.timer.schedule(ctx.now, self.config.kill_timeout);
            return KillerState::Attacking(id);
        }

        let mob_footing = mob.position.floor().as_ivec3();
        if ctx.services.path.is_enabled() && (mob_footing - goal).as_dvec3().length() < 2.0 {
            return KillerState::Approaching { id, goal };
        }
        if ctx.services.path.failed() && goal == mob_footing {
            return self.give_up(id, ctx, "path failed");
        }
        ctx.services.path.stop();
        let iterations = ctx.services.path.config().planner_iterations;
        match find_path(world, world.footing(), mob_footing, iterations) {
            Some(segment) => {
                if let Err(e) = ctx.services.path.queue_segment(segment) {
                    warn!("Could not walk toward mob {}: {}", id, e);
                    return self.give_up(id, ctx, "path rejected");
                }
                KillerState::Approaching { id, goal: mob_footing }
            }
            None => self.give_up(id, ctx, "unreachable"),
        }
    }

    fn attacking(&mut self, ctx: &mut TickContext, id: EntityId) -> KillerState {
        let world = ctx.world;
        let mob = match find_entity(world.entities(), id).filter(|mob| mob.is_alive()) {
            Some(mob) => mob,
            None => {
                self.kills += 1;
                info!("Killed mob {} ({} so far)", id, self.kills);
                ctx.services.rotation.stop_following();
                self.base.timer.reset();
                return KillerState::Searching;
            }
        };
        if self.base.timer.passed(ctx.now) {
            return self.give_up(id, ctx, "kill timed out");
        }
        if mob.position.distance(world.position()) > self.config.attack_range * 1.5 {
            ctx.services.rotation.stop_following();
            self.base.timer.reset();
            self.base.timer.schedule(ctx.now, self.config.approach_timeout);
            return KillerState::Approaching { id, goal: world.footing() };
        }
        if !hold_item(world, &mut ctx.services.commands, &self.params.weapon) {
            error!("Mob killing stopped: {}", MobKillerError::NoWeapon);
            self.stop(ctx.services);
            self.error = Some(MobKillerError::NoWeapon);
            return KillerState::Searching;
        }
        if !self.attack_cooldown.is_scheduled() || self.attack_cooldown.passed(ctx.now) {
            ctx.push(Command::Attack(id));
            self.attack_cooldown.schedule(ctx.now, self.config.attack_interval);
        }
        KillerState::Attacking(id)
    }
}

impl Feature for AutoMobKiller {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        let next = match self.state {
            KillerState::Searching => self.searching(ctx),
            KillerState::Approaching { id, goal } => self.approaching(ctx, id, goal),
            KillerState::Attacking(id) => self.attacking(ctx, id),
        };
        if self.base.is_enabled() {
            self.state = next;
        }
        Ok(())
    }

    fn stop(&mut self, services: &mut Services) {
        if self.state != KillerState::Searching {
            services.path.stop();
            services.rotation.stop_following();
        }
        self.base.disable();
        self.state = KillerState::Searching;
        self.attack_cooldown.reset();
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    fn pause(&mut self, now: Millis, services: &mut Services) {
        services.path.stop();
        services.rotation.stop_following();
        self.state = KillerState::Searching;
        self.base.timer.reset();
        self.base.pause(now);
    }

    crate::impl_feature_any!();
}
