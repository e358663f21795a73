//! A feature is one automatable behaviour: a tick-driven state machine that a
//! macro (or the front-end) starts, pauses, resumes and stops.

use crate::clock::{Clock, Millis};
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::world::WorldEvent;
use std::any::Any;

pub mod manager;

pub use manager::FeatureManager;

/// Safety checks a running feature may ask the failsafe layer to suppress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Failsafe {
    Damage,
    Knockback,
    Rotation,
    Teleport,
    ItemChange,
    BlockChange,
}

/// State shared by every feature.
#[derive(Debug)]
pub struct FeatureBase {
    name: &'static str,
    enabled: bool,
    paused: bool,
    /// Deadline of the current state's wait.
    pub timer: Clock,
    failsafes_to_ignore: Vec<Failsafe>,
}

impl FeatureBase {
    pub fn new(name: &'static str) -> FeatureBase {
        FeatureBase {
            name,
            enabled: false,
            paused: false,
            timer: Clock::new(),
            failsafes_to_ignore: Vec::new(),
        }
    }

    pub fn ignoring(mut self, failsafes: &[Failsafe]) -> FeatureBase {
        self.failsafes_to_ignore = failsafes.to_vec();
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Marks the feature running with a clean timer.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.paused = false;
        self.timer.reset();
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.paused = false;
        self.timer.reset();
    }

    pub fn pause(&mut self, now: Millis) {
        if self.enabled && !self.paused {
            self.paused = true;
            self.timer.pause(now);
        }
    }

    pub fn resume(&mut self, now: Millis) {
        if self.enabled && self.paused {
            self.paused = false;
            self.timer.resume(now);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused
    }

    pub fn failsafes_to_ignore(&self) -> &[Failsafe] {
        &self.failsafes_to_ignore
    }
}

pub trait Feature: Any {
    fn base(&self) -> &FeatureBase;
    fn base_mut(&mut self) -> &mut FeatureBase;

    /// Advances the current state by one tick.
    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError>;

    /// Stops the feature and clears every timer and queue it owns so that
    /// a later start begins from a clean state.
    fn stop(&mut self, services: &mut Services);

    /// Human readable reason of the last terminal error, if any.
    fn last_error(&self) -> Option<String>;

    fn on_chat(&mut self, _message: &str) {}

    fn on_event(&mut self, event: &WorldEvent, _now: Millis) -> Result<(), FeatureError> {
        if let WorldEvent::Chat(message) = event {
            self.on_chat(message);
        }
        Ok(())
    }

    fn pause(&mut self, now: Millis, _services: &mut Services) {
        self.base_mut().pause(now);
    }

    fn resume(&mut self, now: Millis, _services: &mut Services) {
        self.base_mut().resume(now);
    }

    fn name(&self) -> &'static str {
        self.base().name()
    }

    fn is_running(&self) -> bool {
        self.base().is_running()
    }

    fn failsafes_to_ignore(&self) -> &[Failsafe] {
        self.base().failsafes_to_ignore()
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implements the `Any` accessors of [`Feature`].
#[macro_export]
macro_rules! impl_feature_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
