use super::{Failsafe, Feature};
use crate::clock::Millis;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::world::WorldEvent;
use log::*;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Registry of every feature. Events are delivered in registration order and
/// only to running features; a failing handler never blocks its siblings.
#[derive(Default)]
pub struct FeatureManager {
    features: Vec<Box<dyn Feature>>,
}

fn isolate<F: FnOnce() -> Result<(), FeatureError>>(name: &'static str, handler: F) {
    match catch_unwind(AssertUnwindSafe(handler)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Feature {} failed: {}", name, e),
        Err(_) => error!("{}", FeatureError::Panicked(name)),
    }
}

impl FeatureManager {
    pub fn new() -> FeatureManager {
        FeatureManager::default()
    }

    pub fn register<F: Feature>(&mut self, feature: F) {
        debug!("Registered feature {}", feature.name());
        self.features.push(Box::new(feature));
    }

    pub fn get<F: Feature>(&self) -> Option<&F> {
        self.features.iter().find_map(|feature| feature.as_any().downcast_ref::<F>())
    }

    pub fn get_mut<F: Feature>(&mut self) -> Option<&mut F> {
        self.features.iter_mut().find_map(|feature| feature.as_any_mut().downcast_mut::<F>())
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn Feature> {
        self.features.iter().find(|feature| feature.name() == name).map(|feature| feature.as_ref())
    }

    fn by_name_mut(&mut self, name: &str) -> Option<&mut Box<dyn Feature>> {
        self.features.iter_mut().find(|feature| feature.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|feature| feature.name()).collect()
    }

    pub fn running(&self) -> Vec<&'static str> {
        self.features
            .iter()
            .filter(|feature| feature.is_running())
            .map(|feature| feature.name())
            .collect()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.by_name(name).map(|feature| feature.is_running()).unwrap_or(false)
    }

    pub fn on_tick(&mut self, ctx: &mut TickContext) {
        for feature in self.features.iter_mut() {
            if !feature.is_running() {
                continue;
            }
            let name = feature.name();
            isolate(name, || feature.on_tick(ctx));
        }
    }

    pub fn on_event(&mut self, event: &WorldEvent, now: Millis) {
        for feature in self.features.iter_mut() {
            if !feature.is_running() {
                continue;
            }
            let name = feature.name();
            isolate(name, || feature.on_event(event, now));
        }
    }

    /// Union of the failsafes every running feature wants suppressed.
    pub fn failsafes_to_ignore(&self) -> BTreeSet<Failsafe> {
        self.features
            .iter()
            .filter(|feature| feature.is_running())
            .flat_map(|feature| feature.failsafes_to_ignore().iter().copied())
            .collect()
    }

    pub fn pause(&mut self, name: &str, now: Millis, services: &mut Services) {
        if let Some(feature) = self.by_name_mut(name) {
            feature.pause(now, services);
        }
    }

    pub fn resume(&mut self, name: &str, now: Millis, services: &mut Services) {
        if let Some(feature) = self.by_name_mut(name) {
            feature.resume(now, services);
        }
    }

    pub fn stop(&mut self, name: &str, services: &mut Services) {
        if let Some(feature) = self.by_name_mut(name) {
            if feature.base().is_enabled() {
                feature.stop(services);
            }
        }
    }

    pub fn stop_all(&mut self, services: &mut Services) {
        for feature in self.features.iter_mut() {
            if feature.base().is_enabled() {
                feature.stop(services);
            }
        }
    }
}
