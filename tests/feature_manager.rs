mod common;

use commission_bot::config::Config;
use commission_bot::context::{Services, TickContext};
use commission_bot::error::FeatureError;
use commission_bot::feature::{Failsafe, Feature, FeatureBase, FeatureManager};
use commission_bot::world::WorldEvent;
use common::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

enum Misbehaviour {
    Error,
    Panic,
}

struct Faulty {
    base: FeatureBase,
    misbehaviour: Misbehaviour,
}

impl Faulty {
    fn new(misbehaviour: Misbehaviour) -> Faulty {
        let mut base = FeatureBase::new("Faulty").ignoring(&[Failsafe::Damage]);
        base.enable();
        Faulty { base, misbehaviour }
    }
}

impl Feature for Faulty {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, _ctx: &mut TickContext) -> Result<(), FeatureError> {
        match self.misbehaviour {
            Misbehaviour::Error => Err(FeatureError::Handler("broken".to_string())),
            Misbehaviour::Panic => panic!("faulty feature"),
        }
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
    }

    fn last_error(&self) -> Option<String> {
        None
    }

    fn on_event(&mut self, _event: &WorldEvent, _now: u64) -> Result<(), FeatureError> {
        Err(FeatureError::Handler("broken".to_string()))
    }

    commission_bot::impl_feature_any!();
}

#[derive(Default)]
struct Counter {
    ticks: u32,
    events: u32,
}

struct Counting {
    base: FeatureBase,
    counter: Counter,
}

impl Counting {
    fn new() -> Counting {
        let mut base = FeatureBase::new("Counting").ignoring(&[Failsafe::Knockback, Failsafe::Damage]);
        base.enable();
        Counting {
            base,
            counter: Counter::default(),
        }
    }
}

impl Feature for Counting {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, _ctx: &mut TickContext) -> Result<(), FeatureError> {
        self.counter.ticks += 1;
        Ok(())
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
    }

    fn last_error(&self) -> Option<String> {
        None
    }

    fn on_event(&mut self, _event: &WorldEvent, _now: u64) -> Result<(), FeatureError> {
        self.counter.events += 1;
        Ok(())
    }

    commission_bot::impl_feature_any!();
}

fn services() -> Services {
    Services::new(Config::default(), StdRng::seed_from_u64(3))
}

#[test]
fn failing_feature_does_not_block_siblings() {
    let world = flat_world();
    let mut services = services();
    let mut manager = FeatureManager::new();
    manager.register(Faulty::new(Misbehaviour::Error));
    manager.register(Counting::new());

    for now in [50, 100, 150] {
        let mut ctx = TickContext::new(now, &world, &mut services);
        manager.on_tick(&mut ctx);
    }
    manager.on_event(&WorldEvent::Chat("hello".to_string()), 150);

    let counting = manager.get::<Counting>().unwrap();
    assert_eq!(counting.counter.ticks, 3);
    assert_eq!(counting.counter.events, 1);
}

#[test]
fn panicking_feature_does_not_block_siblings() {
    let world = flat_world();
    let mut services = services();
    let mut manager = FeatureManager::new();
    manager.register(Faulty::new(Misbehaviour::Panic));
    manager.register(Counting::new());

    let mut ctx = TickContext::new(50, &world, &mut services);
    manager.on_tick(&mut ctx);

    assert_eq!(manager.get::<Counting>().unwrap().counter.ticks, 1);
}

#[test]
fn only_running_features_are_ticked() {
    let world = flat_world();
    let mut services = services();
    let mut manager = FeatureManager::new();
    manager.register(Counting::new());

    manager.pause("Counting", 0, &mut services);
    let mut ctx = TickContext::new(50, &world, &mut services);
    manager.on_tick(&mut ctx);
    assert_eq!(manager.get::<Counting>().unwrap().counter.ticks, 0);
    assert!(manager.failsafes_to_ignore().is_empty());

    manager.resume("Counting", 100, &mut services);
    let mut ctx = TickContext::new(150, &world, &mut services);
    manager.on_tick(&mut ctx);
    assert_eq!(manager.get::<Counting>().unwrap().counter.ticks, 1);
    assert_eq!(manager.running(), vec!["Counting"]);
}

#[test]
fn failsafes_are_unioned_over_running_features() {
    let mut manager = FeatureManager::new();
    manager.register(Faulty::new(Misbehaviour::Error));
    manager.register(Counting::new());

    let ignored: Vec<Failsafe> = manager.failsafes_to_ignore().into_iter().collect();
    assert_eq!(ignored, vec![Failsafe::Damage, Failsafe::Knockback]);

    let mut services = services();
    manager.stop_all(&mut services);
    assert!(manager.failsafes_to_ignore().is_empty());
    assert!(manager.running().is_empty());
}
