//! Macros orchestrate features. Only one macro is active at a time; it decides
//! every tick which of its features should be running.

use crate::clock::{Clock, Millis};
use crate::context::Services;
use crate::error::MacroError;
use crate::feature::FeatureManager;
use crate::features::MinerParams;
use crate::world::{WorldEvent, WorldView};
use log::*;
use std::any::Any;

pub mod commission_macro;
pub mod manager;
pub mod mining_macro;

pub use commission_macro::{CommissionMacro, CommissionState};
pub use manager::{MacroManager, MacroStatus};
pub use mining_macro::{MiningMacro, MiningState};

/// Everything a macro acts on during a tick.
pub struct MacroContext<'a> {
    pub now: Millis,
    pub world: &'a dyn WorldView,
    pub features: &'a mut FeatureManager,
    pub services: &'a mut Services,
}

/// Parameters of [`MacroManager::start`]; the variant selects the macro.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroParams {
    Mining(MinerParams),
    Commission { tool: String },
}

impl MacroParams {
    pub fn macro_name(&self) -> &'static str {
        match self {
            MacroParams::Mining(_) => MiningMacro::NAME,
            MacroParams::Commission { .. } => CommissionMacro::NAME,
        }
    }
}

/// State shared by every macro.
#[derive(Debug)]
pub struct MacroBase {
    name: &'static str,
    enabled: bool,
    paused: bool,
    /// Gates `on_tick` to one call per `tick_delay`.
    pub timer: Clock,
    tick_delay: Millis,
    started_at: Millis,
    paused_at: Option<Millis>,
    paused_total: Millis,
    paused_features: Vec<&'static str>,
    error: Option<String>,
}

impl MacroBase {
    pub fn new(name: &'static str, tick_delay: Millis) -> MacroBase {
        MacroBase {
            name,
            enabled: false,
            paused: false,
            timer: Clock::new(),
            tick_delay,
            started_at: 0,
            paused_at: None,
            paused_total: 0,
            paused_features: Vec::new(),
            error: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn enable(&mut self, now: Millis) {
        self.enabled = true;
        self.paused = false;
        self.timer.reset();
        self.started_at = now;
        self.paused_at = None;
        self.paused_total = 0;
        self.paused_features.clear();
        self.error = None;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.paused = false;
        self.timer.reset();
        self.paused_features.clear();
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

    /// Whether the inter-tick delay elapsed; schedules the next one if so.
    pub fn tick_due(&mut self, now: Millis) -> bool {
        if self.timer.is_scheduled() && !self.timer.passed(now) {
            return false;
        }
        self.timer.schedule(now, self.tick_delay);
        true
    }

    pub fn uptime(&self, now: Millis) -> Millis {
        if !self.enabled {
            return 0;
        }
        let paused = self.paused_total + self.paused_at.map(|at| now.saturating_sub(at)).unwrap_or(0);
        now.saturating_sub(self.started_at).saturating_sub(paused)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, reason: String) {
        error!("Macro {} failed: {}", self.name, reason);
        self.error = Some(reason);
    }
}

pub trait Macro: Any {
    fn base(&self) -> &MacroBase;
    fn base_mut(&mut self) -> &mut MacroBase;

    /// Features this macro drives. They are paused, resumed and stopped with it.
    fn features(&self) -> &'static [&'static str];

    /// Checks the parameters and necessary items and enters the first state.
    fn start(&mut self, params: &MacroParams, ctx: &mut MacroContext) -> Result<(), MacroError>;

    fn on_tick(&mut self, ctx: &mut MacroContext);

    fn on_event(&mut self, _event: &WorldEvent) {}

    /// Counters shown in the status, e.g. blocks mined.
    fn counters(&self, _features: &FeatureManager) -> Vec<(&'static str, u64)> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        self.base().name()
    }

    /// Stops the macro and every feature it left running.
    fn stop(&mut self, features: &mut FeatureManager, services: &mut Services) {
        for name in self.features() {
            features.stop(name, services);
        }
        services.path.stop();
        services.rotation.stop();
        self.base_mut().disable();
        info!("Macro {} stopped", self.name());
    }

    fn pause(&mut self, now: Millis, features: &mut FeatureManager, services: &mut Services) {
        if !self.base().is_running() {
            return;
        }
        let running: Vec<&'static str> = self.features().iter().copied().filter(|name| features.is_running(name)).collect();
        for name in &running {
            features.pause(name, now, services);
        }
        let base = self.base_mut();
        base.paused = true;
        base.paused_at = Some(now);
        base.paused_features = running;
        base.timer.pause(now);
    }

    /// Resumes the features that were running when the macro was paused.
    fn resume(&mut self, now: Millis, features: &mut FeatureManager, services: &mut Services) {
        if !self.base().is_enabled() || !self.base().is_paused() {
            return;
        }
        let base = self.base_mut();
        base.paused = false;
        if let Some(at) = base.paused_at.take() {
            base.paused_total += now.saturating_sub(at);
        }
        base.timer.resume(now);
        let paused = std::mem::take(&mut base.paused_features);
        for name in paused {
            features.resume(name, now, services);
        }
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implements the `Any` accessors of [`Macro`].
#[macro_export]
macro_rules! impl_macro_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
