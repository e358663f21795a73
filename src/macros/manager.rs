use super::{Macro, MacroContext, MacroParams};
use crate::clock::Millis;
use crate::context::Services;
use crate::error::MacroError;
use crate::feature::FeatureManager;
use crate::world::WorldEvent;
use log::*;

#[derive(Debug, Clone, PartialEq)]
pub struct MacroStatus {
    pub running: bool,
    pub paused: bool,
    pub active: Option<&'static str>,
    pub uptime: Millis,
    pub last_error: Option<String>,
    pub counters: Vec<(&'static str, u64)>,
}

/// Owns every macro and the index of the active one.
#[derive(Default)]
pub struct MacroManager {
    macros: Vec<Box<dyn Macro>>,
    active: Option<usize>,
    last_error: Option<String>,
}

impl MacroManager {
    pub fn new() -> MacroManager {
        MacroManager::default()
    }

    pub fn register<M: Macro>(&mut self, macro_: M) {
        debug!("Registered macro {}", macro_.name());
        self.macros.push(Box::new(macro_));
    }

    pub fn get<M: Macro>(&self) -> Option<&M> {
        self.macros.iter().find_map(|macro_| macro_.as_any().downcast_ref::<M>())
    }

    pub fn get_mut<M: Macro>(&mut self) -> Option<&mut M> {
        self.macros.iter_mut().find_map(|macro_| macro_.as_any_mut().downcast_mut::<M>())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.macros.iter().map(|macro_| macro_.name()).collect()
    }

    fn active(&self) -> Option<&dyn Macro> {
        self.active.and_then(|idx| self.macros.get(idx)).map(|macro_| macro_.as_ref())
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn Macro>> {
        match self.active {
            Some(idx) => self.macros.get_mut(idx),
            None => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active().map(|macro_| macro_.base().is_enabled()).unwrap_or(false)
    }

    /// Starts the macro the parameters belong to. Fails if another macro is running.
    pub fn start(&mut self, params: MacroParams, ctx: &mut MacroContext) -> Result<(), MacroError> {
        if let Some(active) = self.active().filter(|macro_| macro_.base().is_enabled()) {
            return Err(MacroError::AlreadyRunning(active.name()));
        }
        let name = params.macro_name();
        let idx = self
            .macros
            .iter()
            .position(|macro_| macro_.name() == name)
            .ok_or_else(|| MacroError::UnknownMacro(name.to_string()))?;

        self.last_error = None;
        match self.macros[idx].start(&params, ctx) {
            Ok(()) => {
                self.active = Some(idx);
                info!("Macro {} started", name);
                Ok(())
            }
            Err(e) => {
                error!("Macro {} refused to start: {}", name, e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn stop(&mut self, features: &mut FeatureManager, services: &mut Services) -> Result<(), MacroError> {
        match self.active_mut().filter(|macro_| macro_.base().is_enabled()) {
            Some(macro_) => {
                macro_.stop(features, services);
                Ok(())
            }
            None => Err(MacroError::NotRunning),
        }
    }

    pub fn pause(&mut self, now: Millis, features: &mut FeatureManager, services: &mut Services) -> Result<(), MacroError> {
        match self.active_mut().filter(|macro_| macro_.base().is_enabled()) {
            Some(macro_) => {
                macro_.pause(now, features, services);
                Ok(())
            }
            None => Err(MacroError::NotRunning),
        }
    }

    pub fn resume(&mut self, now: Millis, features: &mut FeatureManager, services: &mut Services) -> Result<(), MacroError> {
        match self.active_mut().filter(|macro_| macro_.base().is_enabled()) {
            Some(macro_) => {
                macro_.resume(now, features, services);
                Ok(())
            }
            None => Err(MacroError::NotRunning),
        }
    }

    /// Ticks the active macro when its inter-tick delay elapsed.
    pub fn on_tick(&mut self, ctx: &mut MacroContext) {
        let macro_ = match self.active_mut() {
            Some(macro_) if macro_.base().is_running() => macro_,
            _ => return,
        };
        if !macro_.base_mut().tick_due(ctx.now) {
            return;
        }
        macro_.on_tick(ctx);
        let failure = if macro_.base().is_enabled() {
            None
        } else {
            macro_.base().error().map(|reason| reason.to_string())
        };
        if failure.is_some() {
            self.last_error = failure;
        }
    }

    pub fn on_event(&mut self, event: &WorldEvent) {
        if let Some(macro_) = self.active_mut().filter(|macro_| macro_.base().is_running()) {
            macro_.on_event(event);
        }
    }

    pub fn status(&self, now: Millis, features: &FeatureManager) -> MacroStatus {
        let active = self.active();
        MacroStatus {
            running: active.map(|macro_| macro_.base().is_enabled()).unwrap_or(false),
            paused: active.map(|macro_| macro_.base().is_paused()).unwrap_or(false),
            active: active.map(|macro_| macro_.name()),
            uptime: active.map(|macro_| macro_.base().uptime(now)).unwrap_or(0),
            last_error: self.last_error.clone(),
            counters: active.map(|macro_| macro_.counters(features)).unwrap_or_default(),
        }
    }
}
