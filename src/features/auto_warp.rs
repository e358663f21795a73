use crate::config::WarpConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Feature, FeatureBase};
use crate::world::tablist::current_area;
use crate::world::Command;
use log::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WarpError {
    #[error("could not warp to {0}")]
    WarpFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WarpState {
    Sending,
    Waiting,
}

/// Sends `/warp` and waits until the sidebar shows the expected area.
pub struct AutoWarp {
    base: FeatureBase,
    config: WarpConfig,
    state: WarpState,
    destination: String,
    area: String,
    attempts: u32,
    error: Option<WarpError>,
}

impl AutoWarp {
    pub const NAME: &'static str = "AutoWarp";

    pub fn new(config: WarpConfig) -> AutoWarp {
        AutoWarp {
            base: FeatureBase::new(Self::NAME),
            config,
            state: WarpState::Sending,
            destination: String::new(),
            area: String::new(),
            attempts: 0,
            error: None,
        }
    }

    /// Warps to `destination` and finishes once the current area contains `area`.
    pub fn start(&mut self, destination: &str, area: &str) {
        self.error = None;
        self.destination = destination.to_string();
        self.area = area.to_string();
        self.attempts = 0;
        self.state = WarpState::Sending;
        self.base.enable();
    }

    pub fn error(&self) -> Option<&WarpError> {
        self.error.as_ref()
    }

    fn arrived(&self, scoreboard: &[String]) -> bool {
        current_area(scoreboard).map(|area| area.contains(&self.area)).unwrap_or(false)
    }
}

impl Feature for AutoWarp {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        if self.arrived(ctx.world.scoreboard()) {
            info!("Arrived in {}", self.area);
            self.stop(ctx.services);
            return Ok(());
        }
        match self.state {
            WarpState::Sending => {
                ctx.push(Command::Chat(format!("/warp {}", self.destination)));
                self.base.timer.schedule(ctx.now, self.config.warp_timeout);
                self.state = WarpState::Waiting;
            }
            WarpState::Waiting if self.base.timer.passed(ctx.now) => {
                self.attempts += 1;
                if self.attempts >= self.config.max_attempts {
                    let error = WarpError::WarpFailed(self.destination.clone());
                    error!("{}", error);
                    self.stop(ctx.services);
                    self.error = Some(error);
                } else {
                    warn!("Still not in {}, warping again", self.area);
                    self.state = WarpState::Sending;
                }
            }
            WarpState::Waiting => {}
        }
        Ok(())
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
        self.state = WarpState::Sending;
        self.attempts = 0;
    }

    fn last_error(&self) -> Option<String> {
        self.error.as_ref().map(|error| error.to_string())
    }

    crate::impl_feature_any!();
}
