use glam::IVec3;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("segment starts at {start} but the previous segment ends at {previous_goal}")]
    DiscontinuousSegment { start: IVec3, previous_goal: IVec3 },

    #[error("segment contains no positions")]
    EmptySegment,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("unknown waypoint {0}")]
    UnknownWaypoint(u32),

    #[error("unknown graph `{0}`")]
    UnknownGraph(String),

    #[error("graph `{0}` is not in edit mode")]
    NotEditing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single feature handler. Caught at the fan-out boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("{0}")]
    Handler(String),

    #[error("feature `{0}` panicked")]
    Panicked(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    #[error("no macro named `{0}` is registered")]
    UnknownMacro(String),

    #[error("macro `{0}` is already running")]
    AlreadyRunning(&'static str),

    #[error("no macro is running")]
    NotRunning,

    #[error("parameters do not belong to macro `{0}`")]
    InvalidParams(&'static str),

    #[error("{0}")]
    Precondition(String),
}

/// Failure of an ad-hoc feature control call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("feature `{0}` is not registered")]
    UnknownFeature(String),

    #[error(transparent)]
    Miner(#[from] crate::features::BlockMinerError),

    #[error(transparent)]
    MobKiller(#[from] crate::features::MobKillerError),

    #[error(transparent)]
    ChestUnlocker(#[from] crate::features::ChestUnlockerError),
}
