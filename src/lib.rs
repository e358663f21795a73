#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]

pub mod angle;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod feature;
pub mod features;
pub mod graph;
pub mod macros;
pub mod pathfinder;
pub mod rotation;
pub mod world;

pub use context::Core;
