pub mod executor;
pub mod planner;

pub use executor::PathExecutor;
pub use planner::find_path;

use crate::error::PathError;
use glam::IVec3;

/// Where a segment ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    /// Stand in exactly this block.
    Block(IVec3),
    /// Stand within `range` blocks of this block.
    Near { position: IVec3, range: f64 },
}

impl Goal {
    pub fn position(&self) -> IVec3 {
        match self {
            Goal::Block(position) | Goal::Near { position, .. } => *position,
        }
    }

    pub fn is_end(&self, footing: IVec3) -> bool {
        match self {
            Goal::Block(position) => *position == footing,
            Goal::Near { position, range } => (*position - footing).as_dvec3().length() <= *range,
        }
    }
}

/// A continuous run of footing blocks from `start` to `goal`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub start: IVec3,
    pub goal: Goal,
    pub path: Vec<IVec3>,
}

impl PathSegment {
    pub fn new(path: Vec<IVec3>, goal: Goal) -> Result<PathSegment, PathError> {
        let start = *path.first().ok_or(PathError::EmptySegment)?;
        Ok(PathSegment { start, goal, path })
    }
}
