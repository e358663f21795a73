use super::{BlockFace, BlockState, WorldView};
use glam::{DVec3, IVec3};

/// Block-level lookups shared by the features. All of them return safe
/// defaults instead of failing since they run every tick.
pub trait WorldQueries: WorldView {
    fn is_passable(&self, position: IVec3) -> bool {
        !self.block_at(position).solid
    }

    /// Solid floor with two passable blocks above it.
    fn is_standable(&self, feet: IVec3) -> bool {
        self.block_at(feet - IVec3::Y).solid && self.is_passable(feet) && self.is_passable(feet + IVec3::Y)
    }

    /// Blocks within a cube of `radius` around `center` matching `predicate`,
    /// closest first.
    fn search_blocks<F: Fn(BlockState) -> bool>(&self, center: IVec3, radius: i32, predicate: F) -> Vec<IVec3> {
        let mut found = Vec::new();
        for x in -radius..=radius {
            for y in -radius..=radius {
                for z in -radius..=radius {
                    let position = center + IVec3::new(x, y, z);
                    if predicate(self.block_at(position)) {
                        found.push(position);
                    }
                }
            }
        }
        found.sort_by_key(|position| (*position - center).length_squared());
        found
    }

    /// Marches from `from` to the center of `target` in `step` increments and
    /// fails on the first solid block that is not the target itself.
    fn has_line_of_sight(&self, from: DVec3, target: IVec3, step: f64) -> bool {
        let to = block_center(target);
        let delta = to - from;
        let length = delta.length();
        if !length.is_finite() || step <= 0.0 {
            return false;
        }
        let steps = (length / step).ceil() as usize;
        for i in 0..=steps {
            let point = from + delta * ((i as f64 * step) / length).min(1.0);
            let position = point.floor().as_ivec3();
            if position == target {
                return true;
            }
            if self.block_at(position).solid {
                return false;
            }
        }
        true
    }

    /// Whether a straight walk from `from` to `to` (feet positions) clears
    /// both foot and head height.
    fn can_walk_between(&self, from: DVec3, to: DVec3) -> bool {
        let delta = to - from;
        let length = delta.length();
        if !length.is_finite() {
            return false;
        }
        let steps = (length / 0.25).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let point = from + delta * (i as f64 / steps as f64);
            for height in [0.1, 1.1] {
                let position = (point + DVec3::new(0.0, height, 0.0)).floor().as_ivec3();
                if self.block_at(position).solid {
                    return false;
                }
            }
        }
        true
    }

    /// Whether the block right under the feet can be stood on. The actor is a
    /// point here, like in [`can_walk_between`](Self::can_walk_between).
    fn is_on_ground(&self, position: DVec3) -> bool {
        let below = (position - DVec3::Y).floor().as_ivec3();
        self.block_at(below).solid
    }
}

impl<W: WorldView + ?Sized> WorldQueries for W {}

pub fn block_center(position: IVec3) -> DVec3 {
    position.as_dvec3() + DVec3::splat(0.5)
}

/// Face of `block` to dig from `eye`, picked by the dominant axis of the offset.
pub fn block_face(eye: DVec3, block: IVec3) -> BlockFace {
    let offset = eye - block_center(block);
    let (ax, ay, az) = (offset.x.abs(), offset.y.abs(), offset.z.abs());
    if ay >= ax && ay >= az {
        if offset.y > 0.0 {
            BlockFace::Top
        } else {
            BlockFace::Bottom
        }
    } else if ax >= az {
        if offset.x > 0.0 {
            BlockFace::East
        } else {
            BlockFace::West
        }
    } else if offset.z > 0.0 {
        BlockFace::South
    } else {
        BlockFace::North
    }
}

/// Horizontal distance between two points.
pub fn horizontal_distance(a: DVec3, b: DVec3) -> f64 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Parses numbers shown in menus and sidebars such as `1,234.5` or `45%`.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_numbers() {
        assert_eq!(parse_number(" 1,234"), Some(1234.0));
        assert_eq!(parse_number("45%"), Some(45.0));
        assert_eq!(parse_number("DONE"), None);
    }

    #[test]
    fn dominant_axis_face() {
        let block = IVec3::new(0, 0, 0);
        assert_eq!(block_face(DVec3::new(0.5, 3.0, 0.5), block), BlockFace::Top);
        assert_eq!(block_face(DVec3::new(3.0, 0.5, 0.7), block), BlockFace::East);
        assert_eq!(block_face(DVec3::new(0.5, 0.6, -4.0), block), BlockFace::North);
    }
}
