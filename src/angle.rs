use glam::DVec3;
use std::ops::{Add, Mul, Sub};

/// A look direction in degrees. Yaw follows the game convention (0 faces +z,
/// 90 faces -x); pitch is positive when looking down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Angle {
    pub yaw: f32,
    pub pitch: f32,
}

impl Angle {
    pub const ZERO: Angle = Angle { yaw: 0.0, pitch: 0.0 };

    pub const fn new(yaw: f32, pitch: f32) -> Angle {
        Angle { yaw, pitch }
    }

    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }

    /// Yaw normalized to (-180, 180], pitch clamped to [-90, 90].
    pub fn normalized(self) -> Angle {
        Angle {
            yaw: normalize_angle(self.yaw),
            pitch: clamp_pitch(self.pitch),
        }
    }

    /// Largest of the absolute yaw and pitch components.
    pub fn magnitude(&self) -> f32 {
        self.yaw.abs().max(self.pitch.abs())
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle::new(self.yaw + rhs.yaw, self.pitch + rhs.pitch)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle::new(self.yaw - rhs.yaw, self.pitch - rhs.pitch)
    }
}

impl Mul<f32> for Angle {
    type Output = Angle;

    fn mul(self, rhs: f32) -> Angle {
        Angle::new(self.yaw * rhs, self.pitch * rhs)
    }
}

/// Maps any yaw into (-180, 180]. Non-finite input maps to 0.
pub fn normalize_angle(yaw: f32) -> f32 {
    if !yaw.is_finite() {
        return 0.0;
    }
    let mut yaw = yaw % 360.0;
    if yaw <= -180.0 {
        yaw += 360.0;
    } else if yaw > 180.0 {
        yaw -= 360.0;
    }
    yaw
}

/// Maps any yaw into [0, 360). Non-finite input maps to 0.
pub fn get_360(yaw: f32) -> f32 {
    if !yaw.is_finite() {
        return 0.0;
    }
    let yaw = yaw.rem_euclid(360.0);
    if yaw >= 360.0 {
        0.0
    } else {
        yaw
    }
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    if pitch.is_finite() {
        pitch.clamp(-90.0, 90.0)
    } else {
        0.0
    }
}

/// Look angle needed to face `to` from `from`.
///
/// Returns [`Angle::ZERO`] when the points are vertically aligned or when any
/// coordinate is not finite.
pub fn rotation_to(from: DVec3, to: DVec3) -> Angle {
    let delta = to - from;
    let horizontal = (delta.x * delta.x + delta.z * delta.z).sqrt();
    if horizontal == 0.0 || !horizontal.is_finite() {
        return Angle::ZERO;
    }
    let yaw = delta.z.atan2(delta.x).to_degrees() - 90.0;
    let pitch = -delta.y.atan2(horizontal).to_degrees();
    let angle = Angle::new(yaw as f32, pitch as f32);
    if angle.is_finite() {
        angle
    } else {
        Angle::ZERO
    }
}

/// Shortest change from `start` to `end`: normalized yaw delta and raw pitch delta.
pub fn needed_change(start: Angle, end: Angle) -> Angle {
    let change = Angle::new(normalize_angle(end.yaw - start.yaw), end.pitch - start.pitch);
    if change.is_finite() {
        change
    } else {
        Angle::ZERO
    }
}

/// Absolute shortest yaw difference in degrees.
pub fn yaw_difference(a: f32, b: f32) -> f32 {
    normalize_angle(b - a).abs()
}

/// Unit horizontal direction the given yaw faces.
pub fn yaw_direction(yaw: f32) -> DVec3 {
    let radians = (yaw as f64).to_radians();
    DVec3::new(-radians.sin(), 0.0, radians.cos())
}
