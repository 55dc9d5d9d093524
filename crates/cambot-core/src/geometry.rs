//! World-space primitives shared by the movement and scheduling code.
//!
//! Positions are `DVec3` with `y` pointing up. Yaw follows the game
//! client's convention: yaw `0` faces `-Z` and increases counter-clockwise
//! when seen from above.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Position and orientation of the controlled avatar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    /// Horizontal rotation in radians.
    pub yaw: f64,
    /// Vertical rotation in radians.
    pub pitch: f64,
}

impl Pose {
    pub fn new(position: DVec3, yaw: f64, pitch: f64) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    /// Unit vector in the horizontal plane the avatar is facing.
    pub fn facing(&self) -> DVec3 {
        facing(self.yaw)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.yaw.is_finite() && self.pitch.is_finite()
    }
}

/// Live telemetry of a filmable subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Feet position.
    pub position: DVec3,
    /// Entity height.
    pub height: f64,
}

impl Subject {
    pub fn new(position: DVec3, height: f64) -> Self {
        Self { position, height }
    }

    /// Point `fraction` of the way up the subject's body.
    pub fn point_at_height(&self, fraction: f64) -> DVec3 {
        self.position + DVec3::Y * (self.height * fraction)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.height.is_finite()
    }
}

/// Horizontal unit vector for a yaw angle.
pub fn facing(yaw: f64) -> DVec3 {
    DVec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Distance ignoring the vertical axis.
pub fn horizontal_distance(a: DVec3, b: DVec3) -> f64 {
    let d = a - b;
    d.x.hypot(d.z)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: DVec3, b: DVec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_facing_matches_yaw_convention() {
        assert!(approx(facing(0.0), DVec3::new(0.0, 0.0, -1.0)));
        assert!(approx(facing(FRAC_PI_2), DVec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_point_at_height() {
        let subject = Subject::new(DVec3::new(1.0, 64.0, 1.0), 1.8);
        assert!(approx(subject.point_at_height(1.0), DVec3::new(1.0, 65.8, 1.0)));
        assert!(approx(subject.point_at_height(0.5), DVec3::new(1.0, 64.9, 1.0)));
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = DVec3::new(0.0, 0.0, 0.0);
        let b = DVec3::new(3.0, 100.0, 4.0);
        assert!((horizontal_distance(a, b) - 5.0).abs() < 1e-9);
    }
}
