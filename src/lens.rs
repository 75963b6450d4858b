//! Circular region of interest in unit-disk coordinates.

use crate::error::ConfigError;
use crate::geometry::norm;
use crate::Point2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub center: Point2,
    pub radius: f64,
}

impl Lens {
    pub fn new(center: Point2, radius: f64) -> Result<Self, ConfigError> {
        let lens = Lens { center, radius };
        lens.validate()?;
        Ok(lens)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(ConfigError::InvalidLensRadius(self.radius));
        }
        Ok(())
    }

    /// Strictly inside: points exactly on the boundary are excluded.
    pub fn contains(&self, p: Point2) -> bool {
        norm([p[0] - self.center[0], p[1] - self.center[1]]) < self.radius
    }

    pub fn mask(&self, points: &[Point2]) -> Vec<bool> {
        points.iter().map(|&p| self.contains(p)).collect()
    }
}

/// Pull `center` back onto the circle of radius `max_radius` if it lies outside.
pub fn keep_inside(center: Point2, max_radius: f64) -> Point2 {
    let r = norm(center);
    if r > max_radius {
        let ratio = max_radius / r;
        [center[0] * ratio, center[1] * ratio]
    } else {
        center
    }
}
