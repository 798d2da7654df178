//! Math types shared across the crate.

pub mod aabb;

use crate::math::aabb::AxisAlignedBoundingBox;
use nalgebra::Vector3;

/// Bounding sphere, defined by a center point and a radius. Used as the
/// center-of-mass anchor when deriving collision shapes from geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vector3<f32>,
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self {
            center: Vector3::default(),
            radius: 0.0,
        }
    }
}

impl BoundingSphere {
    #[inline]
    pub fn new(center: Vector3<f32>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Builds the sphere centered at the point set's bounding-box center with
    /// a radius reaching the farthest point.
    pub fn from_points(points: &[Vector3<f32>]) -> Self {
        let center = AxisAlignedBoundingBox::from_points(points).center();
        let mut sqr_radius: f32 = 0.0;
        for point in points {
            sqr_radius = sqr_radius.max((point - center).norm_squared());
        }
        Self {
            center,
            radius: sqr_radius.sqrt(),
        }
    }

    #[inline]
    pub fn is_contains_point(&self, point: Vector3<f32>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }
}
