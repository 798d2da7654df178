//! Contains all structures and methods to create and manage transforms.
//!
//! Transform combines spatial properties (translation, rotation, scale) into a
//! single matrix. Calculations are lazy: you can set up all required
//! properties, and the actual matrix composition is delayed until you ask the
//! transform for its matrix.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use std::cell::Cell;

/// See module docs.
#[derive(Clone, Debug)]
pub struct Transform {
    /// Indicates that some property has changed and matrix must be
    /// recalculated before use. This is some sort of lazy evaluation.
    dirty: Cell<bool>,
    local_position: Vector3<f32>,
    local_rotation: UnitQuaternion<f32>,
    local_scale: Vector3<f32>,
    /// Combined transform. Final result of combination of other properties.
    matrix: Cell<Matrix4<f32>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Creates new transform that has no effect, in other words any vector
    /// or matrix will remain unchanged if combined with identity transform.
    pub fn identity() -> Self {
        Self {
            dirty: Cell::new(true),
            local_position: Vector3::default(),
            local_rotation: UnitQuaternion::identity(),
            local_scale: Vector3::new(1.0, 1.0, 1.0),
            matrix: Cell::new(Matrix4::identity()),
        }
    }

    /// Returns current position of transform.
    #[inline]
    pub fn position(&self) -> Vector3<f32> {
        self.local_position
    }

    /// Sets position of transform.
    #[inline]
    pub fn set_position(&mut self, local_position: Vector3<f32>) -> &mut Self {
        if self.dirty.get() || self.local_position != local_position {
            self.local_position = local_position;
            self.dirty.set(true);
        }
        self
    }

    /// Returns current rotation quaternion of transform.
    #[inline]
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.local_rotation
    }

    /// Sets rotation of transform.
    #[inline]
    pub fn set_rotation(&mut self, local_rotation: UnitQuaternion<f32>) -> &mut Self {
        if self.dirty.get() || self.local_rotation != local_rotation {
            self.local_rotation = local_rotation;
            self.dirty.set(true);
        }
        self
    }

    /// Returns current scale factor of transform.
    #[inline]
    pub fn scale(&self) -> Vector3<f32> {
        self.local_scale
    }

    /// Sets scale of transform. It is strongly advised to use only uniform scaling:
    /// rigid bodies bake the scale into their collision shape at creation time and
    /// do not rescale dynamically.
    #[inline]
    pub fn set_scale(&mut self, local_scale: Vector3<f32>) -> &mut Self {
        if self.dirty.get() || self.local_scale != local_scale {
            self.local_scale = local_scale;
            self.dirty.set(true);
        }
        self
    }

    /// Shifts local position using given vector. It is a shortcut for:
    /// set_position(position() + offset)
    #[inline]
    pub fn offset(&mut self, vec: Vector3<f32>) -> &mut Self {
        self.local_position += vec;
        self.dirty.set(true);
        self
    }

    /// Returns true if any property was changed since the matrix was last
    /// composed.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn calculate_local_transform(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.local_position)
            * self.local_rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.local_scale)
    }

    /// Returns matrix which is final result of transform. Matrix then can be used to transform
    /// a vector, or combine with other matrix, to make transform hierarchy for example.
    pub fn matrix(&self) -> Matrix4<f32> {
        if self.dirty.get() {
            self.matrix.set(self.calculate_local_transform());
            self.dirty.set(false)
        }
        self.matrix.get()
    }
}

/// Transform builder allows you to construct transform in declarative manner.
/// This is typical implementation of Builder pattern.
#[derive(Default)]
pub struct TransformBuilder {
    local_position: Option<Vector3<f32>>,
    local_rotation: Option<UnitQuaternion<f32>>,
    local_scale: Option<Vector3<f32>>,
}

impl TransformBuilder {
    /// Creates new transform builder. If a property is not set, its default
    /// value will be used.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets desired local position.
    pub fn with_local_position(mut self, position: Vector3<f32>) -> Self {
        self.local_position = Some(position);
        self
    }

    /// Sets desired local rotation.
    pub fn with_local_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.local_rotation = Some(rotation);
        self
    }

    /// Sets desired local scale.
    pub fn with_local_scale(mut self, scale: Vector3<f32>) -> Self {
        self.local_scale = Some(scale);
        self
    }

    /// Builds new Transform instance using provided values.
    pub fn build(self) -> Transform {
        let mut transform = Transform::identity();
        if let Some(position) = self.local_position {
            transform.set_position(position);
        }
        if let Some(rotation) = self.local_rotation {
            transform.set_rotation(rotation);
        }
        if let Some(scale) = self.local_scale {
            transform.set_scale(scale);
        }
        transform
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_identity_matrix() {
        let transform = Transform::identity();
        assert_eq!(transform.matrix(), Matrix4::identity());
        assert!(!transform.is_dirty());
    }

    #[test]
    fn test_set_position_marks_dirty() {
        let mut transform = Transform::identity();
        let _ = transform.matrix();
        assert!(!transform.is_dirty());

        transform.set_position(Vector3::new(1.0, 2.0, 3.0));
        assert!(transform.is_dirty());

        let m = transform.matrix();
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
        assert!(!transform.is_dirty());
    }

    #[test]
    fn test_builder_composes_translation_and_scale() {
        let transform = TransformBuilder::new()
            .with_local_position(Vector3::new(4.0, 0.0, -4.0))
            .with_local_scale(Vector3::new(2.0, 2.0, 2.0))
            .build();
        let m = transform.matrix();
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(1, 1)], 2.0);
        assert_eq!(m[(2, 2)], 2.0);
        assert_eq!(m[(0, 3)], 4.0);
        assert_eq!(m[(2, 3)], -4.0);
    }
}
