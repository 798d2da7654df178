//! Collision shape descriptors.

use crate::resource::image::SharedImage;
use serde::{Deserialize, Serialize};

/// Kind of collision shape a rigid body was created with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShapeType {
    Box,
    Sphere,
    Mesh,
    Heightfield,
    Capsule,
}

impl ShapeType {
    /// Whether bodies of this shape can participate in constraints. Mesh and
    /// heightfield bodies cannot.
    #[inline]
    pub fn supports_constraints(self) -> bool {
        !matches!(self, ShapeType::Mesh | ShapeType::Heightfield)
    }
}

/// Describes the collision shape to build for a rigid body. Box, sphere and
/// capsule shapes are fitted to the bounding volume of the host node's mesh,
/// mesh shapes reuse its triangles directly and heightfields are built from
/// a raster height source.
#[derive(Clone, Debug)]
pub enum ColliderShapeDesc {
    Box,
    Sphere,
    Mesh,
    Heightfield {
        /// Height source; pixel rows map to world z, columns to world x.
        image: SharedImage,
    },
    Capsule {
        radius: f32,
        /// Full capsule height, caps included.
        height: f32,
    },
}

impl ColliderShapeDesc {
    /// Shape kind this descriptor will produce.
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ColliderShapeDesc::Box => ShapeType::Box,
            ColliderShapeDesc::Sphere => ShapeType::Sphere,
            ColliderShapeDesc::Mesh => ShapeType::Mesh,
            ColliderShapeDesc::Heightfield { .. } => ShapeType::Heightfield,
            ColliderShapeDesc::Capsule { .. } => ShapeType::Capsule,
        }
    }
}
