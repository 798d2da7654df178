//! Triangle-list geometry attached to a scene node. Collision shapes are
//! derived from it: boxes and heightfield footprints from the bounding box,
//! spheres and center-of-mass offsets from the bounding sphere, trimeshes from
//! the raw vertex/triangle buffers.

use crate::math::{aabb::AxisAlignedBoundingBox, BoundingSphere};
use nalgebra::Vector3;
use std::cell::Cell;

/// Kind of primitives the vertex/index buffers encode. Only [`PrimitiveType::Triangles`]
/// meshes can become mesh collision shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

/// See module docs.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vector3<f32>>,
    triangles: Vec<[u32; 3]>,
    primitive_type: PrimitiveType,
    bounding_box: Cell<AxisAlignedBoundingBox>,
    bounding_box_dirty: Cell<bool>,
    bounding_sphere: Cell<BoundingSphere>,
    bounding_sphere_dirty: Cell<bool>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertices: Default::default(),
            triangles: Default::default(),
            primitive_type: PrimitiveType::Triangles,
            bounding_box: Default::default(),
            bounding_box_dirty: Cell::new(true),
            bounding_sphere: Default::default(),
            bounding_sphere_dirty: Cell::new(true),
        }
    }
}

impl Mesh {
    /// Creates a triangle mesh from vertex positions and triangle indices.
    pub fn new(vertices: Vec<Vector3<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            ..Default::default()
        }
    }

    /// Creates a mesh with an explicit primitive type. Index triples are kept
    /// even for non-triangle primitives so the data survives round trips, but
    /// only triangle lists are usable for collision.
    pub fn with_primitive_type(
        vertices: Vec<Vector3<f32>>,
        triangles: Vec<[u32; 3]>,
        primitive_type: PrimitiveType,
    ) -> Self {
        Self {
            vertices,
            triangles,
            primitive_type,
            ..Default::default()
        }
    }

    /// Creates an axis-aligned box mesh with the given half extents, centered
    /// at the local origin. Useful as a placeholder collision proxy.
    pub fn make_box(half_extents: Vector3<f32>) -> Self {
        let he = half_extents;
        let vertices = vec![
            Vector3::new(-he.x, -he.y, -he.z),
            Vector3::new(-he.x, -he.y, he.z),
            Vector3::new(he.x, -he.y, he.z),
            Vector3::new(he.x, -he.y, -he.z),
            Vector3::new(-he.x, he.y, -he.z),
            Vector3::new(-he.x, he.y, he.z),
            Vector3::new(he.x, he.y, he.z),
            Vector3::new(he.x, he.y, -he.z),
        ];
        let triangles = vec![
            [0, 1, 2],
            [0, 2, 3],
            [4, 6, 5],
            [4, 7, 6],
            [0, 4, 5],
            [0, 5, 1],
            [3, 2, 6],
            [3, 6, 7],
            [1, 5, 6],
            [1, 6, 2],
            [0, 3, 7],
            [0, 7, 4],
        ];
        Self::new(vertices, triangles)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vector3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }

    /// Replaces the vertex buffer, invalidating cached bounds.
    pub fn set_vertices(&mut self, vertices: Vec<Vector3<f32>>) {
        self.vertices = vertices;
        self.bounding_box_dirty.set(true);
        self.bounding_sphere_dirty.set(true);
    }

    /// Calculate bounding box in *local* coordinates. Cached between calls,
    /// recomputed only after the vertex buffer changes.
    pub fn bounding_box(&self) -> AxisAlignedBoundingBox {
        if self.bounding_box_dirty.get() {
            self.bounding_box
                .set(AxisAlignedBoundingBox::from_points(&self.vertices));
            self.bounding_box_dirty.set(false);
        }
        self.bounding_box.get()
    }

    /// Calculate bounding sphere in *local* coordinates. Cached between calls.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        if self.bounding_sphere_dirty.get() {
            self.bounding_sphere
                .set(BoundingSphere::from_points(&self.vertices));
            self.bounding_sphere_dirty.set(false);
        }
        self.bounding_sphere.get()
    }
}
