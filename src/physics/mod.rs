//! Rigid body physics on top of rapier, bound to scene nodes.
//!
//! [`PhysicsWorld`] owns the native rapier sets and the stepping pipeline and
//! hands out opaque handles; [`rigid_body::RigidBody`] is the binding between
//! one scene node and one native body. Shape factories fit collision geometry
//! to node bounds ([`create_box`](PhysicsWorld::create_box) and friends) or
//! build it from raster height data
//! ([`create_heightfield`](PhysicsWorld::create_heightfield)).

pub mod definition;
pub mod error;
pub mod heightfield;
pub mod rigid_body;
pub mod shape;

use crate::{
    log::Log,
    physics::{error::RigidBodyError, heightfield::HeightMap, rigid_body::RigidBody},
    scene::mesh::{Mesh, PrimitiveType},
};
use fxhash::FxHashMap;
use nalgebra::{DMatrix, Point3, Vector3};
use rapier3d::{
    dynamics::{
        CCDSolver, GenericJoint, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters,
        IslandManager, MultibodyJointSet, RigidBody as NativeRigidBody, RigidBodyHandle,
        RigidBodySet,
    },
    geometry::{BroadPhase, Collider, ColliderHandle, ColliderSet, NarrowPhase, SharedShape},
    pipeline::PhysicsPipeline,
};

/// Physics world holding the native object sets and the stepping pipeline.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    /// World gravity applied to every dynamic body without a gravity override.
    pub gravity: Vector3<f32>,
    /// Simulation parameters, `dt` included.
    pub integration_parameters: IntegrationParameters,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    islands: IslandManager,
    /// Set of native rigid bodies.
    pub bodies: RigidBodySet,
    /// Set of native colliders.
    pub colliders: ColliderSet,
    /// Set of native impulse joints backing constraints.
    pub joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    // Per-body gravity replacements, applied as explicit forces each step.
    gravity_overrides: FxHashMap<RigidBodyHandle, Vector3<f32>>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: Vector3::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters::default(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            islands: IslandManager::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            gravity_overrides: FxHashMap::default(),
        }
    }

    /// Advances the simulation by one `integration_parameters.dt` tick.
    ///
    /// Forces and torques accumulated since the previous tick act for this
    /// single tick only and are cleared afterwards, so continuous pushes must
    /// be re-applied every frame.
    pub fn step(&mut self) {
        for (&handle, gravity) in self.gravity_overrides.iter() {
            if let Some(body) = self.bodies.get_mut(handle) {
                let force = gravity * body.mass();
                body.add_force(force, false);
            }
        }

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    /// Registers a native body together with its collider and returns their
    /// handles.
    pub fn add_collision_object(
        &mut self,
        name: &str,
        body: NativeRigidBody,
        collider: Collider,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.bodies.insert(body);
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        Log::info(format!("Native rigid body was created for node {name}"));

        (body_handle, collider_handle)
    }

    /// Removes a native body, its attached colliders and any joints that
    /// reference it.
    pub fn remove_collision_object(&mut self, body: RigidBodyHandle) {
        self.gravity_overrides.remove(&body);
        self.bodies.remove(
            body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Box shape fitted to a world-space extent, scaled per-axis.
    pub fn create_box(
        &self,
        min: Vector3<f32>,
        max: Vector3<f32>,
        scale: Vector3<f32>,
    ) -> SharedShape {
        let half_extents = (max - min).abs().component_mul(&scale).scale(0.5);
        SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
    }

    /// Sphere shape; non-uniform node scale collapses to its greatest
    /// component.
    pub fn create_sphere(&self, radius: f32, scale: Vector3<f32>) -> SharedShape {
        let uniform_scale = scale.x.max(scale.y).max(scale.z);
        SharedShape::ball(radius * uniform_scale)
    }

    /// Static triangle mesh shape built from the node's geometry.
    pub fn create_mesh(
        &self,
        mesh: &Mesh,
        scale: Vector3<f32>,
    ) -> Result<SharedShape, RigidBodyError> {
        if mesh.primitive_type() != PrimitiveType::Triangles {
            return Err(RigidBodyError::UnsupportedPrimitive(mesh.primitive_type()));
        }
        if mesh.vertices().is_empty() || mesh.triangles().is_empty() {
            return Err(RigidBodyError::InvalidSource(
                "mesh has no triangle data".to_owned(),
            ));
        }

        let vertices = mesh
            .vertices()
            .iter()
            .map(|vertex| Point3::from(vertex.component_mul(&scale)))
            .collect::<Vec<_>>();

        Ok(SharedShape::trimesh(vertices, mesh.triangles().to_vec()))
    }

    /// Heightfield shape spanning one world unit per grid cell. Samples are
    /// recentered around the vertical midpoint of the source extent, which is
    /// where the native shape puts its local origin.
    pub fn create_heightfield(&self, map: &HeightMap) -> Result<SharedShape, RigidBodyError> {
        if map.width() < 2 || map.height() < 2 {
            return Err(RigidBodyError::InvalidSource(format!(
                "a heightfield needs at least two samples per axis, got {}x{}",
                map.width(),
                map.height()
            )));
        }

        let y_mid = map.max_height() - 0.5 * (map.max_height() - map.min_height());
        let heights = DMatrix::from_fn(
            map.height() as usize,
            map.width() as usize,
            |row, col| map.data()[row * map.width() as usize + col] - y_mid,
        );
        let scale = Vector3::new((map.width() - 1) as f32, 1.0, (map.height() - 1) as f32);

        Ok(SharedShape::heightfield(heights, scale))
    }

    /// Capsule shape along the local y axis. `height` is the full height,
    /// caps included; a capsule no taller than its diameter becomes a sphere.
    pub fn create_capsule(&self, radius: f32, height: f32) -> SharedShape {
        let half_height = ((height - 2.0 * radius) * 0.5).max(0.0);
        if half_height > 0.0 {
            SharedShape::capsule(
                Point3::new(0.0, -half_height, 0.0),
                Point3::new(0.0, half_height, 0.0),
                radius,
            )
        } else {
            SharedShape::ball(radius)
        }
    }

    /// Joins two bodies with a native joint and records the constraint on
    /// both. Fails on bodies whose shape cannot participate in constraints.
    pub fn create_constraint(
        &mut self,
        first: &mut RigidBody,
        second: &mut RigidBody,
        joint: impl Into<GenericJoint>,
    ) -> Result<ImpulseJointHandle, RigidBodyError> {
        if !first.supports_constraints() || !second.supports_constraints() {
            let error = RigidBodyError::UnsupportedOperation(
                "constraints are not supported by mesh and heightfield rigid bodies",
            );
            Log::warn(error.to_string());
            return Err(error);
        }

        let handle = self
            .joints
            .insert(first.native_handle(), second.native_handle(), joint, true);
        first.add_constraint(handle);
        second.add_constraint(handle);
        Ok(handle)
    }

    /// Removes a constraint created by [`create_constraint`](Self::create_constraint).
    pub fn destroy_constraint(
        &mut self,
        first: &mut RigidBody,
        second: &mut RigidBody,
        constraint: ImpulseJointHandle,
    ) {
        self.joints.remove(constraint, true);
        first.remove_constraint(constraint);
        second.remove_constraint(constraint);
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
