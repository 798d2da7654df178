//! Binding between a scene node and a native rigid body.
//!
//! A [`RigidBody`] derives its collision shape from the host node's geometry
//! (or from a raster height source), registers it in a [`PhysicsWorld`] and
//! exposes force application, constraint bookkeeping and heightfield surface
//! queries. Construction is explicit via [`RigidBody::new`] or declarative
//! via [`RigidBody::create`] from a `rigidbody` definition document.

use crate::{
    log::Log,
    physics::{
        definition::RigidBodyDefinition,
        error::RigidBodyError,
        heightfield::HeightMap,
        shape::{ColliderShapeDesc, ShapeType},
        PhysicsWorld,
    },
    resource::image::Image,
    scene::{
        mesh::Mesh,
        node::{SharedNode, TransformListener},
    },
};
use nalgebra::{Isometry3, Matrix4, Point3, Translation3, Vector3};
use parking_lot::Mutex;
use rapier3d::{
    dynamics::{ImpulseJointHandle, RigidBodyBuilder, RigidBodyHandle, RigidBodyType},
    geometry::{ColliderBuilder, ColliderHandle},
};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Lazily cached inverse of the owning node's world matrix.
///
/// The cache subscribes to the node's transform changes; a notification only
/// marks the value dirty, the actual inversion is deferred to the next
/// [`get`](Self::get). The dirty flag is checked and cleared under the value
/// lock, so a query never observes a stale inverse together with a clear flag.
pub struct InverseWorldTransform {
    dirty: AtomicBool,
    matrix: Mutex<Matrix4<f32>>,
}

impl InverseWorldTransform {
    pub fn new() -> Self {
        Self {
            dirty: AtomicBool::new(true),
            matrix: Mutex::new(Matrix4::identity()),
        }
    }

    /// Returns the cached inverse of `world`, recomputing it on the first
    /// call after an invalidation. A singular matrix falls back to identity.
    pub fn get(&self, world: &Matrix4<f32>) -> Matrix4<f32> {
        let mut matrix = self.matrix.lock();
        if self.dirty.swap(false, Ordering::AcqRel) {
            *matrix = world.try_inverse().unwrap_or_else(Matrix4::identity);
        }
        *matrix
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

impl Default for InverseWorldTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformListener for InverseWorldTransform {
    fn transform_changed(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

/// Simulation parameters of a rigid body. The zero mass default makes bodies
/// static.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RigidBodyParams {
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for RigidBodyParams {
    fn default() -> Self {
        Self {
            mass: 0.0,
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

/// Scene node bound to a native rigid body.
pub struct RigidBody {
    node: SharedNode,
    shape_type: ShapeType,
    native: RigidBodyHandle,
    native_collider: ColliderHandle,
    heightfield: Option<HeightMap>,
    inverse_world_transform: Option<Arc<InverseWorldTransform>>,
    constraints: Vec<ImpulseJointHandle>,
    mass: f32,
    friction: f32,
    kinematic: bool,
    anisotropic_friction: Vector3<f32>,
}

fn bounding_sphere_offset(mesh: &Mesh, scale: Vector3<f32>) -> Vector3<f32> {
    let center = mesh.bounding_sphere().center.component_mul(&scale);
    if center.norm_squared() > f32::EPSILON {
        -center
    } else {
        Vector3::zeros()
    }
}

impl RigidBody {
    /// Builds a collision shape for the node per the descriptor, creates the
    /// native body at the node's current pose and registers both in the
    /// world.
    ///
    /// The node's world scale is baked into the shape at construction time,
    /// native bodies do not scale dynamically. Shapes fitted to geometry
    /// (box, sphere, capsule) are recentered on the bounding sphere of the
    /// node's mesh; mesh shapes are left as authored. Mesh bodies are always
    /// static. Heightfield bodies subscribe to the node's transform changes
    /// to keep [`height_at`](Self::height_at) queries consistent.
    pub fn new(
        world: &mut PhysicsWorld,
        node: SharedNode,
        shape: ColliderShapeDesc,
        params: RigidBodyParams,
    ) -> Result<Self, RigidBodyError> {
        let shape_type = shape.shape_type();
        let mut mass = params.mass;
        let mut heightfield = None;

        let locked = node.lock();
        let scale = locked.global_scale();
        let mesh = locked.mesh().ok_or(RigidBodyError::UnsupportedOperation(
            "cannot fit a collision shape to a node without geometry",
        ))?;

        let (native_shape, center_of_mass_offset) = match &shape {
            ColliderShapeDesc::Box => {
                let bounds = mesh.bounding_box();
                (
                    world.create_box(bounds.min, bounds.max, scale),
                    bounding_sphere_offset(mesh, scale),
                )
            }
            ColliderShapeDesc::Sphere => (
                world.create_sphere(mesh.bounding_sphere().radius, scale),
                bounding_sphere_offset(mesh, scale),
            ),
            ColliderShapeDesc::Mesh => {
                if mass != 0.0 {
                    Log::warn(format!(
                        "Mesh rigid bodies are always static, ignoring mass {mass} on node {}.",
                        locked.name()
                    ));
                    mass = 0.0;
                }
                (world.create_mesh(mesh, scale)?, Vector3::zeros())
            }
            ColliderShapeDesc::Heightfield { image } => {
                let map = HeightMap::from_image(image, &mesh.bounding_box())?;
                let native_shape = world.create_heightfield(&map)?;
                // The native shape puts its origin at the vertical midpoint
                // of the height extent, compensate for that here.
                let offset = Vector3::new(
                    0.0,
                    -(map.max_height() - 0.5 * (map.max_height() - map.min_height())) / scale.y,
                    0.0,
                );
                heightfield = Some(map);
                let offset = if offset.norm_squared() > f32::EPSILON {
                    offset
                } else {
                    Vector3::zeros()
                };
                (native_shape, offset)
            }
            ColliderShapeDesc::Capsule { radius, height } => (
                world.create_capsule(*radius, *height),
                bounding_sphere_offset(mesh, scale),
            ),
        };

        let body_type = if mass > 0.0 {
            RigidBodyType::Dynamic
        } else {
            RigidBodyType::Fixed
        };
        let body = RigidBodyBuilder::new(body_type)
            .position(Isometry3::from_parts(
                Translation3::from(locked.global_position()),
                locked.local_transform().rotation(),
            ))
            .linear_damping(params.linear_damping)
            .angular_damping(params.angular_damping)
            .build();
        let collider = ColliderBuilder::new(native_shape)
            .translation(-center_of_mass_offset)
            .friction(params.friction)
            .restitution(params.restitution)
            .mass(mass)
            .build();

        let name = locked.name().to_owned();
        drop(locked);

        let (native, native_collider) = world.add_collision_object(&name, body, collider);

        let inverse_world_transform = if heightfield.is_some() {
            let inverse = Arc::new(InverseWorldTransform::new());
            node.lock().notify_on_transform_change(inverse.clone());
            Some(inverse)
        } else {
            None
        };

        Ok(Self {
            node,
            shape_type,
            native,
            native_collider,
            heightfield,
            inverse_world_transform,
            constraints: Vec::new(),
            mass,
            friction: params.friction,
            kinematic: false,
            anisotropic_friction: Vector3::new(1.0, 1.0, 1.0),
        })
    }

    /// Creates a rigid body from a parsed definition, then applies the
    /// kinematic flag, gravity and anisotropic friction it carries. On
    /// failure logs a warning and returns `None`.
    pub fn create(
        world: &mut PhysicsWorld,
        node: SharedNode,
        definition: &RigidBodyDefinition,
    ) -> Option<Self> {
        match Self::try_create(world, node, definition) {
            Ok(body) => Some(body),
            Err(error) => {
                Log::warn(error.to_string());
                None
            }
        }
    }

    /// Same as [`create`](Self::create), but reads the definition from a
    /// file first.
    pub fn create_from_file<P: AsRef<Path>>(
        world: &mut PhysicsWorld,
        node: SharedNode,
        path: P,
    ) -> Option<Self> {
        match Self::try_create_from_file(world, node, path) {
            Ok(body) => Some(body),
            Err(error) => {
                Log::warn(error.to_string());
                None
            }
        }
    }

    pub fn try_create(
        world: &mut PhysicsWorld,
        node: SharedNode,
        definition: &RigidBodyDefinition,
    ) -> Result<Self, RigidBodyError> {
        let kind = definition.validate()?;

        let shape = match kind {
            ShapeType::Box => ColliderShapeDesc::Box,
            ShapeType::Sphere => ColliderShapeDesc::Sphere,
            ShapeType::Mesh => ColliderShapeDesc::Mesh,
            ShapeType::Heightfield => {
                let Some(path) = definition.image.as_ref() else {
                    return Err(RigidBodyError::MissingRequiredField("image"));
                };
                let image = Image::load_from_file(path).map_err(|err| {
                    RigidBodyError::InvalidSource(format!(
                        "failed to load height image {}: {err}",
                        path.display()
                    ))
                })?;
                ColliderShapeDesc::Heightfield {
                    image: Arc::new(image),
                }
            }
            ShapeType::Capsule => {
                let (Some(radius), Some(height)) = (definition.radius, definition.height) else {
                    return Err(RigidBodyError::MissingRequiredField("radius and height"));
                };
                ColliderShapeDesc::Capsule { radius, height }
            }
        };

        let params = RigidBodyParams {
            mass: definition.mass,
            friction: definition.friction,
            restitution: definition.restitution,
            linear_damping: definition.linear_damping,
            angular_damping: definition.angular_damping,
        };

        let mut body = Self::new(world, node, shape, params)?;
        if definition.kinematic {
            body.set_kinematic(world, true);
        }
        if let Some(gravity) = definition.gravity {
            body.set_gravity(world, Vector3::from(gravity));
        }
        if let Some(friction) = definition.anisotropic_friction {
            body.set_anisotropic_friction(world, Vector3::from(friction));
        }
        Ok(body)
    }

    pub fn try_create_from_file<P: AsRef<Path>>(
        world: &mut PhysicsWorld,
        node: SharedNode,
        path: P,
    ) -> Result<Self, RigidBodyError> {
        let definition = RigidBodyDefinition::from_file(path)?;
        Self::try_create(world, node, &definition)
    }

    /// Surface elevation of the heightfield under the world-space `(x, z)`
    /// point.
    ///
    /// Returns a sentinel `0.0` and logs a warning when the body is not a
    /// heightfield or the query falls outside the grid; see
    /// [`try_height_at`](Self::try_height_at) for the fallible form.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        match self.try_height_at(x, z) {
            Ok(height) => height,
            Err(error) => {
                Log::warn(error.to_string());
                0.0
            }
        }
    }

    /// Fallible form of [`height_at`](Self::height_at).
    ///
    /// The query point is carried through the cached inverse of the node's
    /// world matrix into grid-local space, then rescaled into grid index
    /// space with the same off-by-one centering the grid was built with.
    /// The valid range is inclusive on both ends: queries up to one cell
    /// past the last sample still resolve against the grid edge.
    pub fn try_height_at(&self, x: f32, z: f32) -> Result<f32, RigidBodyError> {
        let (map, inverse) = match (&self.heightfield, &self.inverse_world_transform) {
            (Some(map), Some(inverse)) => (map, inverse),
            _ => {
                return Err(RigidBodyError::UnsupportedOperation(
                    "cannot get the height of a non-heightfield rigid body",
                ))
            }
        };

        let world_matrix = self.node.lock().global_transform();
        let local = inverse
            .get(&world_matrix)
            .transform_point(&Point3::new(x, 0.0, z));

        let width = map.width();
        let height = map.height();
        let grid_x = (local.x + 0.5 * (width - 1) as f32) * width as f32 / (width - 1) as f32;
        let grid_y = (local.z + 0.5 * (height - 1) as f32) * height as f32 / (height - 1) as f32;

        if grid_x < 0.0 || grid_x > width as f32 || grid_y < 0.0 || grid_y > height as f32 {
            return Err(RigidBodyError::OutOfBounds {
                x: grid_x,
                y: grid_y,
                width,
                height,
            });
        }

        Ok(map.sample(grid_x, grid_y))
    }

    /// Applies a force, optionally at an offset relative to the center of
    /// mass. Wakes the body up; negligible forces are dropped without waking
    /// it. Does nothing on non-dynamic bodies.
    pub fn apply_force(
        &mut self,
        world: &mut PhysicsWorld,
        force: Vector3<f32>,
        relative_position: Option<Vector3<f32>>,
    ) {
        if force.norm_squared() > f32::EPSILON {
            let body = &mut world.bodies[self.native];
            match relative_position {
                Some(relative_position) => {
                    let point = *body.center_of_mass() + relative_position;
                    body.add_force_at_point(force, point, true);
                }
                None => body.add_force(force, true),
            }
        }
    }

    /// Applies an impulse, optionally at an offset relative to the center of
    /// mass. Does nothing on non-dynamic bodies.
    pub fn apply_impulse(
        &mut self,
        world: &mut PhysicsWorld,
        impulse: Vector3<f32>,
        relative_position: Option<Vector3<f32>>,
    ) {
        if impulse.norm_squared() > f32::EPSILON {
            let body = &mut world.bodies[self.native];
            match relative_position {
                Some(relative_position) => {
                    let point = *body.center_of_mass() + relative_position;
                    body.apply_impulse_at_point(impulse, point, true);
                }
                None => body.apply_impulse(impulse, true),
            }
        }
    }

    /// Applies a torque. Does nothing on non-dynamic bodies.
    pub fn apply_torque(&mut self, world: &mut PhysicsWorld, torque: Vector3<f32>) {
        if torque.norm_squared() > f32::EPSILON {
            world.bodies[self.native].add_torque(torque, true);
        }
    }

    /// Applies a torque impulse. Does nothing on non-dynamic bodies.
    pub fn apply_torque_impulse(&mut self, world: &mut PhysicsWorld, torque: Vector3<f32>) {
        if torque.norm_squared() > f32::EPSILON {
            world.bodies[self.native].apply_torque_impulse(torque, true);
        }
    }

    /// Records a constraint this body participates in.
    pub fn add_constraint(&mut self, constraint: ImpulseJointHandle) {
        self.constraints.push(constraint);
    }

    /// Forgets a constraint this body participated in.
    pub fn remove_constraint(&mut self, constraint: ImpulseJointHandle) {
        self.constraints.retain(|handle| *handle != constraint);
    }

    #[inline]
    pub fn constraints(&self) -> &[ImpulseJointHandle] {
        &self.constraints
    }

    /// Whether this body can participate in constraints. Mesh and
    /// heightfield bodies cannot.
    #[inline]
    pub fn supports_constraints(&self) -> bool {
        self.shape_type.supports_constraints()
    }

    /// Switches the body between kinematic and simulated mode. Leaving
    /// kinematic mode restores the type implied by the body's mass.
    pub fn set_kinematic(&mut self, world: &mut PhysicsWorld, kinematic: bool) {
        self.kinematic = kinematic;
        let body_type = if kinematic {
            RigidBodyType::KinematicPositionBased
        } else if self.mass > 0.0 {
            RigidBodyType::Dynamic
        } else {
            RigidBodyType::Fixed
        };
        world.bodies[self.native].set_body_type(body_type, true);
    }

    /// Replaces world gravity with a per-body acceleration, applied as an
    /// explicit force on every simulation step.
    pub fn set_gravity(&mut self, world: &mut PhysicsWorld, gravity: Vector3<f32>) {
        world.bodies[self.native].set_gravity_scale(0.0, true);
        world.gravity_overrides.insert(self.native, gravity);
    }

    /// Sets per-axis friction scaling. The native backend supports a single
    /// friction coefficient, so the axes are averaged into it.
    pub fn set_anisotropic_friction(&mut self, world: &mut PhysicsWorld, friction: Vector3<f32>) {
        self.anisotropic_friction = friction;
        let mean = (friction.x + friction.y + friction.z) / 3.0;
        world.colliders[self.native_collider].set_friction(self.friction * mean);
    }

    /// Excludes the body and its collider from the simulation, or brings
    /// them back.
    pub fn set_enabled(&mut self, world: &mut PhysicsWorld, enabled: bool) {
        world.bodies[self.native].set_enabled(enabled);
        world.colliders[self.native_collider].set_enabled(enabled);
    }

    pub fn set_linear_velocity(&mut self, world: &mut PhysicsWorld, velocity: Vector3<f32>) {
        world.bodies[self.native].set_linvel(velocity, true);
    }

    pub fn set_angular_velocity(&mut self, world: &mut PhysicsWorld, velocity: Vector3<f32>) {
        world.bodies[self.native].set_angvel(velocity, true);
    }

    pub fn linear_velocity(&self, world: &PhysicsWorld) -> Vector3<f32> {
        *world.bodies[self.native].linvel()
    }

    pub fn angular_velocity(&self, world: &PhysicsWorld) -> Vector3<f32> {
        *world.bodies[self.native].angvel()
    }

    /// Copies the native pose back onto the node. Only dynamic bodies drive
    /// their node; call once per frame after stepping the world.
    pub fn sync_node(&self, world: &PhysicsWorld) {
        let body = &world.bodies[self.native];
        if body.is_dynamic() {
            let position = body.position();
            let mut node = self.node.lock();
            node.set_local_position(position.translation.vector);
            node.set_local_rotation(position.rotation);
        }
    }

    /// Pushes the node pose onto a kinematic body as its target for the next
    /// step. Call before stepping the world.
    pub fn sync_body(&self, world: &mut PhysicsWorld) {
        let body = &mut world.bodies[self.native];
        if body.is_kinematic() {
            let node = self.node.lock();
            let target = Isometry3::from_parts(
                Translation3::from(node.global_position()),
                node.local_transform().rotation(),
            );
            drop(node);
            body.set_next_kinematic_position(target);
        }
    }

    /// Removes the body and everything attached to it from the world,
    /// consuming the binding.
    pub fn remove_from_world(self, world: &mut PhysicsWorld) {
        world.remove_collision_object(self.native);
    }

    #[inline]
    pub fn node(&self) -> SharedNode {
        self.node.clone()
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    #[inline]
    pub fn heightfield(&self) -> Option<&HeightMap> {
        self.heightfield.as_ref()
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    pub fn is_static(&self, world: &PhysicsWorld) -> bool {
        world.bodies[self.native].is_fixed()
    }

    #[inline]
    pub fn anisotropic_friction(&self) -> Vector3<f32> {
        self.anisotropic_friction
    }

    #[inline]
    pub fn native_handle(&self) -> RigidBodyHandle {
        self.native
    }

    #[inline]
    pub fn native_collider(&self) -> ColliderHandle {
        self.native_collider
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        log::MessageKind,
        resource::image::{Image, ImagePixelFormat},
        scene::{mesh::PrimitiveType, node::SceneNodeBuilder, transform::TransformBuilder},
    };
    use nalgebra::UnitQuaternion;
    use rapier3d::dynamics::FixedJointBuilder;
    use std::sync::mpsc::channel;

    fn box_node(name: &str) -> SharedNode {
        SceneNodeBuilder::new()
            .with_name(name)
            .with_mesh(Mesh::make_box(Vector3::new(1.0, 1.0, 1.0)))
            .build_shared()
    }

    fn dynamic_params(mass: f32) -> RigidBodyParams {
        RigidBodyParams {
            mass,
            ..Default::default()
        }
    }

    /// Node whose mesh bounds span `[-2, 2]` in x/z and `[0, max_y]` in y,
    /// carrying a 2x2 height image: top row black, bottom row white.
    fn gradient_terrain(world: &mut PhysicsWorld, max_y: f32) -> RigidBody {
        let bytes = vec![0, 0, 0, 0, 0, 0, 255, 255, 255, 255, 255, 255];
        let image = Image::from_bytes(2, 2, ImagePixelFormat::RGB8, bytes).unwrap();
        let node = SceneNodeBuilder::new()
            .with_name("terrain")
            .with_mesh(Mesh::new(
                vec![
                    Vector3::new(-2.0, 0.0, -2.0),
                    Vector3::new(2.0, max_y, 2.0),
                ],
                vec![],
            ))
            .build_shared();
        RigidBody::new(
            world,
            node,
            ColliderShapeDesc::Heightfield {
                image: Arc::new(image),
            },
            RigidBodyParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_inverse_cache_reused_until_invalidated() {
        let inverse = InverseWorldTransform::new();
        let first = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let second = Matrix4::new_translation(&Vector3::new(-5.0, 0.0, 0.0));

        let cached = inverse.get(&first);
        assert_eq!(
            cached.transform_point(&Point3::new(1.0, 2.0, 3.0)),
            Point3::origin()
        );
        assert!(!inverse.is_dirty());

        // Without an invalidation the old inverse keeps being served.
        assert_eq!(inverse.get(&second), cached);

        inverse.transform_changed();
        assert!(inverse.is_dirty());
        let recomputed = inverse.get(&second);
        assert_eq!(
            recomputed.transform_point(&Point3::new(-5.0, 0.0, 0.0)),
            Point3::origin()
        );
        assert!(!inverse.is_dirty());
    }

    #[test]
    fn test_height_query_on_non_heightfield_body() {
        let mut world = PhysicsWorld::new();
        let body = RigidBody::new(
            &mut world,
            box_node("crate"),
            ColliderShapeDesc::Box,
            RigidBodyParams::default(),
        )
        .unwrap();

        assert_eq!(body.height_at(0.0, 0.0), 0.0);
        assert!(matches!(
            body.try_height_at(0.0, 0.0),
            Err(RigidBodyError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_flat_heightfield_elevation() {
        let mut world = PhysicsWorld::new();
        let image = Image::from_bytes(4, 4, ImagePixelFormat::RGB8, vec![255; 48]).unwrap();
        let node = SceneNodeBuilder::new()
            .with_name("terrain")
            .with_mesh(Mesh::new(
                vec![Vector3::new(-2.0, 0.0, -2.0), Vector3::new(2.0, 10.0, 2.0)],
                vec![],
            ))
            .build_shared();
        let body = RigidBody::new(
            &mut world,
            node,
            ColliderShapeDesc::Heightfield {
                image: Arc::new(image),
            },
            RigidBodyParams::default(),
        )
        .unwrap();

        assert_eq!(body.shape_type(), ShapeType::Heightfield);
        assert_eq!(body.try_height_at(0.0, 0.0).unwrap(), 9.9609375);
        assert_eq!(body.try_height_at(1.5, -1.5).unwrap(), 9.9609375);
    }

    #[test]
    fn test_height_query_follows_node_transform() {
        let mut world = PhysicsWorld::new();
        let body = gradient_terrain(&mut world, 16.0);

        // Grid rows run from 15.9375 at the near edge down to 0 at the far
        // edge, so the slope is visible to the queries below.
        assert_eq!(body.try_height_at(0.0, 0.0).unwrap(), 5.9765625);
        assert_eq!(body.try_height_at(0.0, 2.0).unwrap(), 0.0);

        body.node().lock().set_local_position(Vector3::new(0.0, 0.0, 2.0));

        // The same world point now maps two units closer to the near edge.
        assert_eq!(body.try_height_at(0.0, 2.0).unwrap(), 5.9765625);
    }

    #[test]
    fn test_height_query_out_of_bounds() {
        let mut world = PhysicsWorld::new();
        let body = gradient_terrain(&mut world, 16.0);

        assert!(matches!(
            body.try_height_at(10.0, 0.0),
            Err(RigidBodyError::OutOfBounds { .. })
        ));

        // The sentinel wrapper swallows the error but must still report it.
        let (tx, rx) = channel();
        Log::add_listener(tx);
        assert_eq!(body.height_at(10.0, 0.0), 0.0);
        assert!(rx.try_iter().any(|m| m.kind == MessageKind::Warning
            && m.content.contains("outside the range of the heightfield")));
    }

    #[test]
    fn test_geometry_fitted_shapes_are_recentered() {
        let mut world = PhysicsWorld::new();
        let node = SceneNodeBuilder::new()
            .with_name("offset box")
            .with_mesh(Mesh::new(
                vec![Vector3::new(1.0, -1.0, -1.0), Vector3::new(3.0, 1.0, 1.0)],
                vec![],
            ))
            .build_shared();
        let body = RigidBody::new(
            &mut world,
            node,
            ColliderShapeDesc::Box,
            RigidBodyParams::default(),
        )
        .unwrap();

        let collider = &world.colliders[body.native_collider()];
        assert_eq!(
            collider.position_wrt_parent().unwrap().translation.vector,
            Vector3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_mesh_bodies_are_always_static() {
        let mut world = PhysicsWorld::new();
        let body = RigidBody::new(
            &mut world,
            box_node("level"),
            ColliderShapeDesc::Mesh,
            dynamic_params(5.0),
        )
        .unwrap();

        assert!(body.is_static(&world));
        assert_eq!(body.mass(), 0.0);
    }

    #[test]
    fn test_mesh_bodies_require_triangle_lists() {
        let mut world = PhysicsWorld::new();
        let node = SceneNodeBuilder::new()
            .with_name("wire")
            .with_mesh(Mesh::with_primitive_type(
                vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)],
                vec![[0, 1, 0]],
                PrimitiveType::LineStrip,
            ))
            .build_shared();

        assert_eq!(
            RigidBody::new(
                &mut world,
                node,
                ColliderShapeDesc::Mesh,
                RigidBodyParams::default(),
            )
            .err(),
            Some(RigidBodyError::UnsupportedPrimitive(PrimitiveType::LineStrip))
        );
    }

    #[test]
    fn test_impulse_changes_velocity_by_inverse_mass() {
        let mut world = PhysicsWorld::new();
        let mut body = RigidBody::new(
            &mut world,
            box_node("crate"),
            ColliderShapeDesc::Box,
            dynamic_params(2.0),
        )
        .unwrap();

        body.apply_impulse(&mut world, Vector3::new(0.0, 6.0, 0.0), None);
        assert_eq!(
            body.linear_velocity(&world),
            Vector3::new(0.0, 3.0, 0.0)
        );
    }

    #[test]
    fn test_kinematic_toggle_restores_base_type() {
        let mut world = PhysicsWorld::new();
        let mut body = RigidBody::new(
            &mut world,
            box_node("door"),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();

        assert!(!body.is_kinematic(), "bodies start out simulated");
        body.set_kinematic(&mut world, true);
        assert!(body.is_kinematic());
        assert!(world.bodies[body.native_handle()].is_kinematic());

        body.set_kinematic(&mut world, false);
        assert!(world.bodies[body.native_handle()].is_dynamic());
    }

    #[test]
    fn test_gravity_override_disables_world_gravity() {
        let mut world = PhysicsWorld::new();
        let mut body = RigidBody::new(
            &mut world,
            box_node("balloon"),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();

        body.set_gravity(&mut world, Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(world.bodies[body.native_handle()].gravity_scale(), 0.0);

        world.step();
        assert!(body.linear_velocity(&world).y > 0.0);
    }

    #[test]
    fn test_anisotropic_friction_scales_collider_friction() {
        let mut world = PhysicsWorld::new();
        let mut body = RigidBody::new(
            &mut world,
            box_node("sled"),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();

        body.set_anisotropic_friction(&mut world, Vector3::new(0.5, 1.0, 1.5));
        assert_eq!(body.anisotropic_friction(), Vector3::new(0.5, 1.0, 1.5));
        assert_eq!(world.colliders[body.native_collider()].friction(), 0.5);
    }

    #[test]
    fn test_constraints_are_tracked_on_both_bodies() {
        let mut world = PhysicsWorld::new();
        let mut first = RigidBody::new(
            &mut world,
            box_node("first"),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();
        let mut second = RigidBody::new(
            &mut world,
            box_node("second"),
            ColliderShapeDesc::Sphere,
            dynamic_params(1.0),
        )
        .unwrap();

        let handle = world
            .create_constraint(&mut first, &mut second, FixedJointBuilder::new())
            .unwrap();
        assert_eq!(first.constraints(), &[handle]);
        assert_eq!(second.constraints(), &[handle]);

        world.destroy_constraint(&mut first, &mut second, handle);
        assert!(first.constraints().is_empty());
        assert!(second.constraints().is_empty());
    }

    #[test]
    fn test_constraints_rejected_on_heightfield_bodies() {
        let mut world = PhysicsWorld::new();
        let mut terrain = gradient_terrain(&mut world, 16.0);
        let mut ball = RigidBody::new(
            &mut world,
            box_node("ball"),
            ColliderShapeDesc::Sphere,
            dynamic_params(1.0),
        )
        .unwrap();

        assert!(!terrain.supports_constraints());

        let (tx, rx) = channel();
        Log::add_listener(tx);
        assert!(matches!(
            world.create_constraint(&mut terrain, &mut ball, FixedJointBuilder::new()),
            Err(RigidBodyError::UnsupportedOperation(_))
        ));
        assert!(rx.try_iter().any(|m| m.kind == MessageKind::Warning
            && m.content
                .contains("constraints are not supported by mesh and heightfield rigid bodies")));
        assert!(terrain.constraints().is_empty());
        assert!(ball.constraints().is_empty());
    }

    #[test]
    fn test_body_inherits_node_rotation_on_creation() {
        let mut world = PhysicsWorld::new();
        let rotation =
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let node = SceneNodeBuilder::new()
            .with_name("ramp")
            .with_mesh(Mesh::make_box(Vector3::new(1.0, 1.0, 1.0)))
            .with_local_transform(
                TransformBuilder::new()
                    .with_local_position(Vector3::new(0.0, 3.0, 0.0))
                    .with_local_rotation(rotation)
                    .build(),
            )
            .build_shared();

        let body = RigidBody::new(
            &mut world,
            node,
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();

        let position = world.bodies[body.native_handle()].position();
        assert_eq!(position.rotation, rotation);
        assert_eq!(position.translation.vector, Vector3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_dynamic_body_pose_syncs_to_node() {
        let mut world = PhysicsWorld::new();
        let node = box_node("crate");
        let body = RigidBody::new(
            &mut world,
            node.clone(),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();

        for _ in 0..10 {
            world.step();
        }
        body.sync_node(&world);

        assert!(node.lock().global_position().y < 0.0);
    }

    #[test]
    fn test_kinematic_body_follows_node() {
        let mut world = PhysicsWorld::new();
        let node = box_node("platform");
        let mut body = RigidBody::new(
            &mut world,
            node.clone(),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();
        body.set_kinematic(&mut world, true);

        node.lock().set_local_position(Vector3::new(0.0, 3.0, 0.0));
        body.sync_body(&mut world);
        world.step();

        assert_eq!(world.bodies[body.native_handle()].translation().y, 3.0);
    }

    #[test]
    fn test_create_from_definition_applies_post_construction_state() {
        let mut world = PhysicsWorld::new();
        let definition: RigidBodyDefinition = "(
            rigidbody: (
                type: BOX,
                mass: 1.0,
                kinematic: true,
                gravity: (0.0, 0.0, 0.0),
            )
        )"
        .parse()
        .unwrap();

        let body = RigidBody::try_create(&mut world, box_node("crate"), &definition).unwrap();
        assert!(body.is_kinematic());
        assert_eq!(world.bodies[body.native_handle()].gravity_scale(), 0.0);
    }

    #[test]
    fn test_create_returns_none_on_invalid_definition() {
        let mut world = PhysicsWorld::new();
        let definition = RigidBodyDefinition::default();

        let (tx, rx) = channel();
        Log::add_listener(tx);
        assert!(RigidBody::create(&mut world, box_node("crate"), &definition).is_none());
        assert!(rx.try_iter().any(|m| m.kind == MessageKind::Warning
            && m.content
                .contains("Rigid body definition is missing required field 'type'")));
    }

    #[test]
    fn test_removal_drops_native_objects() {
        let mut world = PhysicsWorld::new();
        let body = RigidBody::new(
            &mut world,
            box_node("crate"),
            ColliderShapeDesc::Box,
            dynamic_params(1.0),
        )
        .unwrap();
        let handle = body.native_handle();

        body.remove_from_world(&mut world);
        assert!(world.bodies.get(handle).is_none());
        assert!(world.colliders.iter().next().is_none());
    }
}
