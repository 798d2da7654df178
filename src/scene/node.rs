//! Scene node: a named object with a spatial transform and optional geometry.
//!
//! Nodes here are deliberately flat (no parent/child hierarchy): a node's
//! local transform *is* its global transform. Rigid bodies keep a shared
//! handle to their node and read its transform at query time; anything that
//! caches a derived value (such as the inverse world matrix of a heightfield
//! body) subscribes to transform changes through [`TransformListener`].

use crate::scene::{
    mesh::Mesh,
    transform::{Transform, TransformBuilder},
};
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Observer of node transform changes. Implementors are registered via
/// [`SceneNode::notify_on_transform_change`] and invoked synchronously from
/// every transform setter.
pub trait TransformListener: Send + Sync {
    /// Called after any of the node's transform properties was modified.
    fn transform_changed(&self);
}

/// Shared handle to a scene node. The application owns one strong reference,
/// every rigid body bound to the node owns another.
pub type SharedNode = Arc<Mutex<SceneNode>>;

/// See module docs.
pub struct SceneNode {
    name: String,
    local_transform: Transform,
    mesh: Option<Mesh>,
    listeners: Vec<Weak<dyn TransformListener>>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: Default::default(),
            local_transform: Transform::identity(),
            mesh: None,
            listeners: Default::default(),
        }
    }
}

impl SceneNode {
    /// Returns name of node.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns shared reference to local transform of a node, can be used to
    /// read position/rotation/scale of the node.
    #[inline]
    pub fn local_transform(&self) -> &Transform {
        &self.local_transform
    }

    /// Replaces the whole local transform and notifies subscribers.
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local_transform = transform;
        self.notify_transform_changed();
    }

    /// Sets node position and notifies subscribers.
    pub fn set_local_position(&mut self, position: Vector3<f32>) {
        self.local_transform.set_position(position);
        self.notify_transform_changed();
    }

    /// Sets node rotation and notifies subscribers.
    pub fn set_local_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.local_transform.set_rotation(rotation);
        self.notify_transform_changed();
    }

    /// Sets node scale and notifies subscribers. Keep in mind that collision
    /// shapes bake the node scale in at rigid-body creation time.
    pub fn set_local_scale(&mut self, scale: Vector3<f32>) {
        self.local_transform.set_scale(scale);
        self.notify_transform_changed();
    }

    /// Shifts node position by the given vector and notifies subscribers.
    pub fn offset(&mut self, vec: Vector3<f32>) {
        self.local_transform.offset(vec);
        self.notify_transform_changed();
    }

    /// Returns world transform matrix of the node. Since nodes are flat, it is
    /// the local transform matrix.
    #[inline]
    pub fn global_transform(&self) -> Matrix4<f32> {
        self.local_transform.matrix()
    }

    /// Returns world position of the node.
    #[inline]
    pub fn global_position(&self) -> Vector3<f32> {
        self.local_transform.position()
    }

    /// Returns world scale of the node.
    #[inline]
    pub fn global_scale(&self) -> Vector3<f32> {
        self.local_transform.scale()
    }

    /// Returns the node's geometry, if any.
    #[inline]
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Subscribes a listener to transform changes. The node keeps only a weak
    /// reference: once the subscriber is dropped it is pruned automatically on
    /// the next notification.
    pub fn notify_on_transform_change(&mut self, listener: Arc<dyn TransformListener>) {
        self.listeners.push(Arc::downgrade(&listener));
    }

    fn notify_transform_changed(&mut self) {
        self.listeners.retain(|listener| match listener.upgrade() {
            Some(listener) => {
                listener.transform_changed();
                true
            }
            None => false,
        });
    }
}

/// Scene node builder, a declarative way to assemble nodes.
#[derive(Default)]
pub struct SceneNodeBuilder {
    name: String,
    local_transform: Option<Transform>,
    mesh: Option<Mesh>,
}

impl SceneNodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets desired name.
    pub fn with_name<N: AsRef<str>>(mut self, name: N) -> Self {
        self.name = name.as_ref().to_owned();
        self
    }

    /// Sets desired local transform.
    pub fn with_local_transform(mut self, transform: Transform) -> Self {
        self.local_transform = Some(transform);
        self
    }

    /// Sets desired geometry.
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Creates a plain node instance.
    pub fn build(self) -> SceneNode {
        SceneNode {
            name: self.name,
            local_transform: self
                .local_transform
                .unwrap_or_else(|| TransformBuilder::new().build()),
            mesh: self.mesh,
            listeners: Default::default(),
        }
    }

    /// Creates a node wrapped into the shared handle rigid bodies expect.
    pub fn build_shared(self) -> SharedNode {
        Arc::new(Mutex::new(self.build()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        invocations: AtomicUsize,
    }

    impl TransformListener for CountingListener {
        fn transform_changed(&self) {
            self.invocations.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_listener_receives_transform_changes() {
        let listener = Arc::new(CountingListener {
            invocations: AtomicUsize::new(0),
        });

        let mut node = SceneNodeBuilder::new().with_name("Terrain").build();
        node.notify_on_transform_change(listener.clone());

        node.set_local_position(Vector3::new(1.0, 0.0, 0.0));
        node.set_local_scale(Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(listener.invocations.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_dead_listeners_are_pruned() {
        let mut node = SceneNodeBuilder::new().build();

        let listener = Arc::new(CountingListener {
            invocations: AtomicUsize::new(0),
        });
        node.notify_on_transform_change(listener.clone());
        assert_eq!(node.listeners.len(), 1);

        drop(listener);
        node.set_local_position(Vector3::new(0.0, 1.0, 0.0));
        assert!(node.listeners.is_empty());
    }

    #[test]
    fn test_global_transform_is_local_transform() {
        let mut node = SceneNodeBuilder::new().build();
        node.set_local_position(Vector3::new(3.0, 4.0, 5.0));
        let m = node.global_transform();
        assert_eq!(m[(0, 3)], 3.0);
        assert_eq!(m[(1, 3)], 4.0);
        assert_eq!(m[(2, 3)], 5.0);
        assert_eq!(node.global_position(), Vector3::new(3.0, 4.0, 5.0));
    }
}
