//! Scene-to-physics binding layer for the Veld engine.
//!
//! The crate connects scene nodes to native rigid bodies: collision shapes
//! are fitted to node geometry or built from raster height sources, and
//! heightfield bodies answer world-space surface queries through
//! [`physics::rigid_body::RigidBody::height_at`]. Bodies are created either
//! directly in code or from RON definition documents, see
//! [`physics::definition`].

#[macro_use]
extern crate lazy_static;

pub mod log;
pub mod math;
pub mod physics;
pub mod resource;
pub mod scene;

pub use nalgebra as algebra;
pub use parking_lot;
pub use rapier3d as rapier;
