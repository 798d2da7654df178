//! Contains minimal scene infrastructure the physics binding works against:
//! nodes, their transforms and attached geometry.

pub mod mesh;
pub mod node;
pub mod transform;
