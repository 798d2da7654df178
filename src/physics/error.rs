//! Error taxonomy of the physics binding. Every error here is non-fatal at
//! this layer: public entry points log the error as a warning and return a
//! sentinel (`None` body, `0.0` height), leaving it to the caller to decide
//! whether to escalate.

use crate::{resource::image::ImagePixelFormat, scene::mesh::PrimitiveType};
use std::fmt::{Display, Formatter};

/// See module docs.
#[derive(Debug, Clone, PartialEq)]
pub enum RigidBodyError {
    /// Height source has an unsupported pixel layout; only 3- and 4-channel
    /// rasters can be turned into heightfields.
    UnsupportedFormat(ImagePixelFormat),
    /// Mesh collision shape requested for geometry with non-triangle primitives.
    UnsupportedPrimitive(PrimitiveType),
    /// Operation is not available for the body's collision shape.
    UnsupportedOperation(&'static str),
    /// Height query mapped outside the elevation grid extent.
    OutOfBounds {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    },
    /// Declarative construction is missing a field required by the chosen
    /// shape type.
    MissingRequiredField(&'static str),
    /// Properties document is absent, unreadable or does not carry the
    /// `rigidbody` namespace.
    InvalidSource(String),
}

impl Display for RigidBodyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RigidBodyError::UnsupportedFormat(format) => {
                write!(f, "Heightmap pixel format is not supported: {format:?}.")
            }
            RigidBodyError::UnsupportedPrimitive(primitive) => write!(
                f,
                "Mesh rigid bodies are only supported on meshes with primitive \
                 type equal to Triangles, got {primitive:?}."
            ),
            RigidBodyError::UnsupportedOperation(what) => {
                write!(f, "Unsupported operation: {what}.")
            }
            RigidBodyError::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Attempting to get height at point '{x}, {y}', which is outside \
                 the range of the heightfield with width {width} and height {height}."
            ),
            RigidBodyError::MissingRequiredField(field) => {
                write!(f, "Rigid body definition is missing required field '{field}'.")
            }
            RigidBodyError::InvalidSource(reason) => {
                write!(f, "Invalid rigid body source: {reason}")
            }
        }
    }
}

impl std::error::Error for RigidBodyError {}
