//! Declarative rigid body definitions.
//!
//! A definition document is a RON file carrying a single `rigidbody`
//! namespace with the shape type and simulation properties:
//!
//! ```ron
//! (
//!     rigidbody: (
//!         type: HEIGHTFIELD,
//!         image: "terrain/height.png",
//!         friction: 0.8,
//!     )
//! )
//! ```
//!
//! Unknown properties inside the namespace are skipped; a document without
//! the namespace is rejected as a whole.

use crate::physics::{error::RigidBodyError, shape::ShapeType};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    rigidbody: RigidBodyDefinition,
}

fn default_friction() -> f32 {
    0.5
}

/// Parsed `rigidbody` properties. Shape-specific validation is deferred to
/// [`validate`](Self::validate) so a definition can also be assembled
/// field by field in code.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RigidBodyDefinition {
    /// Collision shape to build; the only field required for every shape.
    #[serde(rename = "type", default)]
    pub kind: Option<ShapeType>,
    #[serde(default)]
    pub mass: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
    #[serde(default)]
    pub linear_damping: f32,
    #[serde(default)]
    pub angular_damping: f32,
    #[serde(default)]
    pub kinematic: bool,
    /// Per-body gravity replacing world gravity.
    #[serde(default)]
    pub gravity: Option<[f32; 3]>,
    #[serde(default)]
    pub anisotropic_friction: Option<[f32; 3]>,
    /// Height source path, required for heightfield bodies.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Required for capsule bodies.
    #[serde(default)]
    pub radius: Option<f32>,
    /// Required for capsule bodies.
    #[serde(default)]
    pub height: Option<f32>,
}

impl Default for RigidBodyDefinition {
    fn default() -> Self {
        Self {
            kind: None,
            mass: 0.0,
            friction: default_friction(),
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            kinematic: false,
            gravity: None,
            anisotropic_friction: None,
            image: None,
            radius: None,
            height: None,
        }
    }
}

impl RigidBodyDefinition {
    /// Reads and parses a definition document.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RigidBodyError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            RigidBodyError::InvalidSource(format!(
                "failed to read rigid body definition {}: {err}",
                path.as_ref().display()
            ))
        })?;
        content.parse()
    }

    /// Checks that every field required by the chosen shape type is present
    /// and returns that type.
    pub fn validate(&self) -> Result<ShapeType, RigidBodyError> {
        let kind = self
            .kind
            .ok_or(RigidBodyError::MissingRequiredField("type"))?;
        match kind {
            ShapeType::Heightfield if self.image.is_none() => {
                Err(RigidBodyError::MissingRequiredField("image"))
            }
            ShapeType::Capsule if self.radius.is_none() || self.height.is_none() => {
                Err(RigidBodyError::MissingRequiredField("radius and height"))
            }
            _ => Ok(kind),
        }
    }
}

impl FromStr for RigidBodyDefinition {
    type Err = RigidBodyError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        // Optional properties are written bare in documents, never wrapped in `Some`.
        let options = ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME);
        let file: DefinitionFile = options.from_str(content).map_err(|err| {
            RigidBodyError::InvalidSource(format!(
                "expected a document with a single 'rigidbody' namespace: {err}"
            ))
        })?;
        Ok(file.rigidbody)
    }
}
