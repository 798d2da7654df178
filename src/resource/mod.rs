//! Resource types consumed by the physics binding.

pub mod image;
