//! The force-field system: a vectorized catalogue of forces composable per
//! stage (spec.md §4.1).

pub mod field;
pub mod noise;

pub use field::{ForceField, ForceFieldKind, ForceFieldSystem};
pub use noise::Perlin;
