//! Geometry, color, and shading models for the `epsvg` interpreter.
//!
//! This crate is independent of the PostScript object model: everything
//! here works on plain `f64` values, [`kurbo`] points, and owned vectors.
//! The interpreter crate (`epsvg-core`) builds graphics state on top of
//! these types; output backends consume them.

pub mod color;
pub mod error;
pub mod matrix;
pub mod path;
pub mod shading;
pub mod types;
