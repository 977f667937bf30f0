//! Pure domain types with minimal dependencies
//!
//! Types here carry no rendering or transport dependencies so every other
//! module can share them.

pub mod geometry;
pub mod stroke;

pub use geometry::*;
pub use stroke::*;
