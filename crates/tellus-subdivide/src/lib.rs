//! Adaptive view-dependent triangle subdivision: the recursive split rule
//! and the single-threaded batch collector that drives it over a mesh.

mod collector;
mod core;
mod params;

pub use collector::collect_subdivided;
pub use core::subdivide;
pub use params::{SubdivisionParams, target_level};
