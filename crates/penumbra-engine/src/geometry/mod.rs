//! Occluder geometry.
//!
//! Hulls are stored counter-clockwise (positive signed area in a +Y-up frame).
//! Edge facing tests in `shadow` depend on that orientation.

mod hull;
pub mod polygon;

pub use hull::{Edge, Hull};
