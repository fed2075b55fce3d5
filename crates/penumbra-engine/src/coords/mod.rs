//! Coordinate and color types shared by the shadow builder and the renderers.
//!
//! World space is the host's drawing space (the camera maps it to the back
//! buffer). With the default sprite-batch transform it is pixel space with a
//! top-left origin and +Y down.

mod color;
mod rect;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use viewport::Viewport;

/// World-space point or direction. `perp` turns counter-clockwise in a +Y-up
/// frame; `perp_dot` is the 2D cross product used for winding tests.
pub use glam::Vec2;
