//! Host-facing rendering handles.
//!
//! Host painters draw the scene through these while the lighting engine
//! redirects the bound target.
//!
//! Convention: world geometry is in pixels (top-left origin, +Y down).

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
