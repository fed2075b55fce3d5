//! Penumbra engine crate.
//!
//! Real-time 2D lighting with soft shadows: lights and polygonal hulls
//! (convex or not) live in catalogs, shadow wedges are built on the CPU from
//! each hull's silhouette, and a [`RenderBackend`]
//! accumulates lights into a light map that is multiplied over the host's
//! scene. The platform + GPU runtime pieces used by the demo live here too.

pub mod backend;
pub mod camera;
pub mod catalog;
pub mod component;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod light;
pub mod shadow;
pub mod targets;

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;

pub use backend::{RenderBackend, WgpuBackend};
pub use catalog::{Catalog, CatalogEvent, HullId, Id, LightId};
pub use component::{Penumbra, PenumbraConfig};
pub use coords::{ColorRgba, Rect, Vec2, Viewport};
pub use engine::{FrameStats, PenumbraEngine};
pub use error::{PenumbraError, Result};
pub use geometry::Hull;
pub use light::{Light, LightKind, ShadowType, TextureRef};
