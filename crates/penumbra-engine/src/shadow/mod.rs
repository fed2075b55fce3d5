//! Shadow geometry.
//!
//! For one light and a set of hulls, the builder produces wedges: umbra
//! polygons (fully occluded) extruded from the hull's casting edges, and
//! penumbra fans at silhouette vertices whose occlusion falls from 1 at the
//! umbra ray to 0 at the outer ray.
//!
//! Wedges are composed with max blending, so overlap never darkens a point
//! beyond the strongest single occluder.

mod builder;
mod wedge;

pub use builder::{build_shadow_geometry, ShadowBuilder};
pub use wedge::{occlusion_at, ShadowVertex, ShadowWedge, WedgeKind};
