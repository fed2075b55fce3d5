//! Light sources.
//!
//! A light is a colored source that casts shadows on hulls. All variants share
//! position/range/color/intensity state in [`Light`]; the per-variant shape and
//! falloff live in [`LightKind`] and are dispatched once per light per frame.

mod kind;
mod light;
mod texture;

pub use kind::{LightKind, ShadowType};
pub use light::Light;
pub use texture::{TextureId, TextureRef};
