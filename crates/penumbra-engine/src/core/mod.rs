//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! hosts that drive the lighting engine, with a consistent per-frame context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
