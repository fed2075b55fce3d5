//! Window surface and device for the lighting backend: swap-chain setup,
//! back-buffer acquisition and presentation.

mod gpu;

pub use gpu::{Acquire, BackBuffer, Gpu, GpuInit};
