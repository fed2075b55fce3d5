use thiserror::Error;

/// Errors reported by the lighting engine.
///
/// Call-order variants indicate a defective host integration. They are
/// returned from the offending call and never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PenumbraError {
    #[error("penumbra is not initialized; call `initialize` when setting up the host")]
    NotInitialized,

    #[error("`begin_draw` must be called before rendering a scene to be lit and calling `draw`")]
    DrawWithoutBegin,

    #[error("`pre_render` must be called before `pre_normal_mapped` or `render` in a frame")]
    RenderWithoutBegin,

    #[error(
        "render targets are {targets_width}x{targets_height} but the back buffer is \
         {back_buffer_width}x{back_buffer_height}; forward the resize before rendering"
    )]
    StaleRenderTargets {
        targets_width: u32,
        targets_height: u32,
        back_buffer_width: u32,
        back_buffer_height: u32,
    },

    #[error("failed to create render surface `{label}`: {reason}")]
    SurfaceCreation { label: &'static str, reason: String },

    #[error("invalid hull: {0}")]
    InvalidHull(&'static str),

    #[error("texture {0} is not registered with the render backend")]
    UnknownTexture(u64),
}

pub type Result<T> = std::result::Result<T, PenumbraError>;
