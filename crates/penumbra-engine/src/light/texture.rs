/// Backend-assigned texture identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Caller-owned texture used to shape a textured light.
///
/// The engine never owns the pixels; the render backend resolves the id when
/// drawing. Dimensions are captured at registration time so a light can derive
/// its default scale without touching the GPU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    #[inline]
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }
}
