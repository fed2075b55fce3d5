//! Host draw-loop contract.
//!
//! ```text
//! initialize()                      once, after the device exists
//! per frame:
//!   begin_draw()                    host scene is captured from here on
//!   ...host draws the scene...
//!   begin_normal_mapped()           optional
//!   ...host draws normals...
//!   draw(frame_time)                lights + composite into the host target
//! ```

use glam::Mat4;

use crate::backend::RenderBackend;
use crate::catalog::Catalog;
use crate::coords::ColorRgba;
use crate::engine::PenumbraEngine;
use crate::error::{PenumbraError, Result};
use crate::geometry::Hull;
use crate::light::Light;
use crate::time::FrameTime;

/// Configuration applied by [`Penumbra::new`]; every field has a setter too.
#[derive(Debug, Clone, PartialEq)]
pub struct PenumbraConfig {
    /// Promotes engine diagnostics to `info`.
    pub debug: bool,
    /// Alpha is ignored.
    pub ambient_color: ColorRgba,
    /// Custom world transform.
    pub transform: Mat4,
    /// Apply the pixel-space projection a 2D sprite batch would use on top of
    /// `transform`.
    pub sprite_batch_transform_enabled: bool,
    pub normal_mapped_lighting_enabled: bool,
}

impl Default for PenumbraConfig {
    fn default() -> Self {
        Self {
            debug: false,
            ambient_color: ColorRgba::new(0.2, 0.2, 0.2, 1.0),
            transform: Mat4::IDENTITY,
            sprite_batch_transform_enabled: true,
            normal_mapped_lighting_enabled: false,
        }
    }
}

/// Lighting component embedded in a host draw loop.
pub struct Penumbra<B: RenderBackend> {
    engine: PenumbraEngine<B>,
    visible: bool,
    initialized: bool,
    begin_draw_called: bool,
    last_frame: Option<FrameTime>,
}

impl<B: RenderBackend> Penumbra<B> {
    pub fn new(backend: B, config: PenumbraConfig) -> Self {
        let mut engine = PenumbraEngine::new(backend);
        engine.set_debug(config.debug);
        engine.ambient_color = config.ambient_color;
        engine.camera.custom = config.transform;
        engine.camera.sprite_batch_transform_enabled = config.sprite_batch_transform_enabled;
        engine.normal_mapped_lighting_enabled = config.normal_mapped_lighting_enabled;
        Self {
            engine,
            visible: true,
            initialized: false,
            begin_draw_called: false,
            last_frame: None,
        }
    }

    /// Creates GPU resources. Call once when setting up the host.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            log::debug!("penumbra already initialized");
            return Ok(());
        }
        self.engine.load()?;
        self.initialized = true;
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Starts capturing the host scene. Call before drawing anything that
    /// should be lit.
    pub fn begin_draw(&mut self) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        self.ensure_initialized()?;
        self.engine.pre_render()?;
        self.begin_draw_called = true;
        Ok(())
    }

    /// Starts capturing host normals. Optional; call after the scene pass.
    pub fn begin_normal_mapped(&mut self) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        self.ensure_initialized()?;
        if !self.begin_draw_called {
            return Err(PenumbraError::DrawWithoutBegin);
        }
        self.engine.pre_normal_mapped()
    }

    /// Lights the captured scene into the host's target.
    ///
    /// A frame that was begun while visible is always completed, so the host
    /// bindings are restored even if visibility changed mid-frame.
    pub fn draw(&mut self, time: FrameTime) -> Result<()> {
        if !self.visible && !self.begin_draw_called {
            return Ok(());
        }
        self.ensure_initialized()?;
        if !self.begin_draw_called {
            return Err(PenumbraError::DrawWithoutBegin);
        }
        self.begin_draw_called = false;

        if self.last_frame.is_none() {
            log::debug!("penumbra first frame");
        }
        self.last_frame = Some(time);
        self.engine.render()
    }

    /// Forward of the host's back-buffer resize.
    pub fn on_back_buffer_resized(&mut self, width: u32, height: u32) -> Result<()> {
        self.engine.on_back_buffer_resized(width, height)
    }

    /// Releases GPU resources. Safe to call repeatedly; `initialize` again
    /// to reuse the component.
    pub fn dispose(&mut self) {
        self.engine.dispose();
        self.initialized = false;
        self.begin_draw_called = false;
    }

    // ── configuration ─────────────────────────────────────────────────────

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// While invisible, `begin_draw`, `begin_normal_mapped` and `draw` do
    /// nothing and the host draws straight to its own target.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn debug(&self) -> bool {
        self.engine.debug()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.engine.set_debug(debug);
    }

    #[inline]
    pub fn ambient_color(&self) -> ColorRgba {
        self.engine.ambient_color
    }

    pub fn set_ambient_color(&mut self, color: ColorRgba) {
        self.engine.ambient_color = color;
    }

    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.engine.camera.custom
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.engine.camera.custom = transform;
    }

    #[inline]
    pub fn sprite_batch_transform_enabled(&self) -> bool {
        self.engine.camera.sprite_batch_transform_enabled
    }

    pub fn set_sprite_batch_transform_enabled(&mut self, enabled: bool) {
        self.engine.camera.sprite_batch_transform_enabled = enabled;
    }

    #[inline]
    pub fn normal_mapped_lighting_enabled(&self) -> bool {
        self.engine.normal_mapped_lighting_enabled
    }

    pub fn set_normal_mapped_lighting_enabled(&mut self, enabled: bool) {
        self.engine.normal_mapped_lighting_enabled = enabled;
    }

    // ── scene content ─────────────────────────────────────────────────────

    #[inline]
    pub fn lights(&self) -> &Catalog<Light> {
        &self.engine.lights
    }

    #[inline]
    pub fn lights_mut(&mut self) -> &mut Catalog<Light> {
        &mut self.engine.lights
    }

    #[inline]
    pub fn hulls(&self) -> &Catalog<Hull> {
        &self.engine.hulls
    }

    #[inline]
    pub fn hulls_mut(&mut self) -> &mut Catalog<Hull> {
        &mut self.engine.hulls
    }

    #[inline]
    pub fn engine(&self) -> &PenumbraEngine<B> {
        &self.engine
    }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut PenumbraEngine<B> {
        &mut self.engine
    }

    /// Time passed to the last `draw`.
    #[inline]
    pub fn last_frame_time(&self) -> Option<FrameTime> {
        self.last_frame
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PenumbraError::NotInitialized)
        }
    }
}
