use winit::window::Window;

use crate::device::{Acquire, Gpu};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-frame context passed to `core::App::on_frame`.
///
/// `'a` covers the callback; `'w` is the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    pub(crate) fn new(window: &'a Window, gpu: &'a mut Gpu<'w>, time: FrameTime) -> Self {
        Self { window, gpu, time }
    }

    /// Drawable size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Acquires the back buffer, lets `draw` record into it, then submits
    /// whatever `draw` returns and presents.
    ///
    /// Frames without a back buffer are skipped; an out-of-memory surface
    /// exits.
    pub fn present<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&Gpu<'w>, &wgpu::TextureView) -> Option<wgpu::CommandBuffer>,
    {
        let back_buffer = match self.gpu.acquire() {
            Acquire::Ready(b) => b,
            Acquire::Skip => return AppControl::Continue,
            Acquire::Fatal => {
                log::error!("surface out of memory; exiting");
                return AppControl::Exit;
            }
        };

        let commands = draw(&*self.gpu, &back_buffer.view);
        self.window.pre_present_notify();
        self.gpu.present(back_buffer, commands);
        AppControl::Continue
    }
}
