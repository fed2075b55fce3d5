use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::backend::PresentationParams;

/// Swap-chain preferences for the window surface.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Lighting is computed in linear space; an sRGB back buffer encodes the
    /// composite on store.
    pub prefer_srgb: bool,
    pub present_mode: wgpu::PresentMode,
    /// Hint only.
    pub frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            frame_latency: 2,
        }
    }
}

/// Window surface plus the device the lighting backend renders with.
///
/// The surface borrows the window for `'w`; the runtime keeps both in one
/// self-referencing entry.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    adapter: wgpu::AdapterInfo,
}

/// Acquired swap-chain image and a view of it.
pub struct BackBuffer {
    texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

/// Outcome of [`Gpu::acquire`].
pub enum Acquire {
    Ready(BackBuffer),
    /// No image this frame; the surface was reconfigured if needed.
    Skip,
    /// The device ran out of memory.
    Fatal,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Recovery {
    Reconfigure,
    Skip,
    Fatal,
}

fn recovery_for(err: &SurfaceError) -> Recovery {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated => Recovery::Reconfigure,
        SurfaceError::OutOfMemory => Recovery::Fatal,
        SurfaceError::Timeout | SurfaceError::Other => Recovery::Skip,
    }
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no adapter can present to this window")?;

        // Every pass uses core features only.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("penumbra device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open the lighting device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = pick_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.frame_latency,
        };
        surface.configure(&device, &config);

        Ok(Gpu {
            surface,
            device,
            queue,
            config,
            adapter: adapter.get_info(),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter
    }

    /// Back-buffer description for the lighting backend.
    pub fn presentation(&self) -> PresentationParams {
        PresentationParams {
            width: self.config.width,
            height: self.config.height,
            color_format: self.config.format,
            depth_stencil_format: None,
            sample_count: 1,
        }
    }

    /// Reconfigures the swap chain. Minimized windows report 0x0, which a
    /// surface cannot take; the previous size is kept until a real one arrives.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Next swap-chain image. Lost and outdated surfaces are reconfigured and
    /// the frame is skipped.
    pub fn acquire(&mut self) -> Acquire {
        match self.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Acquire::Ready(BackBuffer { texture, view })
            }
            Err(err) => match recovery_for(&err) {
                Recovery::Reconfigure => {
                    log::debug!("surface {err}; reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                    Acquire::Skip
                }
                Recovery::Skip => {
                    log::debug!("surface {err}; skipping frame");
                    Acquire::Skip
                }
                Recovery::Fatal => Acquire::Fatal,
            },
        }
    }

    /// Submits the frame's commands, then presents.
    pub fn present(&self, back_buffer: BackBuffer, commands: Option<wgpu::CommandBuffer>) {
        self.queue.submit(commands);
        back_buffer.texture.present();
    }
}

/// sRGB BGRA/RGBA when preferred and offered, else the surface's first choice.
fn pick_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    const SRGB: [wgpu::TextureFormat; 2] = [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ];
    prefer_srgb
        .then(|| SRGB.into_iter().find(|f| formats.contains(f)))
        .flatten()
        .or_else(|| formats.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    // ── format choice ────────────────────────────────────────────────────

    #[test]
    fn srgb_is_picked_when_offered() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(pick_format(&formats, true), Some(F::Rgba8UnormSrgb));
    }

    #[test]
    fn first_format_without_srgb_preference() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(pick_format(&formats, false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn falls_back_when_no_srgb_format_exists() {
        assert_eq!(pick_format(&[F::Rgb10a2Unorm], true), Some(F::Rgb10a2Unorm));
        assert_eq!(pick_format(&[], true), None);
    }

    // ── surface errors ───────────────────────────────────────────────────

    #[test]
    fn lost_surfaces_are_reconfigured() {
        assert_eq!(recovery_for(&SurfaceError::Lost), Recovery::Reconfigure);
        assert_eq!(recovery_for(&SurfaceError::Outdated), Recovery::Reconfigure);
    }

    #[test]
    fn only_out_of_memory_is_fatal() {
        assert_eq!(recovery_for(&SurfaceError::OutOfMemory), Recovery::Fatal);
        assert_eq!(recovery_for(&SurfaceError::Timeout), Recovery::Skip);
        assert_eq!(recovery_for(&SurfaceError::Other), Recovery::Skip);
    }
}
