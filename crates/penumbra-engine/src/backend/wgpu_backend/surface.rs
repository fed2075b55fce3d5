use crate::backend::SurfaceDesc;

/// GPU resources behind one offscreen surface.
///
/// Multisampled surfaces render into `msaa` and resolve into `color` at the
/// end of every pass, so `color` is always the sampleable texture.
pub(super) struct GpuSurface {
    pub desc: SurfaceDesc,
    color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    msaa: Option<(wgpu::Texture, wgpu::TextureView)>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl GpuSurface {
    pub(super) fn new(device: &wgpu::Device, desc: &SurfaceDesc) -> Self {
        let size = wgpu::Extent3d {
            width: desc.width.max(1),
            height: desc.height.max(1),
            depth_or_array_layers: 1,
        };
        let sample_count = desc.sample_count.max(1);

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        // Attachment-only companions share the surface's size and sample count.
        let attachment = |format: wgpu::TextureFormat| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(desc.label),
                size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        };
        let msaa = (sample_count > 1).then(|| attachment(desc.color_format));
        let depth = desc.depth_stencil_format.map(attachment);

        Self {
            desc: *desc,
            color,
            color_view,
            msaa,
            depth,
        }
    }

    /// `(render view, resolve target)` for a color attachment.
    pub(super) fn attachment(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        match &self.msaa {
            Some((_, msaa)) => (msaa, Some(&self.color_view)),
            None => (&self.color_view, None),
        }
    }

    pub(super) fn sample_count(&self) -> u32 {
        self.desc.sample_count.max(1)
    }

    pub(super) fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth.as_ref().map(|(_, view)| view)
    }

    /// GPU memory is released now rather than when the last view drops.
    pub(super) fn destroy(self) {
        self.color.destroy();
        for (texture, _) in self.msaa.into_iter().chain(self.depth) {
            texture.destroy();
        }
    }
}
