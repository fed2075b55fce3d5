use std::collections::HashMap;

use super::common::{masked_additive_blend, occlusion_max_blend, OcclusionVertex, TargetKey};

/// Render pipelines for one attachment configuration.
pub(super) struct PassPipelines {
    pub reset: wgpu::RenderPipeline,
    pub occlusion: wgpu::RenderPipeline,
    pub light: wgpu::RenderPipeline,
    pub composite: wgpu::RenderPipeline,
}

/// Shader modules and bind group layouts, plus pipelines built lazily per
/// target format and sample count.
pub(super) struct Pipelines {
    occlusion_shader: wgpu::ShaderModule,
    light_shader: wgpu::ShaderModule,
    composite_shader: wgpu::ShaderModule,

    pub transform_bgl: wgpu::BindGroupLayout,
    pub light_bgl: wgpu::BindGroupLayout,
    pub composite_bgl: wgpu::BindGroupLayout,

    reset_layout: wgpu::PipelineLayout,
    occlusion_layout: wgpu::PipelineLayout,
    light_layout: wgpu::PipelineLayout,
    composite_layout: wgpu::PipelineLayout,

    by_target: HashMap<TargetKey, PassPipelines>,
}

impl Pipelines {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let occlusion_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("penumbra occlusion shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/occlusion.wgsl").into()),
        });
        let light_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("penumbra light shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/light.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("penumbra composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let transform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("penumbra transform bgl"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let light_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("penumbra light bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1),
                texture_entry(2),
                sampler_entry(3),
            ],
        });

        let composite_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("penumbra composite bgl"),
            entries: &[texture_entry(0), texture_entry(1), sampler_entry(2)],
        });

        let layout = |label: &str, bgls: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: bgls,
                immediate_size: 0,
            })
        };

        let reset_layout = layout("penumbra reset pipeline layout", &[]);
        let occlusion_layout = layout("penumbra occlusion pipeline layout", &[&transform_bgl]);
        let light_layout = layout("penumbra light pipeline layout", &[&light_bgl]);
        let composite_layout = layout("penumbra composite pipeline layout", &[&composite_bgl]);

        Self {
            occlusion_shader,
            light_shader,
            composite_shader,
            transform_bgl,
            light_bgl,
            composite_bgl,
            reset_layout,
            occlusion_layout,
            light_layout,
            composite_layout,
            by_target: HashMap::new(),
        }
    }

    pub(super) fn ensure(&mut self, device: &wgpu::Device, key: TargetKey) -> &PassPipelines {
        if !self.by_target.contains_key(&key) {
            log::debug!(
                "building penumbra pipelines for {:?} x{}",
                key.format,
                key.sample_count
            );
            let built = self.build(device, key);
            self.by_target.insert(key, built);
        }
        &self.by_target[&key]
    }

    fn build(&self, device: &wgpu::Device, key: TargetKey) -> PassPipelines {
        let reset = pipeline(
            device,
            &PipelineSpec {
                label: "penumbra occlusion reset pipeline",
                layout: &self.reset_layout,
                module: &self.occlusion_shader,
                vs: "vs_fullscreen",
                fs: "fs_reset",
                buffers: &[],
                blend: None,
                write_mask: wgpu::ColorWrites::ALPHA,
            },
            key,
        );
        let occlusion = pipeline(
            device,
            &PipelineSpec {
                label: "penumbra occlusion pipeline",
                layout: &self.occlusion_layout,
                module: &self.occlusion_shader,
                vs: "vs_main",
                fs: "fs_main",
                buffers: &[OcclusionVertex::layout()],
                blend: Some(occlusion_max_blend()),
                write_mask: wgpu::ColorWrites::ALPHA,
            },
            key,
        );
        let light = pipeline(
            device,
            &PipelineSpec {
                label: "penumbra light pipeline",
                layout: &self.light_layout,
                module: &self.light_shader,
                vs: "vs_main",
                fs: "fs_main",
                buffers: &[],
                blend: Some(masked_additive_blend()),
                write_mask: wgpu::ColorWrites::COLOR,
            },
            key,
        );
        let composite = pipeline(
            device,
            &PipelineSpec {
                label: "penumbra composite pipeline",
                layout: &self.composite_layout,
                module: &self.composite_shader,
                vs: "vs_main",
                fs: "fs_main",
                buffers: &[],
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            },
            key,
        );
        PassPipelines { reset, occlusion, light, composite }
    }
}

struct PipelineSpec<'a> {
    label: &'static str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vs: &'static str,
    fs: &'static str,
    buffers: &'a [wgpu::VertexBufferLayout<'static>],
    blend: Option<wgpu::BlendState>,
    write_mask: wgpu::ColorWrites,
}

fn pipeline(device: &wgpu::Device, spec: &PipelineSpec<'_>, key: TargetKey) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: wgpu::VertexState {
            module: spec.module,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: spec.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.module,
            entry_point: Some(spec.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend: spec.blend,
                write_mask: spec.write_mask,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: key.sample_count,
            ..Default::default()
        },
        multiview_mask: None,
        cache: None,
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}
