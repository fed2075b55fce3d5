mod painter;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use penumbra_engine::core::{App, AppControl, FrameCtx};
use penumbra_engine::device::{Gpu, GpuInit};
use penumbra_engine::engine::FLAT_NORMAL;
use penumbra_engine::logging::{init_logging, LoggingConfig};
use penumbra_engine::render::RenderCtx;
use penumbra_engine::time::FrameTime;
use penumbra_engine::window::{Runtime, RuntimeConfig};
use penumbra_engine::{
    ColorRgba, Hull, HullId, Light, LightId, Penumbra, PenumbraConfig, Rect, ShadowType, Vec2,
    Viewport, WgpuBackend,
};

use painter::{ScenePainter, SceneVertex};

const BACKGROUND: ColorRgba = ColorRgba::new(0.55, 0.52, 0.48, 1.0);
const GLOW_SIZE: u32 = 64;

struct SceneHull {
    id: HullId,
    color: [f32; 4],
}

struct Scene {
    hulls: Vec<SceneHull>,
    spinner: HullId,
    cursor_light: LightId,
    spot: LightId,
    glow: LightId,
}

impl Scene {
    fn populate(penumbra: &mut Penumbra<WgpuBackend>) -> Result<Self> {
        let glow_texture = radial_glow_texture(penumbra.engine_mut().backend_mut());

        let lights = penumbra.lights_mut();
        let cursor_light = lights.add(
            Light::point(Vec2::new(200.0, 200.0), 520.0, ColorRgba::rgb(1.0, 0.85, 0.6))
                .with_source_radius(14.0),
        );
        let spot = lights.add(
            Light::spot(
                Vec2::new(1100.0, 80.0),
                900.0,
                ColorRgba::rgb(0.4, 0.6, 1.0),
                2.3,
                0.9,
            )
            .with_source_radius(6.0)
            .with_intensity(1.4),
        );
        let glow = lights.add(
            Light::textured(Vec2::new(640.0, 560.0), Some(glow_texture), Some(Vec2::new(360.0, 360.0)))
                .with_intensity(0.8)
                .with_shadow_type(ShadowType::Illuminated),
        );

        let hulls = penumbra.hulls_mut();
        let mut scene_hulls = Vec::new();
        let mut add = |hull: Hull, color: [f32; 4]| {
            let id = hulls.add(hull);
            scene_hulls.push(SceneHull { id, color });
            id
        };

        add(Hull::rectangle(Rect::new(300.0, 250.0, 50.0, 100.0))?, [0.7, 0.25, 0.2, 1.0]);
        add(Hull::regular(Vec2::new(820.0, 260.0), 45.0, 12)?, [0.2, 0.5, 0.3, 1.0]);
        add(Hull::regular(Vec2::new(520.0, 420.0), 30.0, 5)?, [0.75, 0.7, 0.2, 1.0]);

        let mut bar = Hull::rectangle(Rect::new(-90.0, -12.0, 180.0, 24.0))?;
        bar.set_position(Vec2::new(980.0, 480.0));
        let spinner = add(bar, [0.3, 0.3, 0.55, 1.0]);

        Ok(Self {
            hulls: scene_hulls,
            spinner,
            cursor_light,
            spot,
            glow,
        })
    }

    fn animate(&self, penumbra: &mut Penumbra<WgpuBackend>, cursor: Vec2, time: FrameTime) {
        if let Some(hull) = penumbra.hulls_mut().get_mut(self.spinner) {
            hull.set_rotation(hull.rotation() + time.dt * 0.8);
        }

        let lights = penumbra.lights_mut();
        if let Some(light) = lights.get_mut(self.cursor_light) {
            light.position = cursor;
        }
        if let Some(light) = lights.get_mut(self.spot) {
            light.rotation = 2.3 + (time.elapsed * 0.6).sin() * 0.4;
        }
        if let Some(light) = lights.get_mut(self.glow) {
            light.rotation += time.dt * 0.3;
        }
    }

    /// Scene colors, one fan per hull.
    fn color_triangles(&self, penumbra: &Penumbra<WgpuBackend>) -> Vec<SceneVertex> {
        let mut out = Vec::new();
        for h in &self.hulls {
            let Some(hull) = penumbra.hulls().get(h.id) else { continue };
            let points = hull.points();
            for i in 1..points.len() - 1 {
                for p in [points[0], points[i], points[i + 1]] {
                    out.push(SceneVertex { pos: p.to_array(), color: h.color });
                }
            }
        }
        out
    }

    /// Normals bulging outward from each hull's center.
    fn normal_triangles(&self, penumbra: &Penumbra<WgpuBackend>) -> Vec<SceneVertex> {
        let flat = FLAT_NORMAL.to_array();
        let mut out = Vec::new();
        for h in &self.hulls {
            let Some(hull) = penumbra.hulls().get(h.id) else { continue };
            let points = hull.points();
            let center = points.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / points.len() as f32;
            let encode = |p: Vec2| {
                let n = (p - center).normalize_or_zero() * 0.6;
                [n.x * 0.5 + 0.5, 0.5 - n.y * 0.5, 0.8, 1.0]
            };
            for i in 0..points.len() {
                let (a, b) = (points[i], points[(i + 1) % points.len()]);
                out.push(SceneVertex { pos: center.to_array(), color: flat });
                out.push(SceneVertex { pos: a.to_array(), color: encode(a) });
                out.push(SceneVertex { pos: b.to_array(), color: encode(b) });
            }
        }
        out
    }
}

struct Demo {
    penumbra: Option<Penumbra<WgpuBackend>>,
    scene: Option<Scene>,
    painter: ScenePainter,
    cursor: Vec2,
}

impl Demo {
    fn new() -> Self {
        Self {
            penumbra: None,
            scene: None,
            painter: ScenePainter::new(),
            cursor: Vec2::new(200.0, 200.0),
        }
    }

    fn create(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let backend = WgpuBackend::new(gpu.device(), gpu.queue(), gpu.presentation());
        let mut penumbra = Penumbra::new(
            backend,
            PenumbraConfig {
                ambient_color: ColorRgba::rgb(0.12, 0.12, 0.16),
                ..PenumbraConfig::default()
            },
        );
        penumbra.initialize()?;
        let scene = Scene::populate(&mut penumbra)?;

        log::info!(
            "penumbra ready: {} lights, {} hulls (N: normal mapping, D: debug, V: lighting on/off, Esc: quit)",
            penumbra.lights().len(),
            penumbra.hulls().len()
        );
        self.penumbra = Some(penumbra);
        self.scene = Some(scene);
        Ok(())
    }

    fn on_key(&mut self, key: KeyCode) -> AppControl {
        if key == KeyCode::Escape {
            return AppControl::Exit;
        }
        let Some(penumbra) = self.penumbra.as_mut() else {
            return AppControl::Continue;
        };
        match key {
            KeyCode::KeyN => {
                let enabled = !penumbra.normal_mapped_lighting_enabled();
                penumbra.set_normal_mapped_lighting_enabled(enabled);
                log::info!("normal mapped lighting {}", if enabled { "on" } else { "off" });
            }
            KeyCode::KeyD => {
                let debug = !penumbra.debug();
                penumbra.set_debug(debug);
                log::info!("debug diagnostics {}", if debug { "on" } else { "off" });
            }
            KeyCode::KeyV => {
                let visible = !penumbra.visible();
                penumbra.set_visible(visible);
            }
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for Demo {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        return self.on_key(code);
                    }
                }
            }
            // Minimized windows report 0x0; keep the previous targets.
            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                if let Some(penumbra) = self.penumbra.as_mut() {
                    penumbra.engine_mut().backend_mut().resize(size.width, size.height);
                    if let Err(e) = penumbra.on_back_buffer_resized(size.width, size.height) {
                        log::error!("render target resize failed: {e}");
                    }
                }
            }
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.penumbra.is_none() {
            if let Err(e) = self.create(ctx.gpu) {
                log::error!("failed to set up lighting: {e:#}");
                return AppControl::Exit;
            }
        }
        let (Some(penumbra), Some(scene)) = (self.penumbra.as_mut(), self.scene.as_ref()) else {
            return AppControl::Exit;
        };

        let time = ctx.time;
        scene.animate(penumbra, self.cursor, time);

        let (width, height) = ctx.physical_size();
        if width == 0 || height == 0 {
            return AppControl::Continue;
        }
        let painter = &mut self.painter;
        let mut result = Ok(());

        let control = ctx.present(|gpu, view| {
            let rctx = RenderCtx::new(
                gpu.device(),
                gpu.queue(),
                gpu.surface_format(),
                Viewport::new(width, height),
            );
            penumbra.engine_mut().backend_mut().begin_frame(view.clone());
            result = draw_frame(penumbra, scene, painter, &rctx, time);
            penumbra.engine_mut().backend_mut().finish_frame()
        });

        if let Err(e) = result {
            log::error!("frame failed: {e}");
        }
        control
    }
}

fn draw_frame(
    penumbra: &mut Penumbra<WgpuBackend>,
    scene: &Scene,
    painter: &mut ScenePainter,
    rctx: &RenderCtx<'_>,
    time: FrameTime,
) -> penumbra_engine::Result<()> {
    penumbra.begin_draw()?;
    let triangles = scene.color_triangles(penumbra);
    if let Some(mut target) = penumbra.engine_mut().backend_mut().bound_target() {
        painter.paint(rctx, &mut target, &triangles, BACKGROUND);
    }

    if penumbra.visible() && penumbra.normal_mapped_lighting_enabled() {
        penumbra.begin_normal_mapped()?;
        let normals = scene.normal_triangles(penumbra);
        if let Some(mut target) = penumbra.engine_mut().backend_mut().bound_target() {
            painter.paint(rctx, &mut target, &normals, FLAT_NORMAL);
        }
    }

    penumbra.draw(time)
}

/// Soft radial spot used by the textured light.
fn radial_glow_texture(backend: &mut WgpuBackend) -> penumbra_engine::TextureRef {
    let half = GLOW_SIZE as f32 * 0.5;
    let mut pixels = Vec::with_capacity((GLOW_SIZE * GLOW_SIZE * 4) as usize);
    for y in 0..GLOW_SIZE {
        for x in 0..GLOW_SIZE {
            let d = Vec2::new(x as f32 + 0.5 - half, y as f32 + 0.5 - half).length() / half;
            let ring = if (d * 6.0) as u32 % 2 == 0 { 1.0 } else { 0.6 };
            let v = ((1.0 - d).clamp(0.0, 1.0) * ring * 255.0) as u8;
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }

    let texture = backend.device().create_texture_with_data(
        backend.queue(),
        &wgpu::TextureDescriptor {
            label: Some("demo glow texture"),
            size: wgpu::Extent3d {
                width: GLOW_SIZE,
                height: GLOW_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &pixels,
    );
    backend.register_texture(&texture)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig {
            title: "penumbra demo".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        Demo::new(),
    )
}
