//! Render Pipeline Orchestrator.
//!
//! Per frame: `pre_render` captures the host's bindings and redirects scene
//! drawing into the chain, `pre_normal_mapped` optionally redirects a normal
//! pass, and `render` accumulates every light into the light map, restores
//! the host's bindings and composites the lit scene into them.

use std::collections::{HashMap, HashSet};

use crate::backend::{
    CompositeDraw, LightDraw, LightShape, NormalMapping, RenderBackend, SurfaceId,
};
use crate::camera::Camera;
use crate::catalog::{Catalog, LightId};
use crate::coords::{ColorRgba, Vec2, Viewport};
use crate::error::{PenumbraError, Result};
use crate::geometry::Hull;
use crate::light::{Light, LightKind, TextureId};
use crate::logging::diagnostic;
use crate::shadow::{ShadowBuilder, ShadowVertex, ShadowWedge};
use crate::targets::RenderTargets;

/// Normal map contents when the host drew no normal pass: every pixel faces
/// the viewer.
pub const FLAT_NORMAL: ColorRgba = ColorRgba::new(0.5, 0.5, 1.0, 1.0);

/// Counters from the last `render`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub lights_drawn: usize,
    pub lights_culled: usize,
    pub wedges: usize,
    /// Lights whose shadow geometry was rebuilt rather than reused.
    pub shadow_builds: usize,
}

#[derive(Debug, Copy, Clone, Default)]
struct FrameFlags {
    scene_armed: bool,
    normal_armed: bool,
}

/// Lighting engine over a [`RenderBackend`].
pub struct PenumbraEngine<B: RenderBackend> {
    backend: B,

    pub lights: Catalog<Light>,
    pub hulls: Catalog<Hull>,
    pub camera: Camera,
    /// Light present everywhere before any light is added. Alpha is ignored.
    pub ambient_color: ColorRgba,
    pub normal_mapped_lighting_enabled: bool,

    debug: bool,
    loaded: bool,
    frame: FrameFlags,
    targets: RenderTargets,

    builder: ShadowBuilder,
    shadow_cache: HashMap<LightId, Vec<ShadowWedge>>,
    triangles: Vec<ShadowVertex>,
    warned_textures: HashSet<TextureId>,
    stats: FrameStats,
}

impl<B: RenderBackend> PenumbraEngine<B> {
    pub fn new(backend: B) -> Self {
        let pp = backend.presentation();
        Self {
            backend,
            lights: Catalog::new(),
            hulls: Catalog::new(),
            camera: Camera::new(Viewport::new(pp.width, pp.height)),
            ambient_color: ColorRgba::new(0.2, 0.2, 0.2, 1.0),
            normal_mapped_lighting_enabled: false,
            debug: false,
            loaded: false,
            frame: FrameFlags::default(),
            targets: RenderTargets::new(),
            builder: ShadowBuilder::new(),
            shadow_cache: HashMap::new(),
            triangles: Vec::new(),
            warned_textures: HashSet::new(),
            stats: FrameStats::default(),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Promotes engine diagnostics from `debug` to `info`.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        self.targets.verbose = debug;
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    #[inline]
    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Cached shadow geometry of a light, as of the last `render`.
    pub fn shadow_geometry(&self, id: LightId) -> Option<&[ShadowWedge]> {
        self.shadow_cache.get(&id).map(Vec::as_slice)
    }

    /// Creates the render target chain at the back buffer's size.
    pub fn load(&mut self) -> Result<()> {
        let pp = self.backend.presentation();
        self.camera.set_viewport(Viewport::new(pp.width, pp.height));
        self.targets.ensure_sized(&mut self.backend, pp.width, pp.height)?;
        self.loaded = true;
        diagnostic!(self.debug, "penumbra loaded at {}x{}", pp.width, pp.height);
        Ok(())
    }

    /// Rebuilds the chain for a new back-buffer size. Must be forwarded by
    /// the host before the next `render`.
    pub fn on_back_buffer_resized(&mut self, width: u32, height: u32) -> Result<()> {
        if width > 0 && height > 0 {
            self.camera.set_viewport(Viewport::new(width, height));
        }
        if !self.loaded {
            return Ok(());
        }
        self.targets.ensure_sized(&mut self.backend, width, height)?;
        Ok(())
    }

    /// Snapshots the host's bindings and redirects drawing to the scene
    /// surface.
    pub fn pre_render(&mut self) -> Result<()> {
        let Some(set) = self.targets.surfaces().copied() else {
            return Err(PenumbraError::NotInitialized);
        };
        if self.frame.scene_armed {
            log::warn!("pre_render called twice without render; restarting the frame");
        }
        self.targets.snapshot_bindings(&self.backend);
        self.backend.set_bindings(&[set.scene]);
        self.frame = FrameFlags {
            scene_armed: true,
            normal_armed: false,
        };
        Ok(())
    }

    /// Redirects drawing to the normal map. With normal-mapped lighting
    /// disabled this only records that a normal pass was requested.
    pub fn pre_normal_mapped(&mut self) -> Result<()> {
        if !self.frame.scene_armed {
            return Err(PenumbraError::RenderWithoutBegin);
        }
        if !self.normal_mapped_lighting_enabled {
            log::debug!("normal pass requested with normal-mapped lighting disabled");
            return Ok(());
        }
        let Some(set) = self.targets.surfaces().copied() else {
            return Err(PenumbraError::NotInitialized);
        };
        self.backend.set_bindings(&[set.normal_map]);
        self.frame.normal_armed = true;
        Ok(())
    }

    /// Lights the captured scene and composites it into the host's original
    /// bindings. Both begin flags are cleared whatever the outcome.
    pub fn render(&mut self) -> Result<()> {
        if !self.frame.scene_armed {
            return Err(PenumbraError::RenderWithoutBegin);
        }
        let normal_pass_drawn = self.frame.normal_armed;
        self.frame = FrameFlags::default();

        let Some(set) = self.targets.surfaces().copied() else {
            return Err(PenumbraError::NotInitialized);
        };
        let pp = self.backend.presentation();
        if let Some((targets_width, targets_height)) = self.targets.size() {
            if (targets_width, targets_height) != (pp.width, pp.height) {
                self.targets.restore_bindings(&mut self.backend);
                return Err(PenumbraError::StaleRenderTargets {
                    targets_width,
                    targets_height,
                    back_buffer_width: pp.width,
                    back_buffer_height: pp.height,
                });
            }
        }

        self.sync_catalogs();
        self.camera.set_viewport(Viewport::new(pp.width, pp.height));

        let normal_mapped = self.normal_mapped_lighting_enabled;
        if normal_mapped && !normal_pass_drawn {
            self.backend.set_bindings(&[set.normal_map]);
            self.backend.clear(FLAT_NORMAL);
        }

        let light_map = if normal_mapped {
            set.light_map_normal
        } else {
            set.light_map
        };
        self.backend.set_bindings(&[light_map]);
        self.backend.clear(ColorRgba {
            a: 0.0,
            ..self.ambient_color
        });

        self.stats = self.draw_lights(normal_mapped.then_some(set.normal_map));

        self.targets.restore_bindings(&mut self.backend);
        self.backend.draw_composite(&CompositeDraw {
            scene: set.scene,
            light_map,
        });

        log::trace!("penumbra frame: {:?}", self.stats);
        Ok(())
    }

    /// Releases the render target chain and cached geometry. Safe to call
    /// repeatedly; `load` brings the engine back.
    pub fn dispose(&mut self) {
        if self.loaded {
            diagnostic!(self.debug, "penumbra disposed");
        }
        self.targets.dispose(&mut self.backend);
        self.shadow_cache.clear();
        self.frame = FrameFlags::default();
        self.loaded = false;
    }

    // ── private helpers ────────────────────────────────────────────────────

    /// Drops cached geometry invalidated by catalog changes.
    fn sync_catalogs(&mut self) {
        if self.hulls.drain_events().count() > 0 {
            self.shadow_cache.clear();
        }
        for event in self.lights.drain_events() {
            self.shadow_cache.remove(&event.id());
        }
    }

    fn draw_lights(&mut self, normal_map: Option<SurfaceId>) -> FrameStats {
        let Self {
            backend,
            lights,
            hulls,
            camera,
            builder,
            shadow_cache,
            triangles,
            warned_textures,
            ..
        } = self;

        let world_to_clip = camera.world_to_clip();
        let view = camera.visible_bounds();
        let mut stats = FrameStats::default();
        let mut mask_dirty = false;

        for (id, light) in lights.iter() {
            if !light.is_visible() {
                continue;
            }
            if view.is_some_and(|v| !light.bounds().overlaps(v)) {
                stats.lights_culled += 1;
                continue;
            }
            let Some(shape) = light_shape(light, &*backend, warned_textures) else {
                continue;
            };

            triangles.clear();
            if light.is_shadow_relevant() {
                let wedges = shadow_cache.entry(id).or_insert_with(|| {
                    stats.shadow_builds += 1;
                    let mut out = Vec::new();
                    builder.build_into(light, hulls.values(), &mut out);
                    out
                });
                stats.wedges += wedges.len();
                for wedge in wedges.iter() {
                    for tri in wedge.triangles() {
                        triangles.extend_from_slice(&tri);
                    }
                }
            }

            if mask_dirty {
                backend.reset_occlusion();
                mask_dirty = false;
            }
            if !triangles.is_empty() {
                backend.draw_occlusion(triangles, world_to_clip);
                mask_dirty = true;
            }

            let draw = LightDraw {
                position: light.position,
                range: light.range,
                rotation: light.rotation,
                color: light.color.scaled(light.intensity),
                shape,
                world_to_clip,
                normal_map: normal_map.map(|surface| {
                    let screen_position = camera.world_to_screen(light.position);
                    let edge = camera.world_to_screen(light.position + Vec2::new(light.range, 0.0));
                    NormalMapping {
                        normal_map: surface,
                        screen_position,
                        screen_range: edge.distance(screen_position),
                    }
                }),
            };
            match backend.draw_light(&draw) {
                Ok(()) => stats.lights_drawn += 1,
                Err(err) => log::warn!("light {id:?} skipped: {err}"),
            }
        }

        stats
    }
}

impl<B: RenderBackend> Drop for PenumbraEngine<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Backend shape for a light, or `None` when its texture is unavailable.
fn light_shape<B: RenderBackend>(
    light: &Light,
    backend: &B,
    warned: &mut HashSet<TextureId>,
) -> Option<LightShape> {
    match light.kind {
        LightKind::Point | LightKind::Textured { texture: None, .. } => Some(LightShape::Point),
        LightKind::Spot { cone_angle, decay } => Some(LightShape::Spot { cone_angle, decay }),
        LightKind::Textured {
            texture: Some(texture),
            scale,
        } => {
            if backend.texture_size(texture.id).is_none() {
                if warned.insert(texture.id) {
                    log::warn!("texture {:?} is not registered; textured light skipped", texture.id);
                }
                return None;
            }
            Some(LightShape::Textured {
                texture: texture.id,
                scale,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Op, RecordingBackend};
    use crate::coords::Rect;
    use crate::light::TextureRef;
    use crate::shadow::occlusion_at;

    fn engine() -> PenumbraEngine<RecordingBackend> {
        let mut e = PenumbraEngine::new(RecordingBackend::new(800, 600));
        e.load().unwrap();
        e.backend_mut().take_ops();
        e
    }

    fn frame(e: &mut PenumbraEngine<RecordingBackend>) -> Vec<Op> {
        e.pre_render().unwrap();
        e.render().unwrap();
        e.backend_mut().take_ops()
    }

    fn surfaces(e: &PenumbraEngine<RecordingBackend>) -> crate::targets::SurfaceSet {
        *e.targets().surfaces().unwrap()
    }

    fn count(ops: &[Op], pred: impl Fn(&Op) -> bool) -> usize {
        ops.iter().filter(|op| pred(op)).count()
    }

    // ── call order ───────────────────────────────────────────────────────

    #[test]
    fn render_without_pre_render_fails() {
        let mut e = engine();
        assert_eq!(e.render(), Err(PenumbraError::RenderWithoutBegin));
        assert!(e.backend().ops.is_empty());
    }

    #[test]
    fn pre_render_before_load_fails() {
        let mut e = PenumbraEngine::new(RecordingBackend::new(800, 600));
        assert_eq!(e.pre_render(), Err(PenumbraError::NotInitialized));
    }

    #[test]
    fn pre_normal_mapped_requires_pre_render() {
        let mut e = engine();
        assert_eq!(e.pre_normal_mapped(), Err(PenumbraError::RenderWithoutBegin));
    }

    #[test]
    fn each_frame_needs_a_fresh_pre_render() {
        let mut e = engine();
        frame(&mut e);
        assert_eq!(e.render(), Err(PenumbraError::RenderWithoutBegin));
    }

    // ── pass sequence ────────────────────────────────────────────────────

    #[test]
    fn empty_frame_pass_sequence() {
        let mut e = engine();
        e.ambient_color = ColorRgba::new(0.1, 0.2, 0.3, 0.7);
        let set = surfaces(&e);
        let ops = frame(&mut e);
        assert_eq!(
            ops,
            vec![
                Op::Bind(vec![set.scene]),
                Op::Bind(vec![set.light_map]),
                Op::Clear {
                    target: Some(set.light_map),
                    color: ColorRgba::new(0.1, 0.2, 0.3, 0.0),
                },
                Op::Bind(vec![]),
                Op::Composite {
                    target: None,
                    draw: CompositeDraw {
                        scene: set.scene,
                        light_map: set.light_map,
                    },
                },
            ]
        );
    }

    #[test]
    fn host_bindings_are_restored_before_composite() {
        let mut e = engine();
        let host = vec![SurfaceId(1), SurfaceId(2)];
        e.backend_mut().set_bindings(&host);
        e.backend_mut().take_ops();

        let ops = frame(&mut e);
        assert_eq!(e.backend().bindings, host);
        match ops.last() {
            Some(Op::Composite { target, .. }) => assert_eq!(*target, Some(SurfaceId(1))),
            other => panic!("expected composite last, got {other:?}"),
        }
    }

    #[test]
    fn point_light_without_hulls_draws_no_occlusion() {
        let mut e = engine();
        e.ambient_color = ColorRgba::black();
        let id = e
            .lights
            .add(Light::point(Vec2::ZERO, 200.0, ColorRgba::white()).with_intensity(2.0));
        let ops = frame(&mut e);

        assert_eq!(count(&ops, |op| matches!(op, Op::Occlusion { .. })), 0);
        assert_eq!(count(&ops, |op| matches!(op, Op::ResetOcclusion { .. })), 0);
        let light = ops
            .iter()
            .find_map(|op| match op {
                Op::Light { draw, target } => Some((*draw, *target)),
                _ => None,
            })
            .unwrap();
        assert_eq!(light.1, Some(surfaces(&e).light_map));
        assert_eq!(light.0.shape, LightShape::Point);
        assert_eq!(light.0.color, ColorRgba::new(2.0, 2.0, 2.0, 1.0));
        assert_eq!(e.shadow_geometry(id).map(<[ShadowWedge]>::len), Some(0));

        // A red scene pixel halfway out is lit at half strength (times intensity).
        let l = e.lights.get(id).unwrap();
        assert_eq!(l.falloff_at(Vec2::new(100.0, 0.0)), Some(1.0));
    }

    #[test]
    fn hull_between_light_and_background_casts_shadow() {
        let mut e = engine();
        let id = e.lights.add(
            Light::point(Vec2::new(100.0, 300.0), 600.0, ColorRgba::white()).with_source_radius(10.0),
        );
        e.hulls
            .add(Hull::rectangle(Rect::new(300.0, 250.0, 50.0, 100.0)).unwrap());
        let ops = frame(&mut e);

        assert_eq!(count(&ops, |op| matches!(op, Op::Occlusion { .. })), 1);
        let occlusion_before_light = ops
            .iter()
            .position(|op| matches!(op, Op::Occlusion { .. }))
            .unwrap()
            < ops.iter().position(|op| matches!(op, Op::Light { .. })).unwrap();
        assert!(occlusion_before_light);

        let wedges = e.shadow_geometry(id).unwrap();
        assert_eq!(occlusion_at(wedges, Vec2::new(500.0, 300.0)), 1.0);
        assert_eq!(occlusion_at(wedges, Vec2::new(500.0, 100.0)), 0.0);
        let fringe: Vec<f32> = (0..40)
            .map(|i| occlusion_at(wedges, Vec2::new(600.0, 380.0 + i as f32 * 2.0)))
            .collect();
        assert!(fringe.iter().any(|o| *o > 0.0 && *o < 1.0));
    }

    #[test]
    fn occlusion_mask_is_reset_between_shadowed_lights() {
        let mut e = engine();
        e.hulls
            .add(Hull::rectangle(Rect::new(300.0, 250.0, 50.0, 100.0)).unwrap());
        e.lights.add(Light::point(Vec2::new(100.0, 300.0), 500.0, ColorRgba::white()));
        e.lights.add(Light::point(Vec2::new(600.0, 300.0), 500.0, ColorRgba::white()));
        e.lights.add(Light::point(Vec2::new(100.0, 100.0), 50.0, ColorRgba::white()));
        let ops = frame(&mut e);

        let kinds: Vec<&str> = ops
            .iter()
            .filter_map(|op| match op {
                Op::ResetOcclusion { .. } => Some("reset"),
                Op::Occlusion { .. } => Some("occlusion"),
                Op::Light { .. } => Some("light"),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["occlusion", "light", "reset", "occlusion", "light", "reset", "light"]
        );
    }

    // ── culling and skipping ─────────────────────────────────────────────

    #[test]
    fn lights_outside_view_or_disabled_are_skipped() {
        let mut e = engine();
        e.lights
            .add(Light::point(Vec2::new(5000.0, 5000.0), 100.0, ColorRgba::white()));
        let mut off = Light::point(Vec2::new(100.0, 100.0), 100.0, ColorRgba::white());
        off.enabled = false;
        e.lights.add(off);
        let ops = frame(&mut e);

        assert_eq!(count(&ops, |op| matches!(op, Op::Light { .. })), 0);
        assert_eq!(e.last_frame_stats().lights_culled, 1);
    }

    #[test]
    fn textured_light_needs_registered_texture() {
        let mut e = engine();
        let tex = TextureRef::new(TextureId(5), 64, 32);
        e.lights
            .add(Light::textured(Vec2::new(100.0, 100.0), Some(tex), None));
        assert_eq!(count(&frame(&mut e), |op| matches!(op, Op::Light { .. })), 0);

        e.backend_mut().known_textures.push(TextureId(5));
        let ops = frame(&mut e);
        let shape = ops.iter().find_map(|op| match op {
            Op::Light { draw, .. } => Some(draw.shape),
            _ => None,
        });
        assert_eq!(
            shape,
            Some(LightShape::Textured {
                texture: TextureId(5),
                scale: Vec2::new(64.0, 32.0),
            })
        );
    }

    #[test]
    fn textured_light_without_texture_draws_as_point() {
        let mut e = engine();
        e.lights.add(Light::textured(Vec2::new(100.0, 100.0), None, None));
        let ops = frame(&mut e);
        assert!(ops
            .iter()
            .any(|op| matches!(op, Op::Light { draw, .. } if draw.shape == LightShape::Point)));
    }

    #[test]
    fn spot_light_draws_cone_behind_its_occlusion() {
        let mut e = engine();
        let id = e.lights.add(Light::spot(
            Vec2::new(100.0, 300.0),
            600.0,
            ColorRgba::white(),
            0.0,
            std::f32::consts::FRAC_PI_4,
        )
        .with_source_radius(10.0));
        e.hulls
            .add(Hull::rectangle(Rect::new(300.0, 250.0, 50.0, 100.0)).unwrap());
        let set = surfaces(&e);
        let ops = frame(&mut e);

        let (draw, target) = ops
            .iter()
            .find_map(|op| match op {
                Op::Light { draw, target } => Some((*draw, *target)),
                _ => None,
            })
            .unwrap();
        assert_eq!(target, Some(set.light_map));
        assert_eq!(
            draw.shape,
            LightShape::Spot {
                cone_angle: std::f32::consts::FRAC_PI_4,
                decay: 1.0,
            }
        );
        assert_eq!(draw.rotation, 0.0);
        assert_eq!(count(&ops, |op| matches!(op, Op::Occlusion { .. })), 1);
        assert_eq!(e.last_frame_stats().lights_drawn, 1);

        // Spots cast shadows like points do.
        let wedges = e.shadow_geometry(id).unwrap();
        assert_eq!(occlusion_at(wedges, Vec2::new(500.0, 300.0)), 1.0);
    }

    // ── shadow cache ─────────────────────────────────────────────────────

    #[test]
    fn shadow_geometry_is_reused_until_something_changes() {
        let mut e = engine();
        let a = e.lights.add(Light::point(Vec2::new(100.0, 300.0), 500.0, ColorRgba::white()));
        let b = e.lights.add(Light::point(Vec2::new(600.0, 300.0), 500.0, ColorRgba::white()));
        let hull = e
            .hulls
            .add(Hull::rectangle(Rect::new(300.0, 250.0, 50.0, 100.0)).unwrap());

        frame(&mut e);
        assert_eq!(e.last_frame_stats().shadow_builds, 2);

        frame(&mut e);
        assert_eq!(e.last_frame_stats().shadow_builds, 0);

        e.lights.get_mut(a).unwrap().position = Vec2::new(120.0, 300.0);
        frame(&mut e);
        assert_eq!(e.last_frame_stats().shadow_builds, 1);
        assert!(e.shadow_geometry(b).is_some());

        e.hulls.get_mut(hull).unwrap().set_position(Vec2::new(10.0, 0.0));
        frame(&mut e);
        assert_eq!(e.last_frame_stats().shadow_builds, 2);

        e.lights.remove(b);
        frame(&mut e);
        assert!(e.shadow_geometry(b).is_none());
    }

    // ── normal-mapped lighting ───────────────────────────────────────────

    #[test]
    fn normal_mapped_without_normal_pass_uses_flat_normals() {
        let mut e = engine();
        e.normal_mapped_lighting_enabled = true;
        e.lights.add(Light::point(Vec2::new(100.0, 100.0), 100.0, ColorRgba::white()));
        let set = surfaces(&e);
        let ops = frame(&mut e);

        assert_eq!(ops[1], Op::Bind(vec![set.normal_map]));
        assert_eq!(
            ops[2],
            Op::Clear {
                target: Some(set.normal_map),
                color: FLAT_NORMAL,
            }
        );
        assert_eq!(ops[3], Op::Bind(vec![set.light_map_normal]));

        let draw = ops
            .iter()
            .find_map(|op| match op {
                Op::Light { draw, .. } => Some(*draw),
                _ => None,
            })
            .unwrap();
        let n = draw.normal_map.unwrap();
        assert_eq!(n.normal_map, set.normal_map);
        assert!((n.screen_position.x - 100.0).abs() < 1e-3);
        assert!((n.screen_range - 100.0).abs() < 1e-3);

        match ops.last() {
            Some(Op::Composite { draw, .. }) => assert_eq!(draw.light_map, set.light_map_normal),
            other => panic!("expected composite last, got {other:?}"),
        }
    }

    #[test]
    fn normal_pass_redirects_and_skips_flat_clear() {
        let mut e = engine();
        e.normal_mapped_lighting_enabled = true;
        let set = surfaces(&e);
        e.pre_render().unwrap();
        e.pre_normal_mapped().unwrap();
        assert_eq!(e.backend().bindings, vec![set.normal_map]);
        e.render().unwrap();

        let ops = e.backend_mut().take_ops();
        assert!(!ops
            .iter()
            .any(|op| matches!(op, Op::Clear { color, .. } if *color == FLAT_NORMAL)));
    }

    #[test]
    fn normal_pass_with_lighting_disabled_only_records_intent() {
        let mut e = engine();
        let set = surfaces(&e);
        e.pre_render().unwrap();
        e.pre_normal_mapped().unwrap();
        assert_eq!(e.backend().bindings, vec![set.scene]);
        e.render().unwrap();
    }

    // ── resize and teardown ──────────────────────────────────────────────

    #[test]
    fn render_after_unforwarded_resize_is_rejected() {
        let mut e = engine();
        e.backend_mut().presentation.width = 1024;
        e.backend_mut().presentation.height = 768;
        e.pre_render().unwrap();
        assert_eq!(
            e.render(),
            Err(PenumbraError::StaleRenderTargets {
                targets_width: 800,
                targets_height: 600,
                back_buffer_width: 1024,
                back_buffer_height: 768,
            })
        );
        assert!(e.backend().bindings.is_empty());

        e.on_back_buffer_resized(1024, 768).unwrap();
        e.pre_render().unwrap();
        e.render().unwrap();
        assert_eq!(e.targets().size(), Some((1024, 768)));
        assert_eq!(e.camera.viewport(), Viewport::new(1024, 768));
    }

    #[test]
    fn dispose_releases_everything_and_is_idempotent() {
        let mut e = engine();
        e.dispose();
        assert!(e.backend().live.is_empty());
        e.dispose();
        assert!(!e.is_loaded());
        assert_eq!(e.pre_render(), Err(PenumbraError::NotInitialized));

        e.load().unwrap();
        assert_eq!(e.backend().live.len(), 4);
    }

    #[test]
    fn resize_before_load_creates_nothing() {
        let mut e = PenumbraEngine::new(RecordingBackend::new(800, 600));
        e.on_back_buffer_resized(640, 480).unwrap();
        assert!(e.backend().live.is_empty());
    }
}
