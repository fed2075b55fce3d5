//! Render Target Chain: the offscreen surfaces a lit frame passes through.

use crate::backend::{RenderBackend, SurfaceDesc, SurfaceId, MAX_TARGET_BINDINGS};
use crate::error::Result;
use crate::logging::diagnostic;

const TEMPLATE_LABEL: &str = "penumbra render target";
const LABELS: [&str; 4] = [
    "penumbra scene",
    "penumbra normal map",
    "penumbra light map",
    "penumbra light map (normal)",
];

/// The four surfaces of one chain generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SurfaceSet {
    /// Host scene color, captured between `pre_render` and `render`.
    pub scene: SurfaceId,
    /// Host-drawn normals for normal-mapped lighting.
    pub normal_map: SurfaceId,
    pub light_map: SurfaceId,
    /// Light map used when normal-mapped lighting is enabled.
    pub light_map_normal: SurfaceId,
}

impl SurfaceSet {
    #[inline]
    pub fn ids(&self) -> [SurfaceId; 4] {
        [self.scene, self.normal_map, self.light_map, self.light_map_normal]
    }
}

/// Owns the chain's surfaces and the host bindings captured each frame.
#[derive(Debug, Default)]
pub struct RenderTargets {
    set: Option<SurfaceSet>,
    template: Option<SurfaceDesc>,

    original: [Option<SurfaceId>; MAX_TARGET_BINDINGS],
    original_count: usize,

    pub(crate) verbose: bool,
}

impl RenderTargets {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn surfaces(&self) -> Option<&SurfaceSet> {
        self.set.as_ref()
    }

    /// Description shared by all four surfaces (labels aside).
    #[inline]
    pub fn surface_desc(&self) -> Option<SurfaceDesc> {
        self.template.filter(|_| self.set.is_some())
    }

    /// Current surface size, `None` before creation or after dispose.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.surface_desc().map(|d| (d.width, d.height))
    }

    /// Makes the chain match `width` x `height` and the backend's current
    /// presentation format. Surfaces are destroyed and recreated, never
    /// resized; nothing happens when everything already matches.
    ///
    /// Returns whether the chain was rebuilt. A zero-sized request (a
    /// minimized window) keeps the current surfaces.
    pub fn ensure_sized<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<bool> {
        if width == 0 || height == 0 {
            log::debug!("ignoring zero-sized render target request {width}x{height}");
            return Ok(false);
        }

        let pp = backend.presentation();
        let template = SurfaceDesc {
            width,
            height,
            ..SurfaceDesc::matching(TEMPLATE_LABEL, &pp)
        };
        if self.set.is_some() && self.template == Some(template) {
            return Ok(false);
        }

        self.dispose(backend);

        let mut created = [SurfaceId(0); 4];
        for (i, label) in LABELS.into_iter().enumerate() {
            match backend.create_surface(&SurfaceDesc { label, ..template }) {
                Ok(id) => created[i] = id,
                Err(err) => {
                    for id in &created[..i] {
                        backend.destroy_surface(*id);
                    }
                    log::error!("render target creation failed: {err}");
                    return Err(err);
                }
            }
        }

        let [scene, normal_map, light_map, light_map_normal] = created;
        self.set = Some(SurfaceSet {
            scene,
            normal_map,
            light_map,
            light_map_normal,
        });
        self.template = Some(template);

        diagnostic!(self.verbose, "New lightmap textures created ({width}x{height})");
        Ok(true)
    }

    /// Releases every surface. Safe to call repeatedly.
    pub fn dispose<B: RenderBackend>(&mut self, backend: &mut B) {
        let Some(set) = self.set.take() else { return };
        for id in set.ids() {
            backend.destroy_surface(id);
        }
        self.template = None;
        diagnostic!(self.verbose, "lightmap textures released");
    }

    /// Captures whatever the host has bound (at most
    /// [`MAX_TARGET_BINDINGS`]; none means the back buffer).
    pub fn snapshot_bindings<B: RenderBackend>(&mut self, backend: &B) {
        self.original_count = backend.query_bindings(&mut self.original);
    }

    /// Rebinds exactly what the last snapshot captured.
    pub fn restore_bindings<B: RenderBackend>(&self, backend: &mut B) {
        let mut ids = [SurfaceId(0); MAX_TARGET_BINDINGS];
        let mut n = 0;
        for id in self.original.iter().take(self.original_count).flatten() {
            ids[n] = *id;
            n += 1;
        }
        backend.set_bindings(&ids[..n]);
    }

    /// Bindings captured by the last snapshot.
    pub fn original_bindings(&self) -> &[Option<SurfaceId>] {
        &self.original[..self.original_count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Op, RecordingBackend};

    // ── sizing ───────────────────────────────────────────────────────────

    #[test]
    fn surfaces_match_back_buffer_description() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        assert!(targets.ensure_sized(&mut backend, 800, 600).unwrap());

        assert_eq!(backend.live.len(), 4);
        for desc in backend.live.values() {
            assert_eq!((desc.width, desc.height), (800, 600));
            assert_eq!(desc.color_format, backend.presentation.color_format);
            assert_eq!(desc.depth_stencil_format, backend.presentation.depth_stencil_format);
            assert_eq!(desc.sample_count, 1);
        }
        let set = targets.surfaces().unwrap();
        let mut ids = set.ids().to_vec();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn unchanged_size_is_a_noop() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();
        backend.take_ops();

        assert!(!targets.ensure_sized(&mut backend, 800, 600).unwrap());
        assert!(backend.ops.is_empty());
    }

    #[test]
    fn resize_destroys_before_recreating() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();
        let old = targets.surfaces().unwrap().ids();
        backend.take_ops();

        targets.ensure_sized(&mut backend, 1024, 768).unwrap();
        let ops = backend.take_ops();
        assert_eq!(ops.len(), 8);
        for (op, id) in ops[..4].iter().zip(old) {
            assert_eq!(*op, Op::DestroySurface(id));
        }
        assert!(ops[4..].iter().all(|op| matches!(op, Op::CreateSurface(..))));
        assert_eq!(backend.live.len(), 4);
        assert_eq!(targets.size(), Some((1024, 768)));
    }

    #[test]
    fn resize_round_trip_matches_fresh_chain() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();
        targets.ensure_sized(&mut backend, 320, 200).unwrap();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();

        let mut fresh_backend = RecordingBackend::new(800, 600);
        let mut fresh = RenderTargets::new();
        fresh.ensure_sized(&mut fresh_backend, 800, 600).unwrap();

        assert_eq!(targets.surface_desc(), fresh.surface_desc());
        let descs: Vec<_> = backend.live.values().copied().collect();
        let fresh_descs: Vec<_> = fresh_backend.live.values().copied().collect();
        assert_eq!(descs, fresh_descs);
    }

    #[test]
    fn presentation_format_change_rebuilds() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();

        backend.presentation.sample_count = 4;
        assert!(targets.ensure_sized(&mut backend, 800, 600).unwrap());
        assert!(backend.live.values().all(|d| d.sample_count == 4));
    }

    #[test]
    fn zero_size_keeps_surfaces() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();
        assert!(!targets.ensure_sized(&mut backend, 0, 600).unwrap());
        assert_eq!(targets.size(), Some((800, 600)));
    }

    #[test]
    fn creation_failure_leaks_nothing() {
        let mut backend = RecordingBackend::new(800, 600);
        backend.fail_surface_creation = true;
        let mut targets = RenderTargets::new();
        assert!(targets.ensure_sized(&mut backend, 800, 600).is_err());
        assert!(backend.live.is_empty());
        assert_eq!(targets.surfaces(), None);
    }

    // ── dispose ──────────────────────────────────────────────────────────

    #[test]
    fn dispose_is_idempotent() {
        let mut backend = RecordingBackend::new(800, 600);
        let mut targets = RenderTargets::new();
        targets.ensure_sized(&mut backend, 800, 600).unwrap();

        targets.dispose(&mut backend);
        assert!(backend.live.is_empty());
        assert_eq!(targets.size(), None);
        backend.take_ops();

        targets.dispose(&mut backend);
        assert!(backend.ops.is_empty());
    }

    // ── bindings ─────────────────────────────────────────────────────────

    #[test]
    fn snapshot_restores_zero_to_four_bindings() {
        for count in 0..=MAX_TARGET_BINDINGS {
            let mut backend = RecordingBackend::new(100, 100);
            let host: Vec<SurfaceId> = (0..count as u64).map(SurfaceId).collect();
            backend.set_bindings(&host);

            let mut targets = RenderTargets::new();
            targets.snapshot_bindings(&backend);
            assert_eq!(targets.original_bindings().len(), count);

            backend.set_bindings(&[SurfaceId(99)]);
            targets.restore_bindings(&mut backend);
            assert_eq!(backend.bindings, host);
        }
    }
}
