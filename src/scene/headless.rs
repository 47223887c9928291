use std::collections::BTreeMap;

use glam::Vec3;
use tracing::trace;

use super::{HandleId, Renderer, Visual, VisualKind};

/// Renderer that only keeps the live visual set in memory.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    live: BTreeMap<HandleId, Visual>,
    next_id: u64,
    spawned: u64,
    despawned: u64,
    camera: Option<(Vec3, Vec3)>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn visual(&self, handle: HandleId) -> Option<&Visual> {
        self.live.get(&handle)
    }

    pub fn count_where(&self, pred: impl Fn(&VisualKind) -> bool) -> usize {
        self.live.values().filter(|v| pred(&v.kind)).count()
    }

    /// Total spawns since creation, including released visuals.
    pub fn spawned_total(&self) -> u64 {
        self.spawned
    }

    pub fn despawned_total(&self) -> u64 {
        self.despawned
    }

    pub fn camera(&self) -> Option<(Vec3, Vec3)> {
        self.camera
    }
}

impl Renderer for HeadlessRenderer {
    fn spawn(&mut self, visual: &Visual) -> HandleId {
        let handle = HandleId(self.next_id);
        self.next_id += 1;
        self.spawned += 1;
        trace!(handle = handle.0, kind = ?visual.kind, "spawn");
        self.live.insert(handle, visual.clone());
        handle
    }

    fn update(&mut self, handle: HandleId, visual: &Visual) {
        if let Some(slot) = self.live.get_mut(&handle) {
            *slot = visual.clone();
        }
    }

    fn despawn(&mut self, handle: HandleId) {
        if self.live.remove(&handle).is_some() {
            self.despawned += 1;
            trace!(handle = handle.0, "despawn");
        }
    }

    fn aim_camera(&mut self, eye: Vec3, target: Vec3) {
        self.camera = Some((eye, target));
    }
}
