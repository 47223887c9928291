//! Plain-data interface to the rendering collaborator.
//!
//! The scene never draws anything itself: it tells a [`Renderer`] which
//! visuals to spawn, move and release, and keeps the handles it got back.

pub mod headless;
pub mod reconcile;

use glam::Vec3;

pub use headless::HeadlessRenderer;
pub use reconcile::Scene;

/// Opaque identity of a visual owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Radians about the vertical axis.
    pub yaw: f32,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(translation: Vec3) -> Self {
        Transform {
            translation,
            yaw: 0.0,
            scale: Vec3::ONE,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    Player { name: String, dead: bool },
    Ground,
    Mound,
    Flag,
    Mine,
    MineCount(u8),
    Explosion,
}

impl VisualKind {
    pub fn is_player(&self) -> bool {
        matches!(self, VisualKind::Player { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub kind: VisualKind,
    pub transform: Transform,
}

pub trait Renderer {
    fn spawn(&mut self, visual: &Visual) -> HandleId;
    fn update(&mut self, handle: HandleId, visual: &Visual);
    fn despawn(&mut self, handle: HandleId);
    fn aim_camera(&mut self, _eye: Vec3, _target: Vec3) {}
}
