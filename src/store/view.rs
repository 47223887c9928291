use std::fmt::Write;
use std::sync::Arc;

use super::{GameStore, SessionEvent};
use crate::scene::{Renderer, Scene};

/// Session state plus the scene built from it.
pub struct GameView<R> {
    store: GameStore,
    scene: Scene,
    renderer: R,
}

impl<R: Renderer> GameView<R> {
    pub fn new(renderer: R) -> Self {
        GameView {
            store: GameStore::new(),
            scene: Scene::new(),
            renderer,
        }
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GameStore {
        &mut self.store
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Apply one session event and reconcile the scene if a snapshot changed.
    pub fn apply(&mut self, event: SessionEvent) {
        let snapshot_changed = matches!(
            event,
            SessionEvent::GameUpdated(_) | SessionEvent::PlayersUpdated { .. }
        );
        let reset = matches!(event, SessionEvent::Closed { by_client: true });

        self.store.apply(event);

        if reset {
            self.scene.clear(&mut self.renderer);
        } else if snapshot_changed {
            // Players cannot be placed before the first board arrives.
            if let Some(game) = self.store.game().map(Arc::clone) {
                self.scene
                    .sync(&mut self.renderer, &game, self.store.players());
            }
        }
    }

    /// One-line summary of the current session.
    pub fn status_line(&self) -> String {
        let mut line = format!("[{:?}]", self.store.status());
        if let Some(game) = self.store.game() {
            let size = game.size();
            let _ = write!(
                line,
                " game {} {}x{} | revealed {}/{} | mines left {}",
                game.id(),
                size.width,
                size.height,
                game.revealed_count(),
                size.area_count(),
                game.mines_left()
            );
            if game.exploded() {
                line.push_str(" | BOOM");
            }
        }
        let _ = write!(line, " | players {}", self.store.players().len());
        if let Some(me) = self.store.my_player() {
            let _ = write!(line, " | you at {} facing {:?}", me.position, me.direction);
            if me.is_dead() {
                line.push_str(" (dead)");
            }
        }
        line
    }
}
