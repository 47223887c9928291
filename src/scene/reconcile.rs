use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec3;
use tracing::debug;

use super::{HandleId, Renderer, Transform, Visual, VisualKind};
use crate::models::{Game, Player, Position, Size};

/// Height of the mound covering an unrevealed area.
pub const MOUND_HEIGHT: f32 = 0.3;
const GROUND_DEPTH: f32 = -0.15;
const MARKER_HEIGHT: f32 = 0.01;

/// Keeps renderer handles in step with the latest game and player snapshots.
///
/// Players are cached by id and moved in place. Board features are rebuilt
/// whenever a different game snapshot arrives.
#[derive(Debug, Default)]
pub struct Scene {
    players: HashMap<String, HandleId>,
    board: Vec<HandleId>,
    board_source: Option<Arc<Game>>,
}

/// Summary of one player reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerSync {
    pub spawned: usize,
    pub updated: usize,
    pub despawned: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync<R: Renderer>(&mut self, renderer: &mut R, game: &Arc<Game>, players: &[Player]) {
        self.sync_board(renderer, game);
        self.sync_players(renderer, game, players);
    }

    /// Rebuild board features if `game` is not the snapshot they were built
    /// from. Returns whether anything was rebuilt.
    pub fn sync_board<R: Renderer>(&mut self, renderer: &mut R, game: &Arc<Game>) -> bool {
        if self
            .board_source
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, game))
        {
            return false;
        }

        let released = self.board.len();
        for handle in self.board.drain(..) {
            renderer.despawn(handle);
        }

        self.board = board_features(game)
            .iter()
            .map(|visual| renderer.spawn(visual))
            .collect();

        if let Some(eye) = game.camera().eye(game.size()) {
            renderer.aim_camera(Vec3::from(eye), Vec3::ZERO);
        }

        debug!(
            game_id = game.id(),
            released,
            spawned = self.board.len(),
            "Rebuilt board features"
        );
        self.board_source = Some(Arc::clone(game));
        true
    }

    pub fn sync_players<R: Renderer>(
        &mut self,
        renderer: &mut R,
        game: &Game,
        players: &[Player],
    ) -> PlayerSync {
        let mut stats = PlayerSync::default();

        for player in players {
            let visual = player_visual(game, player);
            match self.players.get(&player.id) {
                Some(&handle) => {
                    renderer.update(handle, &visual);
                    stats.updated += 1;
                }
                None => {
                    let handle = renderer.spawn(&visual);
                    self.players.insert(player.id.clone(), handle);
                    stats.spawned += 1;
                }
            }
        }

        let current: HashSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
        self.players.retain(|id, handle| {
            let keep = current.contains(id.as_str());
            if !keep {
                renderer.despawn(*handle);
                stats.despawned += 1;
            }
            keep
        });

        debug!(
            spawned = stats.spawned,
            updated = stats.updated,
            despawned = stats.despawned,
            "Reconciled players"
        );
        stats
    }

    /// Release every handle and forget the board source.
    pub fn clear<R: Renderer>(&mut self, renderer: &mut R) {
        for handle in self.board.drain(..) {
            renderer.despawn(handle);
        }
        for (_, handle) in self.players.drain() {
            renderer.despawn(handle);
        }
        self.board_source = None;
    }

    pub fn player_handle(&self, player_id: &str) -> Option<HandleId> {
        self.players.get(player_id).copied()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.players.keys().map(String::as_str)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn board_handles(&self) -> &[HandleId] {
        &self.board
    }
}

fn board_offset(size: Size) -> (f32, f32) {
    (-((size.width / 2) as f32), -((size.height / 2) as f32))
}

/// World-space center of a cell at height `y`.
pub fn cell_center(size: Size, position: Position, y: f32) -> Vec3 {
    let (offset_x, offset_z) = board_offset(size);
    Vec3::new(
        offset_x + position.x as f32 + 0.5,
        y,
        offset_z + position.z as f32 + 0.5,
    )
}

/// Ground elevation under `position`. Areas off the board count as flat.
pub fn elevation_at(game: &Game, position: Position) -> f32 {
    match game.area(position) {
        Some(area) if !area.revealed() => MOUND_HEIGHT,
        _ => 0.0,
    }
}

pub fn player_visual(game: &Game, player: &Player) -> Visual {
    let translation = cell_center(
        game.size(),
        player.position,
        elevation_at(game, player.position),
    );
    Visual {
        kind: VisualKind::Player {
            name: player.name.clone(),
            dead: player.is_dead(),
        },
        transform: Transform::at(translation).with_yaw(player.direction.yaw()),
    }
}

/// Every static visual derived from one board snapshot.
pub fn board_features(game: &Game) -> Vec<Visual> {
    let size = game.size();
    let mut visuals = vec![Visual {
        kind: VisualKind::Ground,
        transform: Transform::at(Vec3::new(0.0, GROUND_DEPTH, 0.0))
            .with_scale(Vec3::new(size.width as f32, 1.0, size.height as f32)),
    }];

    for (position, area) in game.areas() {
        let mut place = |kind: VisualKind, y: f32| {
            visuals.push(Visual {
                kind,
                transform: Transform::at(cell_center(size, position, y)),
            });
        };

        if !area.revealed() {
            place(VisualKind::Mound, 0.0);
            if area.flagged() {
                place(VisualKind::Flag, MOUND_HEIGHT);
            }
        } else if area.has_mine() {
            place(VisualKind::Mine, 0.0);
            if area.boomed() {
                place(VisualKind::Explosion, 0.0);
            }
        } else if area.adjacent_mine_count() > 0 {
            place(VisualKind::MineCount(area.adjacent_mine_count()), MARKER_HEIGHT);
        }
    }

    visuals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Area, CameraMode, Direction};
    use crate::scene::HeadlessRenderer;

    fn game_with(size: Size, edit: impl FnOnce(&mut Vec<Vec<Area>>)) -> Arc<Game> {
        let mut columns = vec![vec![Area::hidden(); size.height as usize]; size.width as usize];
        edit(&mut columns);
        Arc::new(Game::new("g".to_string(), size, 1, columns, CameraMode::default()).unwrap())
    }

    fn player(id: &str, x: i32, z: i32) -> Player {
        Player::new(id, id.to_uppercase(), Position::new(x, z), Direction::Up)
    }

    fn ids(scene: &Scene) -> Vec<String> {
        let mut ids: Vec<String> = scene.player_ids().map(str::to_string).collect();
        ids.sort();
        ids
    }

    #[test]
    fn new_player_spawned_existing_player_kept() {
        let game = game_with(Size::new(2, 2), |_| {});
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        scene.sync(&mut renderer, &game, &[player("a", 0, 0)]);
        let a_handle = scene.player_handle("a").unwrap();

        scene.sync(&mut renderer, &game, &[player("a", 1, 0), player("b", 0, 0)]);

        assert_eq!(scene.player_count(), 2);
        assert_eq!(scene.player_handle("a"), Some(a_handle));
        let b_handle = scene.player_handle("b").unwrap();
        assert_ne!(b_handle, a_handle);

        let a_visual = renderer.visual(a_handle).unwrap();
        assert_eq!(a_visual.transform.translation.x, 0.5);
    }

    #[test]
    fn cache_keys_match_latest_player_ids() {
        let game = game_with(Size::new(3, 3), |_| {});
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        let rounds: [&[&str]; 4] = [&["a", "b", "c"], &["b", "d"], &[], &["d", "a"]];
        for round in rounds {
            let players: Vec<Player> = round.iter().map(|id| player(id, 0, 0)).collect();
            scene.sync_players(&mut renderer, &game, &players);

            let mut expected: Vec<String> = round.iter().map(|s| s.to_string()).collect();
            expected.sort();
            assert_eq!(ids(&scene), expected);
            assert_eq!(
                renderer.count_where(VisualKind::is_player),
                round.len(),
                "renderer holds exactly the cached players"
            );
        }
    }

    #[test]
    fn repeated_sync_reuses_every_handle() {
        let game = game_with(Size::new(2, 2), |_| {});
        let players = vec![player("a", 0, 0), player("b", 1, 1)];
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        scene.sync(&mut renderer, &game, &players);
        let before: Vec<_> = ["a", "b"].iter().map(|id| scene.player_handle(id)).collect();
        let board_before = scene.board_handles().to_vec();
        let spawned = renderer.spawned_total();

        scene.sync(&mut renderer, &game, &players);

        let after: Vec<_> = ["a", "b"].iter().map(|id| scene.player_handle(id)).collect();
        assert_eq!(before, after);
        assert_eq!(scene.board_handles(), board_before.as_slice());
        assert_eq!(renderer.spawned_total(), spawned);
    }

    #[test]
    fn stale_player_released() {
        let game = game_with(Size::new(2, 2), |_| {});
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        scene.sync_players(&mut renderer, &game, &[player("a", 0, 0), player("b", 0, 1)]);
        let b_handle = scene.player_handle("b").unwrap();
        let stats = scene.sync_players(&mut renderer, &game, &[player("a", 1, 1)]);

        assert_eq!(stats, PlayerSync { spawned: 0, updated: 1, despawned: 1 });
        assert!(renderer.visual(b_handle).is_none());
    }

    #[test]
    fn revealing_one_area_removes_one_mound() {
        let size = Size::new(2, 2);
        let hidden = game_with(size, |_| {});
        let opened = game_with(size, |cols| {
            cols[0][0] = Area::new(true, false, false, 0, false).unwrap();
        });
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        assert!(scene.sync_board(&mut renderer, &hidden));
        let mounds = renderer.count_where(|k| *k == VisualKind::Mound);
        let total = renderer.live_count();
        assert_eq!(mounds, 4);

        assert!(scene.sync_board(&mut renderer, &opened));
        assert_eq!(renderer.count_where(|k| *k == VisualKind::Mound), mounds - 1);
        assert_eq!(renderer.live_count(), total - 1);
    }

    #[test]
    fn same_snapshot_does_not_rebuild_board() {
        let game = game_with(Size::new(2, 2), |_| {});
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        assert!(scene.sync_board(&mut renderer, &game));
        assert!(!scene.sync_board(&mut renderer, &Arc::clone(&game)));

        let equal_copy = Arc::new((*game).clone());
        assert!(scene.sync_board(&mut renderer, &equal_copy));
        assert_eq!(renderer.live_count(), scene.board_handles().len());
    }

    #[test]
    fn features_follow_area_state() {
        let game = game_with(Size::new(2, 2), |cols| {
            cols[0][0] = Area::new(false, true, false, 0, false).unwrap();
            cols[0][1] = Area::new(true, false, true, 0, true).unwrap();
            cols[1][0] = Area::new(true, false, false, 3, false).unwrap();
            cols[1][1] = Area::new(true, false, false, 0, false).unwrap();
        });
        let kinds: Vec<VisualKind> = board_features(&game).into_iter().map(|v| v.kind).collect();

        assert_eq!(
            kinds,
            vec![
                VisualKind::Ground,
                VisualKind::Mound,
                VisualKind::Flag,
                VisualKind::Mine,
                VisualKind::Explosion,
                VisualKind::MineCount(3),
            ]
        );
    }

    #[test]
    fn player_elevation_follows_area_under_foot() {
        let game = game_with(Size::new(2, 1), |cols| {
            cols[1][0] = Area::new(true, false, false, 0, false).unwrap();
        });

        let on_mound = player_visual(&game, &player("a", 0, 0));
        let on_ground = player_visual(&game, &player("a", 1, 0));
        let off_board = player_visual(&game, &player("a", 5, -2));

        assert_eq!(on_mound.transform.translation.y, MOUND_HEIGHT);
        assert_eq!(on_ground.transform.translation.y, 0.0);
        assert_eq!(off_board.transform.translation.y, 0.0);
        assert_eq!(off_board.transform.translation.x, -1.0 + 5.0 + 0.5);
    }

    #[test]
    fn dead_marker_follows_guilty_flag() {
        let game = game_with(Size::new(2, 2), |_| {});
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();

        let mut fallen = player("a", 1, 1);
        fallen.guilty = true;
        scene.sync(&mut renderer, &game, &[fallen.clone(), player("b", 0, 0)]);

        let kind_of = |renderer: &HeadlessRenderer, scene: &Scene, id: &str| {
            let handle = scene.player_handle(id).unwrap();
            renderer.visual(handle).unwrap().kind.clone()
        };
        assert_eq!(
            kind_of(&renderer, &scene, "a"),
            VisualKind::Player { name: "A".to_string(), dead: true }
        );
        assert_eq!(
            kind_of(&renderer, &scene, "b"),
            VisualKind::Player { name: "B".to_string(), dead: false }
        );

        let handle = scene.player_handle("a");
        fallen.guilty = false;
        scene.sync_players(&mut renderer, &game, &[fallen]);
        assert_eq!(scene.player_handle("a"), handle);
        assert_eq!(
            kind_of(&renderer, &scene, "a"),
            VisualKind::Player { name: "A".to_string(), dead: false }
        );
    }

    #[test]
    fn clear_releases_everything() {
        let game = game_with(Size::new(3, 2), |_| {});
        let mut renderer = HeadlessRenderer::new();
        let mut scene = Scene::new();
        scene.sync(&mut renderer, &game, &[player("a", 0, 0)]);
        assert!(renderer.live_count() > 0);

        scene.clear(&mut renderer);
        assert_eq!(renderer.live_count(), 0);
        assert_eq!(scene.player_count(), 0);
        assert!(scene.sync_board(&mut renderer, &game));
    }

    #[test]
    fn board_rebuild_aims_camera() {
        let game = game_with(Size::new(4, 4), |_| {});
        let mut renderer = HeadlessRenderer::new();
        Scene::new().sync_board(&mut renderer, &game);
        assert_eq!(
            renderer.camera(),
            Some((Vec3::new(0.0, 30.0, 14.0), Vec3::ZERO))
        );
    }
}
