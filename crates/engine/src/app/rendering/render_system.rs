use std::collections::HashSet;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::app::camera::{Camera, WorldRect};
use crate::app::entities::{EntityId, Living};
use crate::app::events::{DialogRequest, EventBus, EventPayload};
use crate::app::primitives::Direction;
use crate::app::puzzle::{create_puzzle, Puzzle};
use crate::app::tilemap::TileMap;
use crate::app::ui::{format_game_time, DialogBox, DialogOutcome, StatusBarView, STAT_MAX};
use crate::app::world::World;

use super::draw_cmd::{DrawCmd, DrawKind, COLLISION_LAYER};

const PUZZLE_SOLVED_NOTICE: &str = "The stone hums. Something has changed.";
const NOTICE_OPTION_OK: &str = "OK";

struct ActivePuzzle {
    stone_id: Option<EntityId>,
    puzzle: Box<dyn Puzzle>,
    opened_at: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileRange {
    x_min: u32,
    x_max: u32,
    y_min: u32,
    y_max: u32,
}

/// Owns transient UI (dialog, puzzle, inventory overlay) and turns the world
/// into a layer-ordered draw queue.
pub struct RenderSystem {
    dialog: Option<DialogBox>,
    puzzle: Option<ActivePuzzle>,
    inventory_visible: bool,
    rng: ChaCha8Rng,
    warned_missing_sprites: HashSet<(String, String)>,
    seen_generation: u64,
}

impl RenderSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            dialog: None,
            puzzle: None,
            inventory_visible: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            warned_missing_sprites: HashSet::new(),
            seen_generation: 0,
        }
    }

    pub fn dialog_active(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn puzzle_active(&self) -> bool {
        self.puzzle.is_some()
    }

    pub fn inventory_visible(&self) -> bool {
        self.inventory_visible
    }

    pub fn dialog(&self) -> Option<&DialogBox> {
        self.dialog.as_ref()
    }

    /// Consumes UI-affecting events. Runs last in the frame, after the world.
    pub fn update(&mut self, now: Duration, bus: &mut EventBus, world: &World) {
        if world.generation() != self.seen_generation {
            self.seen_generation = world.generation();
            self.dialog = None;
            self.puzzle = None;
            self.inventory_visible = false;
            debug!(generation = self.seen_generation, "ui_reset_for_new_world");
        }

        for event in bus.get_events() {
            if event.is_consumed() {
                continue;
            }
            match event.payload() {
                EventPayload::AskDialog(request) => {
                    self.dialog = Some(DialogBox::from_request(request));
                    event.consume();
                }
                EventPayload::CloseDialog => {
                    self.dialog = None;
                    event.consume();
                }
                EventPayload::DialogInput { key } => {
                    self.handle_dialog_key(key, bus);
                    event.consume();
                }
                EventPayload::BeginPuzzle {
                    puzzle_kind,
                    stone_id,
                } => {
                    let puzzle = create_puzzle(*puzzle_kind, &mut self.rng);
                    self.open_puzzle(stone_id.clone(), puzzle, now, bus);
                    event.consume();
                }
                EventPayload::PuzzleInput { key } => {
                    self.handle_puzzle_key(key, now, bus);
                    event.consume();
                }
                EventPayload::PuzzleSolved { stone_id } => {
                    debug!(stone_id = %stone_id, "puzzle_solved_notice");
                    self.dialog = Some(DialogBox::from_request(&DialogRequest {
                        dialog: PUZZLE_SOLVED_NOTICE.to_string(),
                        options: vec![NOTICE_OPTION_OK.to_string()],
                        selected_index: 0,
                        pending: None,
                    }));
                    event.consume();
                }
                EventPayload::InventoryToggle => {
                    self.inventory_visible = !self.inventory_visible;
                    debug!(visible = self.inventory_visible, "inventory_overlay_toggled");
                    event.consume();
                }
                _ => {}
            }
        }
    }

    /// Replaces any active puzzle; the replaced one finishes unsolved.
    pub fn open_puzzle(
        &mut self,
        stone_id: Option<EntityId>,
        puzzle: Box<dyn Puzzle>,
        now: Duration,
        bus: &mut EventBus,
    ) {
        if let Some(previous) = self.puzzle.take() {
            bus.post(EventPayload::PuzzleFinished {
                stone_id: previous.stone_id,
                solved: false,
            });
        }
        info!(stone_id = ?stone_id.as_ref().map(EntityId::as_str), "puzzle_opened");
        self.puzzle = Some(ActivePuzzle {
            stone_id,
            puzzle,
            opened_at: now,
        });
    }

    fn handle_dialog_key(&mut self, key: &str, bus: &mut EventBus) {
        let Some(dialog) = self.dialog.as_mut() else {
            debug!(key, "dialog_input_without_dialog");
            return;
        };
        match dialog.handle_key(key) {
            DialogOutcome::Pending => {}
            DialogOutcome::Chosen(choice) => {
                if let Some(pending) = dialog.pending.clone() {
                    bus.post(EventPayload::DialogChoice { pending, choice });
                }
                self.dialog = None;
            }
            DialogOutcome::Dismissed => self.dialog = None,
        }
    }

    fn handle_puzzle_key(&mut self, key: &str, now: Duration, bus: &mut EventBus) {
        let Some(active) = self.puzzle.as_mut() else {
            debug!(key, "puzzle_input_without_puzzle");
            return;
        };
        if key == "Escape" {
            bus.post(EventPayload::PuzzleFinished {
                stone_id: active.stone_id.clone(),
                solved: false,
            });
            self.puzzle = None;
            return;
        }
        let Some(direction) = Direction::from_key(key) else {
            return;
        };
        if !active.puzzle.handle_input(direction) || !active.puzzle.is_solved() {
            return;
        }
        info!(
            moves = active.puzzle.view().moves,
            elapsed_ms = now.saturating_sub(active.opened_at).as_millis() as u64,
            "puzzle_solved"
        );
        bus.post(EventPayload::PuzzleFinished {
            stone_id: active.stone_id.clone(),
            solved: true,
        });
        self.puzzle = None;
    }

    /// World commands sorted by layer (stable), then screen-fixed UI.
    pub fn build_draw_queue(&mut self, world: &World, camera: &Camera) -> Vec<DrawCmd> {
        let rect = camera.visible_world_rect();
        let zoom = camera.zoom();
        let tile_map = world.tile_map();
        let tile_size = tile_map.tile_size() as f32;
        let mut queue = Vec::new();

        if let Some(range) = visible_tile_range(tile_map, rect) {
            for ty in range.y_min..=range.y_max {
                for tx in range.x_min..=range.x_max {
                    let Some(tiles) = tile_map.tiles_at(tx, ty) else {
                        continue;
                    };
                    let position =
                        camera.world_to_screen(tx as f32 * tile_size, ty as f32 * tile_size);
                    for tile in tiles {
                        queue.push(DrawCmd {
                            position,
                            size: (tile_size * zoom, tile_size * zoom),
                            layer: tile.z,
                            scale: zoom,
                            kind: DrawKind::Tile {
                                gid: tile.gid,
                                sprite: world.sprites().tile(tile.gid).map(|meta| meta.key.clone()),
                                passable: tile.passable,
                            },
                        });
                    }
                }
            }
        }

        for collision_box in tile_map.collision_boxes() {
            if !collision_box.intersects(rect.min_x, rect.min_y, rect.max_x, rect.max_y) {
                continue;
            }
            queue.push(DrawCmd {
                position: camera.world_to_screen(collision_box.x as f32, collision_box.y as f32),
                size: (
                    collision_box.width as f32 * zoom,
                    collision_box.height as f32 * zoom,
                ),
                layer: COLLISION_LAYER,
                scale: zoom,
                kind: DrawKind::Collision {
                    passable: collision_box.passable,
                },
            });
        }

        for entity in world.entities() {
            let state = entity.sprite_state();
            let Some(meta) = world.sprites().sprite(entity.sprite_set(), &state) else {
                let key = (entity.sprite_set().to_string(), state);
                if self.warned_missing_sprites.insert(key.clone()) {
                    warn!(
                        entity_id = %entity.id(),
                        sprite_set = key.0.as_str(),
                        state = key.1.as_str(),
                        "sprite_missing_entity_skipped"
                    );
                }
                continue;
            };
            let (x, y) = (entity.pos.x as f32, entity.pos.y as f32);
            let (width, height) = (meta.width as f32, meta.height as f32);
            if x >= rect.max_x || x + width <= rect.min_x || y >= rect.max_y || y + height <= rect.min_y
            {
                continue;
            }
            queue.push(DrawCmd {
                position: camera.world_to_screen(x, y),
                size: (width * zoom, height * zoom),
                layer: entity.pos.z,
                scale: zoom,
                kind: DrawKind::Sprite {
                    entity_id: entity.id().clone(),
                    sprite: meta.key.clone(),
                    frame_idx: entity.frame_idx(),
                    frame_count: meta.frame_count,
                },
            });
        }

        queue.sort_by_key(|cmd| cmd.layer);
        self.append_ui(&mut queue, world, camera);
        queue
    }

    fn append_ui(&self, queue: &mut Vec<DrawCmd>, world: &World, camera: &Camera) {
        let (screen_w, screen_h) = camera.screen_size();
        let (screen_w, screen_h) = (screen_w as f32, screen_h as f32);

        if let Some(dialog) = &self.dialog {
            queue.push(DrawCmd::ui(
                (screen_w * 0.1, screen_h * 0.65),
                (screen_w * 0.8, screen_h * 0.3),
                DrawKind::Dialog {
                    text: dialog.text.clone(),
                    options: dialog.options.clone(),
                    selected_index: dialog.selected_index,
                },
            ));
        }
        if let Some(active) = &self.puzzle {
            let side = screen_w.min(screen_h) * 0.6;
            queue.push(DrawCmd::ui(
                ((screen_w - side) / 2.0, (screen_h - side) / 2.0),
                (side, side),
                DrawKind::Puzzle(active.puzzle.view()),
            ));
        }
        if self.inventory_visible {
            queue.push(DrawCmd::ui(
                (screen_w * 0.7, screen_h * 0.05),
                (screen_w * 0.25, screen_h * 0.4),
                DrawKind::InventoryOverlay {
                    rows: world.inventory().rows(),
                },
            ));
        }
    }

    /// Top-left player stats; `None` when the world has no player.
    pub fn status_bar_command(&self, world: &World, play_time: Duration) -> Option<DrawCmd> {
        let entity = world.player_entity()?;
        let player = entity.as_player()?;
        let view = StatusBarView {
            hp: player.hp(),
            max_hp: player.max_hp(),
            intelligence: player.intelligence(),
            max_intelligence: STAT_MAX,
            fatigue: player.fatigue(),
            max_fatigue: STAT_MAX,
            clock: format_game_time(play_time),
        };
        Some(DrawCmd::ui((8.0, 8.0), (180.0, 96.0), DrawKind::StatusBar(view)))
    }

    /// Centered menu text shown instead of the world while paused.
    pub fn menu_command(&self, lines: Vec<String>, camera: &Camera) -> DrawCmd {
        let (screen_w, screen_h) = camera.screen_size();
        let (screen_w, screen_h) = (screen_w as f32, screen_h as f32);
        DrawCmd::ui(
            (screen_w * 0.25, screen_h * 0.2),
            (screen_w * 0.5, screen_h * 0.6),
            DrawKind::Text { lines },
        )
    }
}

/// Inclusive tile range covering `rect`, clamped to the map; `None` when the
/// view misses the map entirely.
fn visible_tile_range(tile_map: &TileMap, rect: WorldRect) -> Option<TileRange> {
    if tile_map.width() == 0 || tile_map.height() == 0 {
        return None;
    }
    let tile_size = tile_map.tile_size() as f32;
    let raw_x_min = (rect.min_x / tile_size).floor() as i64;
    let raw_x_max = (rect.max_x / tile_size).ceil() as i64 - 1;
    let raw_y_min = (rect.min_y / tile_size).floor() as i64;
    let raw_y_max = (rect.max_y / tile_size).ceil() as i64 - 1;

    let x_min = raw_x_min.max(0);
    let x_max = raw_x_max.min(i64::from(tile_map.width()) - 1);
    let y_min = raw_y_min.max(0);
    let y_max = raw_y_max.min(i64::from(tile_map.height()) - 1);
    if x_min > x_max || y_min > y_max {
        return None;
    }
    Some(TileRange {
        x_min: x_min as u32,
        x_max: x_max as u32,
        y_min: y_min as u32,
        y_max: y_max as u32,
    })
}
