use std::time::Duration;

use tracing::{debug, info};

use super::audio::{AudioSink, SFX_BUTTON_CLICK};
use super::camera::Camera;
use super::events::{EventBus, EventKind, EventPayload, InputPayload};
use super::input::{InputEvent, InputSystem};
use super::place::PlaceSystem;
use super::puzzle::PuzzleKind;
use super::rendering::{RenderSystem, ViewSink};
use super::settings::{GameContext, Settings};
use super::tilemap::RegionKind;
use super::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Settings,
    Place,
    World,
}

/// Bus consumers in the order they run every tick. The render system runs
/// afterwards, in [`GameEngine::render`].
pub const TICK_PIPELINE: [PipelineStage; 3] = [
    PipelineStage::Settings,
    PipelineStage::Place,
    PipelineStage::World,
];

pub struct GameEngine {
    bus: EventBus,
    input: InputSystem,
    ctx: GameContext,
    settings: Settings,
    place: PlaceSystem,
    world: World,
    render: RenderSystem,
    camera: Camera,
    clock: Duration,
    last_tick_stages: Vec<PipelineStage>,
}

impl GameEngine {
    pub fn new(
        world: World,
        screen_size: (u32, u32),
        audio: Box<dyn AudioSink>,
        seed: u64,
    ) -> Self {
        let tile_map = world.tile_map();
        let mut camera = Camera::new(
            screen_size.0,
            screen_size.1,
            tile_map.pixel_width(),
            tile_map.pixel_height(),
        );
        if let Some(player) = world.player_entity() {
            camera.center_on_pos(player.pos);
        }
        info!(
            entity_count = world.entities().len(),
            screen_w = screen_size.0,
            screen_h = screen_size.1,
            "game_engine_ready"
        );
        Self {
            bus: EventBus::new(),
            input: InputSystem::new(),
            ctx: GameContext::new(audio),
            settings: Settings,
            place: PlaceSystem::new(),
            world,
            render: RenderSystem::new(seed.wrapping_add(1)),
            camera,
            clock: Duration::ZERO,
            last_tick_stages: Vec::with_capacity(TICK_PIPELINE.len()),
        }
    }

    pub fn input_mut(&mut self) -> &mut InputSystem {
        &mut self.input
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn render_system(&self) -> &RenderSystem {
        &self.render
    }

    /// Sum of every `dt` passed to [`GameEngine::tick`].
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn last_tick_stages(&self) -> &[PipelineStage] {
        &self.last_tick_stages
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_screen_size(width, height);
    }

    /// Classifies pending input into bus events, then runs the pipeline.
    /// Place and world stages are skipped while paused.
    pub fn tick(&mut self, dt: Duration) {
        self.clock = self.clock.saturating_add(dt);
        for event in self.input.consume_events() {
            match event {
                InputEvent::KeyDown(key) => self.classify_key(&key),
                InputEvent::KeyUp(_) => {}
                InputEvent::Click { x, y } => self.classify_click(x, y),
            }
        }

        self.last_tick_stages.clear();
        for stage in TICK_PIPELINE {
            match stage {
                PipelineStage::Settings => {
                    self.settings.update(self.clock, &mut self.bus, &mut self.ctx);
                    if self.ctx.is_paused() {
                        self.drop_world_input();
                    }
                }
                PipelineStage::Place => {
                    if self.ctx.is_paused() {
                        continue;
                    }
                    self.place.update(&mut self.bus, &mut self.ctx, &mut self.world);
                }
                PipelineStage::World => {
                    if self.ctx.is_paused() {
                        continue;
                    }
                    self.world.update(dt, &mut self.bus);
                    if let Some(player) = self.world.player_entity() {
                        self.camera.center_on_pos(player.pos);
                    }
                }
            }
            self.last_tick_stages.push(stage);
        }
    }

    /// Lets the render system consume UI events, flushes one frame, then
    /// drops consumed events from the bus.
    pub fn render(&mut self, view: &mut dyn ViewSink) {
        self.render.update(self.clock, &mut self.bus, &self.world);
        let queue = if self.ctx.is_paused() {
            vec![self.render.menu_command(self.ctx.menu.lines(), &self.camera)]
        } else {
            let mut queue = self.render.build_draw_queue(&self.world, &self.camera);
            queue.extend(
                self.render
                    .status_bar_command(&self.world, self.ctx.play_time(self.clock)),
            );
            queue
        };
        view.flush_to_view(&queue);
        self.bus.clear(false);
    }

    /// Gameplay input left on the bus when the game pauses is discarded so
    /// it does not replay on resume.
    fn drop_world_input(&mut self) {
        for event in self.bus.get_events() {
            let stale = matches!(event.kind(), EventKind::Input | EventKind::PlaceModeToggle);
            if stale && !event.is_consumed() {
                debug!(kind = ?event.kind(), "input_dropped_on_pause");
                event.consume();
            }
        }
    }

    fn classify_key(&mut self, key: &str) {
        let paused = self.ctx.is_paused();
        if !paused && self.render.puzzle_active() {
            self.bus.post(EventPayload::PuzzleInput {
                key: key.to_string(),
            });
            return;
        }
        if !paused && self.render.dialog_active() {
            self.bus.post(EventPayload::DialogInput {
                key: key.to_string(),
            });
            return;
        }

        if matches!(key, "Escape" | "p" | "P") {
            if !paused {
                self.bus.post(EventPayload::GamePaused);
            } else if self.ctx.menu.continue_enabled {
                self.bus.post(EventPayload::GameResumed);
            }
            return;
        }

        if paused {
            match key {
                "n" | "N" => self.bus.post(EventPayload::NewGame),
                "o" | "O" => self.bus.post(EventPayload::OpenSettings),
                "h" | "H" => self.bus.post(EventPayload::OpenHelp),
                _ => debug!(key, "key_dropped_while_paused"),
            }
            return;
        }

        match key {
            "i" | "I" => self.bus.post(EventPayload::InventoryToggle),
            "e" | "E" => self.bus.post(EventPayload::PlaceModeToggle),
            "+" | "=" => self.camera.apply_zoom_steps(1),
            "-" => self.camera.apply_zoom_steps(-1),
            _ => self.bus.post(EventPayload::Input(InputPayload::key(key))),
        }
    }

    fn classify_click(&mut self, screen_x: f32, screen_y: f32) {
        if self.ctx.is_paused() {
            debug!(screen_x, screen_y, "click_dropped_while_paused");
            return;
        }
        self.ctx.audio().play_sfx(SFX_BUTTON_CLICK);
        let (world_x, world_y) = self.camera.screen_to_world(screen_x, screen_y);
        let (x, y) = (world_x.floor() as i32, world_y.floor() as i32);

        let on_trigger =
            self.world.tile_map().region_at_pixel(x, y) == Some(RegionKind::PuzzleTrigger);
        if on_trigger && !self.render.puzzle_active() {
            debug!(x, y, "puzzle_trigger_clicked");
            self.bus.post(EventPayload::BeginPuzzle {
                puzzle_kind: PuzzleKind::SlidingTiles,
                stone_id: None,
            });
            return;
        }
        self.bus.post(EventPayload::Input(InputPayload::click(x, y)));
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::app::audio::{AudioCue, RecordingAudio};
    use crate::app::entities::{Entity, EntityId, EntityKind, Fruit, Player};
    use crate::app::primitives::Pos;
    use crate::app::rendering::{DrawKind, RecordingView};
    use crate::app::sprites::SpriteLibrary;
    use crate::app::tilemap::{Tile, TileMap};
    use crate::app::world::WorldBlueprint;

    const DT: Duration = Duration::from_millis(16);

    fn engine() -> (GameEngine, RecordingAudio) {
        let mut map = TileMap::filled(5, 5, 10, Tile::new(1, 0, true)).expect("tilemap");
        map.set_region(3, 3, RegionKind::PuzzleTrigger);
        let entities = vec![
            Entity::new("player", Pos::new(0, 0, 2), EntityKind::Player(Player::new(100, 10))),
            Entity::new("fruit_1", Pos::new(10, 0, 1), EntityKind::Fruit(Fruit::new("apple"))),
        ];
        let blueprint =
            WorldBlueprint::new(map, entities, EntityId::new("player")).expect("blueprint");
        let world = World::new(Rc::new(blueprint), Rc::new(SpriteLibrary::new()), 5);
        let recorder = RecordingAudio::new();
        let engine = GameEngine::new(world, (100, 100), Box::new(recorder.clone()), 5);
        (engine, recorder)
    }

    fn frame(engine: &mut GameEngine, view: &mut RecordingView) {
        engine.tick(DT);
        engine.render(view);
    }

    fn start(engine: &mut GameEngine, view: &mut RecordingView) {
        engine.input_mut().key_down("n");
        frame(engine, view);
    }

    fn player_pos(engine: &GameEngine) -> Option<Pos> {
        engine.world().player_entity().map(|entity| entity.pos)
    }

    #[test]
    fn paused_tick_runs_only_settings() {
        let (mut engine, _) = engine();
        engine.tick(DT);
        assert_eq!(engine.last_tick_stages(), &[PipelineStage::Settings]);
    }

    #[test]
    fn new_game_runs_full_pipeline_and_resets_world() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();

        start(&mut engine, &mut view);

        assert_eq!(engine.last_tick_stages(), &TICK_PIPELINE);
        assert!(!engine.context().is_paused());
        assert!(engine.context().menu.continue_enabled);
        assert_eq!(engine.world().generation(), 1);
        assert_eq!(engine.bus().count_of(EventKind::GameResumed), 1);

        frame(&mut engine, &mut view);
        assert!(engine.bus().is_empty());
    }

    #[test]
    fn keys_other_than_menu_keys_are_dropped_while_paused() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        engine.input_mut().key_down("ArrowRight");
        engine.input_mut().key_down("Escape");

        frame(&mut engine, &mut view);

        assert!(engine.context().is_paused());
        assert!(engine.bus().is_empty());
        assert_eq!(player_pos(&engine), Some(Pos::new(0, 0, 2)));
    }

    #[test]
    fn movement_keys_move_the_player_while_running() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().key_down("ArrowDown");
        engine.input_mut().push(InputEvent::KeyUp("ArrowDown".to_string()));
        frame(&mut engine, &mut view);

        assert_eq!(player_pos(&engine), Some(Pos::new(0, 10, 2)));
    }

    #[test]
    fn escape_toggles_pause_once_a_game_is_running() {
        let (mut engine, recorder) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().key_down("Escape");
        frame(&mut engine, &mut view);
        assert!(engine.context().is_paused());

        engine.input_mut().key_down("p");
        frame(&mut engine, &mut view);
        assert!(!engine.context().is_paused());
        assert!(recorder.cues().contains(&AudioCue::Sfx("btn-click".to_string())));
    }

    #[test]
    fn input_queued_with_pause_does_not_replay_on_resume() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().key_down("ArrowDown");
        engine.input_mut().key_down("Escape");
        frame(&mut engine, &mut view);
        assert!(engine.context().is_paused());
        assert_eq!(engine.bus().count_of(EventKind::Input), 0);

        for _ in 0..100 {
            frame(&mut engine, &mut view);
        }
        engine.input_mut().key_down("Escape");
        frame(&mut engine, &mut view);
        frame(&mut engine, &mut view);

        assert!(!engine.context().is_paused());
        assert_eq!(player_pos(&engine), Some(Pos::new(0, 0, 2)));
    }

    #[test]
    fn paused_frame_draws_only_the_menu() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();

        frame(&mut engine, &mut view);

        let last = view.last_frame().expect("frame");
        assert_eq!(last.len(), 1);
        assert!(matches!(&last[0].kind, DrawKind::Text { lines } if lines.contains(&"N - NEW GAME".to_string())));
    }

    #[test]
    fn running_frame_draws_world_then_status_bar() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        let last = view.last_frame().expect("frame");
        assert_eq!(last.iter().filter(|cmd| cmd.kind.name() == "TILE").count(), 25);
        assert_eq!(last.last().map(|cmd| cmd.kind.name()), Some("STATUS_BAR"));
    }

    #[test]
    fn fruit_pickup_through_dialog_reaches_inventory() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().click(14.0, 5.0);
        frame(&mut engine, &mut view);
        assert!(engine.render_system().dialog_active());

        engine.input_mut().key_down("Enter");
        frame(&mut engine, &mut view);
        assert!(!engine.render_system().dialog_active());
        assert_eq!(engine.bus().count_of(EventKind::DialogChoice), 1);

        frame(&mut engine, &mut view);
        frame(&mut engine, &mut view);

        assert!(engine.world().entity(&EntityId::new("fruit_1")).is_none());
        assert_eq!(engine.world().inventory().count("apple"), 1);
        assert!(engine.bus().is_empty());
    }

    #[test]
    fn trigger_click_opens_puzzle_and_routes_keys_to_it() {
        let (mut engine, recorder) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().click(35.0, 35.0);
        frame(&mut engine, &mut view);
        assert!(engine.render_system().puzzle_active());
        assert!(recorder.cues().contains(&AudioCue::Sfx("btn-click".to_string())));

        engine.input_mut().key_down("ArrowRight");
        engine.input_mut().key_down("Escape");
        frame(&mut engine, &mut view);

        assert!(!engine.render_system().puzzle_active());
        assert!(!engine.context().is_paused());
        assert_eq!(player_pos(&engine), Some(Pos::new(0, 0, 2)));

        frame(&mut engine, &mut view);
        assert!(engine.bus().is_empty());
    }

    #[test]
    fn clicks_are_dropped_while_paused() {
        let (mut engine, recorder) = engine();
        let mut view = RecordingView::new();
        engine.input_mut().click(14.0, 5.0);

        frame(&mut engine, &mut view);

        assert!(engine.bus().is_empty());
        assert!(!recorder.cues().iter().any(|cue| matches!(cue, AudioCue::Sfx(_))));
    }

    #[test]
    fn zoom_keys_step_the_camera() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().key_down("+");
        engine.input_mut().key_down("+");
        engine.input_mut().key_down("-");
        frame(&mut engine, &mut view);

        assert!((engine.camera().zoom() - 1.1).abs() < 1e-4);
    }

    #[test]
    fn inventory_key_toggles_overlay() {
        let (mut engine, _) = engine();
        let mut view = RecordingView::new();
        start(&mut engine, &mut view);

        engine.input_mut().key_down("i");
        frame(&mut engine, &mut view);

        assert!(engine.render_system().inventory_visible());
    }

    #[test]
    fn clock_accumulates_tick_durations() {
        let (mut engine, _) = engine();
        engine.tick(Duration::from_millis(10));
        engine.tick(Duration::from_millis(15));
        assert_eq!(engine.clock(), Duration::from_millis(25));
    }
}
