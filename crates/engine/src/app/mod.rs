mod audio;
mod camera;
mod entities;
mod events;
mod game_engine;
mod input;
mod inventory;
mod loop_runner;
mod place;
mod primitives;
mod puzzle;
mod rendering;
mod settings;
mod sprites;
mod tilemap;
mod ui;
mod world;

pub use audio::{AudioCue, AudioSink, LoggingAudio, RecordingAudio, BGM_NORMAL, SFX_BUTTON_CLICK};
pub use camera::{Camera, WorldRect, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN};
pub use entities::{
    Behaviour, Entity, EntityId, EntityKind, Fruit, FruitState, InteractContext, Interactable,
    Living, Npc, Passability, Player, PlayerState, Stone, StoneState, Tree, Vitals, Zombie,
    ZombieMode, ZombieTuning,
};
pub use events::{
    DialogRequest, EventBus, EventKind, EventPayload, GameEvent, InputPayload, InputType,
    InteractionKind, InventoryAction, PendingInteraction,
};
pub use game_engine::{GameEngine, PipelineStage, TICK_PIPELINE};
pub use input::{InputEvent, InputSystem};
pub use inventory::Inventory;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use place::{PlaceRejection, PlaceSystem};
pub use primitives::{Direction, Pos};
pub use puzzle::{create_puzzle, Puzzle, PuzzleKind, PuzzleView, SlidingTiles};
pub use rendering::{
    DrawCmd, DrawKind, PixelsView, RecordingView, RenderSystem, ViewSink, COLLISION_LAYER,
    UI_LAYER,
};
pub use settings::{DelayState, GameContext, GameState, MenuState, Settings};
pub use sprites::{SpriteKey, SpriteKeyError, SpriteLibrary, SpriteMeta, SpriteRegistry};
pub use tilemap::{CollisionBox, RegionKind, Tile, TileMap, TileMapError};
pub use ui::{format_game_time, DialogBox, DialogOutcome, StatusBarView, STAT_MAX};
pub use world::{BlueprintError, World, WorldBlueprint};
