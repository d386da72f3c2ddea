use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use grove_engine::app::{GameEngine, LoggingAudio, LoopConfig, World};
use grove_engine::{resolve_app_paths, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_config, resolve_config_path, ConfigError, GameConfig, CONFIG_ENV_VAR};
use super::world_gen::{self, WorldGenError};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build world: {0}")]
    WorldGen(#[from] WorldGenError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) engine: GameEngine,
    pub(crate) asset_root: PathBuf,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );

    let config = match resolve_config_path(env::var_os(CONFIG_ENV_VAR), &app_paths.root) {
        Some(path) => {
            let config = load_config(&path)?;
            info!(path = %path.display(), seed = config.seed, "config_loaded");
            config
        }
        None => {
            info!("config_defaults");
            GameConfig::default()
        }
    };

    let engine = build_engine(&config)?;
    Ok(AppWiring {
        config: config.loop_config(),
        engine,
        asset_root: app_paths.assets_dir,
    })
}

pub(crate) fn build_engine(config: &GameConfig) -> Result<GameEngine, WorldGenError> {
    let blueprint = world_gen::build_blueprint(config)?;
    let sprites = world_gen::build_sprite_library(config.tile_size)?;
    let world = World::new(Rc::new(blueprint), Rc::new(sprites), config.seed);
    let mut engine = GameEngine::new(
        world,
        (config.window_width, config.window_height),
        Box::new(LoggingAudio),
        config.seed,
    );
    engine.camera_mut().set_zoom_clamped(config.camera_zoom);
    Ok(engine)
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use grove_engine::app::{EntityId, RecordingView};

    use super::*;

    #[test]
    fn default_engine_starts_paused_on_the_menu() {
        let mut engine = build_engine(&GameConfig::default()).expect("engine");
        let mut view = RecordingView::new();

        engine.tick(Duration::from_millis(16));
        engine.render(&mut view);

        assert!(engine.context().is_paused());
        let frame = view.last_frame().expect("frame");
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].kind.name(), "TEXT");
    }

    #[test]
    fn new_game_draws_the_generated_world() {
        let mut engine = build_engine(&GameConfig::default()).expect("engine");
        let mut view = RecordingView::new();

        engine.input_mut().key_down("n");
        engine.tick(Duration::from_millis(16));
        engine.render(&mut view);

        let frame = view.last_frame().expect("frame");
        assert!(frame.iter().any(|cmd| cmd.kind.name() == "TILE"));
        assert!(frame.iter().any(|cmd| cmd.kind.name() == "SPRITE"));
        assert!(engine.world().entity(&EntityId::new("zombie_1")).is_some());
    }

    #[test]
    fn configured_zoom_is_applied_and_clamped() {
        let config = GameConfig {
            camera_zoom: 5.0,
            ..GameConfig::default()
        };
        let engine = build_engine(&config).expect("engine");
        assert!((engine.camera().zoom() - 2.0).abs() < f32::EPSILON);
    }
}
