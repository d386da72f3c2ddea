use std::time::Duration;

use tracing::info;

use super::audio::{AudioSink, BGM_NORMAL, SFX_BUTTON_CLICK};
use super::events::{EventBus, EventPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Paused,
    Resumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuState {
    pub main_menu_visible: bool,
    pub continue_enabled: bool,
    pub settings_visible: bool,
    pub help_visible: bool,
}

impl MenuState {
    fn hide_all(&mut self) {
        self.main_menu_visible = false;
        self.settings_visible = false;
        self.help_visible = false;
    }

    /// Text shown in place of the world while paused.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.help_visible {
            lines.extend(
                [
                    "HOW TO PLAY",
                    "ARROWS/WASD - MOVE",
                    "CLICK - INTERACT",
                    "I - INVENTORY",
                    "E - PLACE MODE",
                    "+/- - ZOOM",
                    "ESC/P - PAUSE",
                ]
                .map(String::from),
            );
        } else if self.settings_visible {
            lines.extend(["SETTINGS", "ZOOM WITH + AND -"].map(String::from));
        }
        if self.main_menu_visible || lines.is_empty() {
            lines.push("GROVE".to_string());
            if self.continue_enabled {
                lines.push("ESC - CONTINUE".to_string());
            }
            lines.extend(["N - NEW GAME", "O - SETTINGS", "H - HELP"].map(String::from));
        }
        lines
    }
}

/// Accumulates wall time spent paused so the play clock can exclude it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayState {
    paused_total: Duration,
    paused_since: Option<Duration>,
}

impl DelayState {
    pub fn pause(&mut self, now: Duration) {
        if self.paused_since.is_none() {
            self.paused_since = Some(now);
        }
    }

    pub fn resume(&mut self, now: Duration) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total = self.paused_total.saturating_add(now.saturating_sub(since));
        }
    }

    pub fn total(&self, now: Duration) -> Duration {
        let open = self
            .paused_since
            .map(|since| now.saturating_sub(since))
            .unwrap_or(Duration::ZERO);
        self.paused_total.saturating_add(open)
    }
}

/// Process-wide game state, passed explicitly to the systems that need it.
pub struct GameContext {
    state: GameState,
    pub menu: MenuState,
    pub place_mode: bool,
    run_started: Duration,
    delay: DelayState,
    audio: Box<dyn AudioSink>,
}

impl GameContext {
    /// Starts paused on the main menu with nothing to continue.
    pub fn new(mut audio: Box<dyn AudioSink>) -> Self {
        audio.play_bgm(BGM_NORMAL);
        let mut delay = DelayState::default();
        delay.pause(Duration::ZERO);
        Self {
            state: GameState::Paused,
            menu: MenuState {
                main_menu_visible: true,
                ..MenuState::default()
            },
            place_mode: false,
            run_started: Duration::ZERO,
            delay,
            audio,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == GameState::Paused
    }

    pub fn audio(&mut self) -> &mut dyn AudioSink {
        self.audio.as_mut()
    }

    /// Time played in the current run, excluding paused time.
    pub fn play_time(&self, now: Duration) -> Duration {
        now.saturating_sub(self.run_started)
            .saturating_sub(self.delay.total(now))
    }

    fn pause(&mut self, now: Duration) {
        self.state = GameState::Paused;
        self.delay.pause(now);
    }

    fn restart_clock(&mut self, now: Duration) {
        self.run_started = now;
        self.delay = DelayState::default();
    }

    fn resume(&mut self, now: Duration) {
        self.state = GameState::Resumed;
        self.delay.resume(now);
        self.menu.hide_all();
    }
}

/// Pause/menu state machine. First consumer in the tick pipeline.
#[derive(Debug, Default)]
pub struct Settings;

impl Settings {
    pub fn update(&mut self, now: Duration, bus: &mut EventBus, ctx: &mut GameContext) {
        for event in bus.get_events() {
            if event.is_consumed() {
                continue;
            }
            match event.payload() {
                EventPayload::GamePaused => {
                    ctx.pause(now);
                    ctx.menu.main_menu_visible = true;
                    ctx.menu.continue_enabled = true;
                    ctx.audio.play_sfx(SFX_BUTTON_CLICK);
                    info!("game_paused");
                    event.consume();
                }
                EventPayload::GameResumed => {
                    if ctx.is_paused() {
                        ctx.resume(now);
                        info!("game_resumed");
                    }
                    event.consume();
                }
                EventPayload::NewGame => {
                    // World consumes NEW_GAME after rebuilding from its blueprint.
                    ctx.restart_clock(now);
                    ctx.resume(now);
                    ctx.menu.continue_enabled = true;
                    ctx.place_mode = false;
                    ctx.audio.play_bgm(BGM_NORMAL);
                    info!("new_game_requested");
                }
                EventPayload::OpenSettings => {
                    ctx.pause(now);
                    ctx.menu.settings_visible = true;
                    ctx.menu.help_visible = false;
                    event.consume();
                }
                EventPayload::OpenHelp => {
                    ctx.pause(now);
                    ctx.menu.help_visible = true;
                    ctx.menu.settings_visible = false;
                    event.consume();
                }
                _ => {}
            }
        }
    }
}
