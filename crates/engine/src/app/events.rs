use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use super::entities::EntityId;
use super::primitives::Pos;
use super::puzzle::PuzzleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Input,
    AskDialog,
    CloseDialog,
    DialogInput,
    DialogChoice,
    FruitPicked,
    InventoryChange,
    InventoryToggle,
    BeginPuzzle,
    PuzzleInput,
    PuzzleFinished,
    PuzzleSolved,
    EntityDamaged,
    PlaceModeToggle,
    GamePaused,
    GameResumed,
    NewGame,
    OpenSettings,
    OpenHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Key,
    Click,
}

/// `INPUT` payload. Keys and positions are optional so a producer that forgets
/// one yields a tolerated, logged fault instead of an unrepresentable event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputPayload {
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub key: Option<String>,
    pub position: Option<(i32, i32)>,
}

impl InputPayload {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            input_type: InputType::Key,
            key: Some(key.into()),
            position: None,
        }
    }

    pub fn click(x: i32, y: i32) -> Self {
        Self {
            input_type: InputType::Click,
            key: None,
            position: Some((x, y)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    PickFruit,
    ShakeTree,
    Greet,
}

/// Resolved by `World` when the dialog it was attached to produces a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingInteraction {
    pub entity_id: EntityId,
    pub actor_id: EntityId,
    pub kind: InteractionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogRequest {
    pub dialog: String,
    pub options: Vec<String>,
    pub selected_index: usize,
    pub pending: Option<PendingInteraction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    Input(InputPayload),
    AskDialog(DialogRequest),
    CloseDialog,
    DialogInput {
        key: String,
    },
    DialogChoice {
        pending: PendingInteraction,
        choice: String,
    },
    FruitPicked {
        fruit_id: EntityId,
        actor_id: EntityId,
    },
    InventoryChange {
        action: InventoryAction,
        object_name: String,
        item_id: String,
    },
    InventoryToggle,
    BeginPuzzle {
        puzzle_kind: PuzzleKind,
        stone_id: Option<EntityId>,
    },
    PuzzleInput {
        key: String,
    },
    PuzzleFinished {
        stone_id: Option<EntityId>,
        solved: bool,
    },
    PuzzleSolved {
        stone_id: EntityId,
    },
    EntityDamaged {
        target_id: EntityId,
        source_id: EntityId,
        amount: i32,
    },
    PlaceModeToggle,
    GamePaused,
    GameResumed,
    NewGame,
    OpenSettings,
    OpenHelp,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Input(_) => EventKind::Input,
            EventPayload::AskDialog(_) => EventKind::AskDialog,
            EventPayload::CloseDialog => EventKind::CloseDialog,
            EventPayload::DialogInput { .. } => EventKind::DialogInput,
            EventPayload::DialogChoice { .. } => EventKind::DialogChoice,
            EventPayload::FruitPicked { .. } => EventKind::FruitPicked,
            EventPayload::InventoryChange { .. } => EventKind::InventoryChange,
            EventPayload::InventoryToggle => EventKind::InventoryToggle,
            EventPayload::BeginPuzzle { .. } => EventKind::BeginPuzzle,
            EventPayload::PuzzleInput { .. } => EventKind::PuzzleInput,
            EventPayload::PuzzleFinished { .. } => EventKind::PuzzleFinished,
            EventPayload::PuzzleSolved { .. } => EventKind::PuzzleSolved,
            EventPayload::EntityDamaged { .. } => EventKind::EntityDamaged,
            EventPayload::PlaceModeToggle => EventKind::PlaceModeToggle,
            EventPayload::GamePaused => EventKind::GamePaused,
            EventPayload::GameResumed => EventKind::GameResumed,
            EventPayload::NewGame => EventKind::NewGame,
            EventPayload::OpenSettings => EventKind::OpenSettings,
            EventPayload::OpenHelp => EventKind::OpenHelp,
        }
    }

    pub fn click_at(pos: Pos) -> Self {
        EventPayload::Input(InputPayload::click(pos.x, pos.y))
    }
}

#[derive(Debug)]
pub struct GameEvent {
    payload: EventPayload,
    consumed: Cell<bool>,
}

impl GameEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            consumed: Cell::new(false),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Marks the event handled. Every snapshot holding this event observes it.
    pub fn consume(&self) {
        self.consumed.set(true);
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }
}

/// Ordered event queue shared by the tick pipeline.
///
/// Consumers read snapshots; consumption only flags an event. Events leave the
/// queue in [`EventBus::clear`], which the engine calls once per frame.
#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Rc<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, payload: EventPayload) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                kind = ?payload.kind(),
                payload = %serde_json::to_string(&payload).unwrap_or_default(),
                queued = self.queue.len(),
                "event_posted"
            );
        }
        self.queue.push(Rc::new(GameEvent::new(payload)));
    }

    pub fn get_events(&self) -> Vec<Rc<GameEvent>> {
        self.queue.clone()
    }

    pub fn clear(&mut self, force: bool) {
        if force {
            self.queue.clear();
        } else {
            self.queue.retain(|event| !event.is_consumed());
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.queue.iter().filter(|event| event.kind() == kind).count()
    }
}
