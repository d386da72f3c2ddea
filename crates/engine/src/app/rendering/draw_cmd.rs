use crate::app::entities::EntityId;
use crate::app::puzzle::PuzzleView;
use crate::app::sprites::SpriteKey;
use crate::app::ui::StatusBarView;

/// Collision boxes are a debug layer drawn above every world layer.
pub const COLLISION_LAYER: i32 = 1_000;
/// Screen-fixed UI, appended after the sorted world commands.
pub const UI_LAYER: i32 = 10_000;

/// One per-frame drawing instruction. Positions and sizes are screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCmd {
    pub position: (f32, f32),
    pub size: (f32, f32),
    pub layer: i32,
    pub scale: f32,
    pub kind: DrawKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Sprite {
        entity_id: EntityId,
        sprite: SpriteKey,
        frame_idx: u32,
        frame_count: u32,
    },
    Tile {
        gid: u32,
        sprite: Option<SpriteKey>,
        passable: bool,
    },
    Collision {
        passable: bool,
    },
    Text {
        lines: Vec<String>,
    },
    Dialog {
        text: String,
        options: Vec<String>,
        selected_index: usize,
    },
    StatusBar(StatusBarView),
    InventoryOverlay {
        rows: Vec<(String, u32)>,
    },
    Puzzle(PuzzleView),
}

impl DrawKind {
    pub fn name(&self) -> &'static str {
        match self {
            DrawKind::Sprite { .. } => "SPRITE",
            DrawKind::Tile { .. } => "TILE",
            DrawKind::Collision { .. } => "COLLISION",
            DrawKind::Text { .. } => "TEXT",
            DrawKind::Dialog { .. } => "DIALOG",
            DrawKind::StatusBar(_) => "STATUS_BAR",
            DrawKind::InventoryOverlay { .. } => "INVENTORY",
            DrawKind::Puzzle(_) => "PUZZLE",
        }
    }

    pub fn is_ui(&self) -> bool {
        !matches!(
            self,
            DrawKind::Sprite { .. } | DrawKind::Tile { .. } | DrawKind::Collision { .. }
        )
    }
}

impl DrawCmd {
    /// Screen-fixed panel at `UI_LAYER`.
    pub fn ui(position: (f32, f32), size: (f32, f32), kind: DrawKind) -> Self {
        Self {
            position,
            size,
            layer: UI_LAYER,
            scale: 1.0,
            kind,
        }
    }
}
