use tracing::{debug, info};

use super::{InteractContext, Interactable};
use crate::app::events::{DialogRequest, EventBus, EventPayload};
use crate::app::puzzle::PuzzleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoneState {
    Idle,
    PuzzleActive,
    Solved,
}

/// Puzzle trigger. `Solved` is terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Stone {
    state: StoneState,
}

impl Stone {
    pub fn new() -> Self {
        Self {
            state: StoneState::Idle,
        }
    }

    pub fn state(&self) -> StoneState {
        self.state
    }

    /// Applies a `PUZZLE_FINISHED` outcome. Returns true on the transition
    /// into `Solved`, after posting `PUZZLE_SOLVED`.
    pub fn finish_puzzle(
        &mut self,
        stone_id: &super::EntityId,
        solved: bool,
        bus: &mut EventBus,
    ) -> bool {
        if self.state != StoneState::PuzzleActive {
            debug!(stone_id = %stone_id, state = ?self.state, "stone_puzzle_result_ignored");
            return false;
        }
        if solved {
            self.state = StoneState::Solved;
            info!(stone_id = %stone_id, "stone_puzzle_solved");
            bus.post(EventPayload::PuzzleSolved {
                stone_id: stone_id.clone(),
            });
            true
        } else {
            self.state = StoneState::Idle;
            false
        }
    }

    pub(super) fn sprite_state(&self) -> &'static str {
        match self.state {
            StoneState::Idle => "idle",
            StoneState::PuzzleActive => "puzzle_active",
            StoneState::Solved => "solved",
        }
    }
}

impl Default for Stone {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactable for Stone {
    fn interact(&mut self, ctx: &InteractContext<'_>, bus: &mut EventBus) {
        match self.state {
            StoneState::Idle => {
                self.state = StoneState::PuzzleActive;
                bus.post(EventPayload::BeginPuzzle {
                    puzzle_kind: PuzzleKind::SlidingTiles,
                    stone_id: Some(ctx.entity_id.clone()),
                });
            }
            StoneState::PuzzleActive => {}
            StoneState::Solved => bus.post(EventPayload::AskDialog(DialogRequest {
                dialog: "The stone is warm and quiet.".to_string(),
                options: vec!["OK".to_string()],
                selected_index: 0,
                pending: None,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::entities::EntityId;
    use crate::app::events::EventKind;

    fn begin(stone: &mut Stone, id: &EntityId, bus: &mut EventBus) {
        let player = EntityId::new("player");
        let ctx = InteractContext {
            entity_id: id,
            actor_id: &player,
        };
        stone.interact(&ctx, bus);
    }

    #[test]
    fn interaction_begins_puzzle_once() {
        let id = EntityId::new("stone_1");
        let mut stone = Stone::new();
        let mut bus = EventBus::new();

        begin(&mut stone, &id, &mut bus);
        begin(&mut stone, &id, &mut bus);

        assert_eq!(stone.state(), StoneState::PuzzleActive);
        assert_eq!(bus.count_of(EventKind::BeginPuzzle), 1);
    }

    #[test]
    fn solved_is_terminal() {
        let id = EntityId::new("stone_1");
        let mut stone = Stone::new();
        let mut bus = EventBus::new();
        begin(&mut stone, &id, &mut bus);

        assert!(stone.finish_puzzle(&id, true, &mut bus));
        assert!(!stone.finish_puzzle(&id, false, &mut bus));
        begin(&mut stone, &id, &mut bus);

        assert_eq!(stone.state(), StoneState::Solved);
        assert_eq!(bus.count_of(EventKind::PuzzleSolved), 1);
        assert_eq!(bus.count_of(EventKind::BeginPuzzle), 1);
    }

    #[test]
    fn abandoned_puzzle_returns_to_idle() {
        let id = EntityId::new("stone_1");
        let mut stone = Stone::new();
        let mut bus = EventBus::new();
        begin(&mut stone, &id, &mut bus);

        assert!(!stone.finish_puzzle(&id, false, &mut bus));
        assert_eq!(stone.state(), StoneState::Idle);
    }
}
