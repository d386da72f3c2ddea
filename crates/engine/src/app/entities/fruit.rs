use tracing::debug;

use super::{InteractContext, Interactable};
use crate::app::events::{
    DialogRequest, EventBus, EventPayload, InteractionKind, InventoryAction, PendingInteraction,
};

pub const FRUIT_OPTION_PICK_UP: &str = "Pick up";
pub const FRUIT_OPTION_LEAVE: &str = "Leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FruitState {
    Fresh,
    Picked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fruit {
    item_id: String,
    state: FruitState,
}

impl Fruit {
    pub fn new(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            state: FruitState::Fresh,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn state(&self) -> FruitState {
        self.state
    }

    pub fn mark_picked(&mut self) {
        self.state = FruitState::Picked;
    }

    pub(super) fn sprite_state(&self) -> &'static str {
        match self.state {
            FruitState::Fresh => "fresh",
            FruitState::Picked => "picked",
        }
    }
}

impl Interactable for Fruit {
    fn interact(&mut self, ctx: &InteractContext<'_>, bus: &mut EventBus) {
        if self.state == FruitState::Picked {
            return;
        }
        bus.post(EventPayload::AskDialog(DialogRequest {
            dialog: format!("A ripe {}. Pick it up?", self.item_id),
            options: vec![FRUIT_OPTION_PICK_UP.to_string(), FRUIT_OPTION_LEAVE.to_string()],
            selected_index: 0,
            pending: Some(PendingInteraction {
                entity_id: ctx.entity_id.clone(),
                actor_id: ctx.actor_id.clone(),
                kind: InteractionKind::PickFruit,
            }),
        }));
    }

    fn resolve(&mut self, ctx: &InteractContext<'_>, choice: &str, bus: &mut EventBus) {
        if self.state == FruitState::Picked || choice != FRUIT_OPTION_PICK_UP {
            debug!(entity_id = %ctx.entity_id, choice, "fruit_left_alone");
            return;
        }
        bus.post(EventPayload::InventoryChange {
            action: InventoryAction::Add,
            object_name: "fruit".to_string(),
            item_id: self.item_id.clone(),
        });
        bus.post(EventPayload::FruitPicked {
            fruit_id: ctx.entity_id.clone(),
            actor_id: ctx.actor_id.clone(),
        });
        self.state = FruitState::Picked;
    }
}
