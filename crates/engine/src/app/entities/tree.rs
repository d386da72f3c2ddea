use tracing::debug;

use super::{InteractContext, Interactable};
use crate::app::events::{
    DialogRequest, EventBus, EventPayload, InteractionKind, InventoryAction, PendingInteraction,
};

pub const TREE_OPTION_SHAKE: &str = "Shake";
const TREE_OPTION_LEAVE: &str = "Leave";

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    fruit_item: String,
    fruits_left: u32,
}

impl Tree {
    pub fn new(fruit_item: &str, fruits_left: u32) -> Self {
        Self {
            fruit_item: fruit_item.to_string(),
            fruits_left,
        }
    }

    pub fn fruits_left(&self) -> u32 {
        self.fruits_left
    }

    pub(super) fn sprite_state(&self) -> &'static str {
        if self.fruits_left > 0 {
            "idle"
        } else {
            "bare"
        }
    }
}

impl Interactable for Tree {
    fn interact(&mut self, ctx: &InteractContext<'_>, bus: &mut EventBus) {
        let (dialog, options) = if self.fruits_left > 0 {
            (
                format!("A {} tree heavy with fruit.", self.fruit_item),
                vec![TREE_OPTION_SHAKE.to_string(), TREE_OPTION_LEAVE.to_string()],
            )
        } else {
            (
                "The branches are bare.".to_string(),
                vec![TREE_OPTION_LEAVE.to_string()],
            )
        };
        bus.post(EventPayload::AskDialog(DialogRequest {
            dialog,
            options,
            selected_index: 0,
            pending: Some(PendingInteraction {
                entity_id: ctx.entity_id.clone(),
                actor_id: ctx.actor_id.clone(),
                kind: InteractionKind::ShakeTree,
            }),
        }));
    }

    fn resolve(&mut self, ctx: &InteractContext<'_>, choice: &str, bus: &mut EventBus) {
        if choice != TREE_OPTION_SHAKE || self.fruits_left == 0 {
            debug!(entity_id = %ctx.entity_id, choice, fruits_left = self.fruits_left, "tree_not_shaken");
            return;
        }
        self.fruits_left -= 1;
        bus.post(EventPayload::InventoryChange {
            action: InventoryAction::Add,
            object_name: "fruit".to_string(),
            item_id: self.fruit_item.clone(),
        });
    }
}
