use super::{InteractContext, Interactable, Living, Vitals};
use crate::app::events::{DialogRequest, EventBus, EventPayload, InteractionKind, PendingInteraction};

const NPC_MAX_HP: i32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    vitals: Vitals,
    name: String,
    greeting: String,
}

impl Npc {
    pub fn new(name: &str, greeting: &str) -> Self {
        Self {
            vitals: Vitals::full(NPC_MAX_HP),
            name: name.to_string(),
            greeting: greeting.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Living for Npc {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }
}

impl Interactable for Npc {
    fn interact(&mut self, ctx: &InteractContext<'_>, bus: &mut EventBus) {
        if !self.is_alive() {
            return;
        }
        bus.post(EventPayload::AskDialog(DialogRequest {
            dialog: format!("{}: {}", self.name, self.greeting),
            options: vec!["Goodbye".to_string()],
            selected_index: 0,
            pending: Some(PendingInteraction {
                entity_id: ctx.entity_id.clone(),
                actor_id: ctx.actor_id.clone(),
                kind: InteractionKind::Greet,
            }),
        }));
    }
}
