use super::{InteractContext, Interactable, Living, Vitals};
use crate::app::events::{EventBus, EventPayload};
use crate::app::primitives::Direction;

const STEPS_PER_FATIGUE_POINT: u32 = 10;
const FATIGUE_MAX: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle(Direction),
    Walking(Direction),
    Interacting,
    Dead,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    vitals: Vitals,
    intelligence: i32,
    fatigue: i32,
    step_size: i32,
    state: PlayerState,
    facing: Direction,
    acted_this_tick: bool,
    steps_taken: u32,
}

impl Player {
    pub fn new(max_hp: i32, step_size: i32) -> Self {
        Self {
            vitals: Vitals::full(max_hp),
            intelligence: 0,
            fatigue: 0,
            step_size: step_size.max(1),
            state: PlayerState::Idle(Direction::Down),
            facing: Direction::Down,
            acted_this_tick: false,
            steps_taken: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn step_size(&self) -> i32 {
        self.step_size
    }

    pub fn intelligence(&self) -> i32 {
        self.intelligence
    }

    pub fn fatigue(&self) -> i32 {
        self.fatigue
    }

    pub fn gain_intelligence(&mut self, amount: i32) {
        self.intelligence = self.intelligence.saturating_add(amount.max(0));
    }

    /// Records the outcome of a movement attempt. A rejected move keeps the
    /// last walked direction as the idle facing.
    pub fn record_move(&mut self, direction: Direction, accepted: bool) {
        if !self.is_alive() {
            self.state = PlayerState::Dead;
            return;
        }
        self.acted_this_tick = true;
        if accepted {
            self.facing = direction;
            self.state = PlayerState::Walking(direction);
            self.steps_taken = self.steps_taken.saturating_add(1);
            if self.steps_taken % STEPS_PER_FATIGUE_POINT == 0 {
                self.fatigue = (self.fatigue + 1).min(FATIGUE_MAX);
            }
        } else {
            self.state = PlayerState::Idle(self.facing);
        }
    }

    pub fn record_interaction(&mut self) {
        if self.is_alive() {
            self.acted_this_tick = true;
            self.state = PlayerState::Interacting;
        }
    }

    pub(super) fn update(&mut self) {
        if !self.is_alive() {
            self.state = PlayerState::Dead;
            return;
        }
        if self.acted_this_tick {
            self.acted_this_tick = false;
            return;
        }
        self.state = PlayerState::Idle(self.facing);
    }

    pub(super) fn sprite_state(&self) -> String {
        match self.state {
            PlayerState::Idle(direction) => format!("idle_{}", direction.as_str()),
            PlayerState::Walking(direction) => format!("walking_{}", direction.as_str()),
            PlayerState::Interacting => "interacting".to_string(),
            PlayerState::Dead => "dead".to_string(),
        }
    }
}

impl Living for Player {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }
}

impl Interactable for Player {
    /// Interacting with yourself opens or closes the inventory.
    fn interact(&mut self, _ctx: &InteractContext<'_>, bus: &mut EventBus) {
        bus.post(EventPayload::InventoryToggle);
    }
}
