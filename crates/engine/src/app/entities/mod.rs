mod fruit;
mod npc;
mod player;
mod stone;
mod tree;
mod zombie;

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::{EventBus, EventPayload, GameEvent};
use super::primitives::Pos;
use super::sprites::SpriteLibrary;

pub use fruit::{Fruit, FruitState, FRUIT_OPTION_PICK_UP};
pub use npc::Npc;
pub use player::{Player, PlayerState};
pub use stone::{Stone, StoneState};
pub use tree::Tree;
pub use zombie::{Zombie, ZombieMode, ZombieTuning};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Passability and interactability, independent of entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behaviour {
    pub passable: bool,
    pub interactable: bool,
}

impl Behaviour {
    pub const fn new(passable: bool, interactable: bool) -> Self {
        Self {
            passable,
            interactable,
        }
    }
}

/// Read-only passability query, implemented by the world and by the view of
/// the world an entity sees while it updates (which excludes the entity).
pub trait Passability {
    fn is_passable(&self, x: i32, y: i32) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    pub hp: i32,
    pub max_hp: i32,
}

impl Vitals {
    pub fn full(max_hp: i32) -> Self {
        let max_hp = max_hp.max(0);
        Self { hp: max_hp, max_hp }
    }
}

pub trait Living {
    fn vitals(&self) -> &Vitals;
    fn vitals_mut(&mut self) -> &mut Vitals;

    fn hp(&self) -> i32 {
        self.vitals().hp
    }

    fn max_hp(&self) -> i32 {
        self.vitals().max_hp
    }

    fn is_alive(&self) -> bool {
        self.hp() > 0
    }

    /// Negative amounts are ignored; hp never drops below zero.
    fn take_damage(&mut self, amount: i32) {
        let vitals = self.vitals_mut();
        vitals.hp = vitals.hp.saturating_sub(amount.max(0)).max(0);
    }

    fn heal(&mut self, amount: i32) {
        let vitals = self.vitals_mut();
        vitals.hp = vitals.hp.saturating_add(amount.max(0)).min(vitals.max_hp);
    }
}

pub struct InteractContext<'a> {
    pub entity_id: &'a EntityId,
    pub actor_id: &'a EntityId,
}

pub trait Interactable {
    fn interact(&mut self, ctx: &InteractContext<'_>, bus: &mut EventBus);

    /// Applies a dialog choice previously offered by [`Interactable::interact`].
    fn resolve(&mut self, ctx: &InteractContext<'_>, choice: &str, bus: &mut EventBus) {
        let _ = bus;
        debug!(entity_id = %ctx.entity_id, choice, "interaction_choice_ignored");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChaseTarget<'a> {
    pub id: &'a EntityId,
    pub pos: Pos,
}

pub struct UpdateContext<'a> {
    pub dt: Duration,
    pub events: &'a [Rc<GameEvent>],
    pub world: &'a dyn Passability,
    pub target: Option<ChaseTarget<'a>>,
    pub rng: &'a mut ChaCha8Rng,
    pub bus: &'a mut EventBus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(Player),
    Fruit(Fruit),
    Tree(Tree),
    Stone(Stone),
    Zombie(Zombie),
    Npc(Npc),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player(_) => "player",
            EntityKind::Fruit(_) => "fruit",
            EntityKind::Tree(_) => "tree",
            EntityKind::Stone(_) => "stone",
            EntityKind::Zombie(_) => "zombie",
            EntityKind::Npc(_) => "npc",
        }
    }

    fn default_behaviour(&self) -> Option<Behaviour> {
        match self {
            EntityKind::Player(_) => None,
            EntityKind::Fruit(_) => Some(Behaviour::new(true, true)),
            EntityKind::Tree(_) => Some(Behaviour::new(false, true)),
            EntityKind::Stone(_) => Some(Behaviour::new(false, true)),
            EntityKind::Zombie(_) => Some(Behaviour::new(false, false)),
            EntityKind::Npc(_) => Some(Behaviour::new(false, true)),
        }
    }

    fn sprite_state(&self) -> String {
        match self {
            EntityKind::Player(player) => player.sprite_state(),
            EntityKind::Fruit(fruit) => fruit.sprite_state().to_string(),
            EntityKind::Tree(tree) => tree.sprite_state().to_string(),
            EntityKind::Stone(stone) => stone.sprite_state().to_string(),
            EntityKind::Zombie(zombie) => zombie.sprite_state(),
            EntityKind::Npc(_) => "idle".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AnimationClock {
    state: String,
    elapsed: Duration,
    frame_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    pub pos: Pos,
    behaviour: Option<Behaviour>,
    sprite_set: String,
    animation: AnimationClock,
    kind: EntityKind,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, pos: Pos, kind: EntityKind) -> Self {
        let behaviour = kind.default_behaviour();
        let sprite_set = kind.name().to_string();
        let state = kind.sprite_state();
        Self {
            id: id.into(),
            pos,
            behaviour,
            sprite_set,
            animation: AnimationClock {
                state,
                ..AnimationClock::default()
            },
            kind,
        }
    }

    pub fn with_behaviour(mut self, behaviour: Option<Behaviour>) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn with_sprite_set(mut self, sprite_set: &str) -> Self {
        self.sprite_set = sprite_set.to_string();
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn behaviour(&self) -> Option<Behaviour> {
        self.behaviour
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    /// Occupies its exact pixel position for passability queries.
    pub fn is_blocking(&self) -> bool {
        self.behaviour.is_some_and(|behaviour| !behaviour.passable)
    }

    /// Has the `Interactable` capability and its behaviour does not veto it.
    pub fn accepts_interaction(&self) -> bool {
        let allowed = self.behaviour.map_or(true, |behaviour| behaviour.interactable);
        allowed && self.as_interactable().is_some()
    }

    pub fn sprite_set(&self) -> &str {
        &self.sprite_set
    }

    pub fn sprite_state(&self) -> String {
        self.kind.sprite_state()
    }

    pub fn frame_idx(&self) -> u32 {
        self.animation.frame_idx
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_interactable(&self) -> Option<&dyn Interactable> {
        match &self.kind {
            EntityKind::Player(player) => Some(player),
            EntityKind::Fruit(fruit) => Some(fruit),
            EntityKind::Tree(tree) => Some(tree),
            EntityKind::Stone(stone) => Some(stone),
            EntityKind::Npc(npc) => Some(npc),
            EntityKind::Zombie(_) => None,
        }
    }

    pub fn as_interactable_mut(&mut self) -> Option<&mut dyn Interactable> {
        match &mut self.kind {
            EntityKind::Player(player) => Some(player),
            EntityKind::Fruit(fruit) => Some(fruit),
            EntityKind::Tree(tree) => Some(tree),
            EntityKind::Stone(stone) => Some(stone),
            EntityKind::Npc(npc) => Some(npc),
            EntityKind::Zombie(_) => None,
        }
    }

    pub fn as_living(&self) -> Option<&dyn Living> {
        match &self.kind {
            EntityKind::Player(player) => Some(player),
            EntityKind::Zombie(zombie) => Some(zombie),
            EntityKind::Npc(npc) => Some(npc),
            _ => None,
        }
    }

    pub fn as_living_mut(&mut self) -> Option<&mut dyn Living> {
        match &mut self.kind {
            EntityKind::Player(player) => Some(player),
            EntityKind::Zombie(zombie) => Some(zombie),
            EntityKind::Npc(npc) => Some(npc),
            _ => None,
        }
    }

    /// Per-tick behaviour. Living entities first apply `ENTITY_DAMAGED`
    /// events addressed to them, then the kind-specific step runs.
    pub fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.apply_damage_events(ctx.events);

        match &mut self.kind {
            EntityKind::Player(player) => player.update(),
            EntityKind::Zombie(zombie) => zombie.update(&self.id, &mut self.pos, ctx),
            EntityKind::Fruit(_) | EntityKind::Tree(_) | EntityKind::Stone(_) | EntityKind::Npc(_) => {}
        }
    }

    fn apply_damage_events(&mut self, events: &[Rc<GameEvent>]) {
        for event in events {
            if event.is_consumed() {
                continue;
            }
            let EventPayload::EntityDamaged {
                target_id,
                source_id,
                amount,
            } = event.payload()
            else {
                continue;
            };
            if target_id != &self.id {
                continue;
            }
            let id = self.id.clone();
            let Some(living) = self.as_living_mut() else {
                continue;
            };
            living.take_damage(*amount);
            debug!(
                entity_id = %id,
                source_id = %source_id,
                amount,
                hp = living.hp(),
                "entity_damaged"
            );
            event.consume();
        }
    }

    /// Advances the animation frame. A state change restarts the clock.
    pub fn advance_animation(&mut self, dt: Duration, sprites: &SpriteLibrary) {
        let state = self.kind.sprite_state();
        if state != self.animation.state {
            self.animation = AnimationClock {
                state,
                ..AnimationClock::default()
            };
        } else {
            self.animation.elapsed = self.animation.elapsed.saturating_add(dt);
        }
        self.animation.frame_idx = sprites
            .sprite(&self.sprite_set, &self.animation.state)
            .map(|meta| meta.frame_at(self.animation.elapsed))
            .unwrap_or(0);
    }
}
