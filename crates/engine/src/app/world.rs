use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::entities::{
    ChaseTarget, Entity, EntityId, EntityKind, InteractContext, Passability, Player,
    UpdateContext,
};
use super::events::{EventBus, EventPayload, InputType, InventoryAction};
use super::inventory::Inventory;
use super::primitives::{Direction, Pos};
use super::sprites::SpriteLibrary;
use super::tilemap::TileMap;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlueprintError {
    #[error("duplicate entity id '{0}'")]
    DuplicateEntityId(EntityId),
    #[error("player entity '{0}' is missing or is not a player")]
    MissingPlayer(EntityId),
}

/// Immutable initial state. A new game rebuilds live state from this.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBlueprint {
    tile_map: TileMap,
    entities: Vec<Entity>,
    player_id: EntityId,
}

impl WorldBlueprint {
    pub fn new(
        tile_map: TileMap,
        entities: Vec<Entity>,
        player_id: EntityId,
    ) -> Result<Self, BlueprintError> {
        let mut seen = HashSet::new();
        for entity in &entities {
            if !seen.insert(entity.id().clone()) {
                return Err(BlueprintError::DuplicateEntityId(entity.id().clone()));
            }
        }
        let has_player = entities
            .iter()
            .any(|entity| entity.id() == &player_id && entity.as_player().is_some());
        if !has_player {
            return Err(BlueprintError::MissingPlayer(player_id));
        }
        Ok(Self {
            tile_map,
            entities,
            player_id,
        })
    }

    pub fn tile_map(&self) -> &TileMap {
        &self.tile_map
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn player_id(&self) -> &EntityId {
        &self.player_id
    }
}

/// Authoritative simulation state: tile map, entities, and the inventory.
pub struct World {
    blueprint: Rc<WorldBlueprint>,
    tile_map: TileMap,
    entities: Vec<Entity>,
    player_id: EntityId,
    inventory: Inventory,
    sprites: Rc<SpriteLibrary>,
    seed: u64,
    rng: ChaCha8Rng,
    generation: u64,
}

impl World {
    pub fn new(blueprint: Rc<WorldBlueprint>, sprites: Rc<SpriteLibrary>, seed: u64) -> Self {
        Self {
            tile_map: blueprint.tile_map.clone(),
            entities: blueprint.entities.clone(),
            player_id: blueprint.player_id.clone(),
            blueprint,
            inventory: Inventory::new(),
            sprites,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            generation: 0,
        }
    }

    pub fn tile_map(&self) -> &TileMap {
        &self.tile_map
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_map.tile_size() as i32
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    pub fn player_id(&self) -> &EntityId {
        &self.player_id
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.entity(&self.player_id)
    }

    pub fn player(&self) -> Option<&Player> {
        self.player_entity().and_then(Entity::as_player)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn sprites(&self) -> &SpriteLibrary {
        &self.sprites
    }

    /// Bumped on every reset, so UI holding transient state can drop it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rejects an id already present in the world.
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        if self.entity(entity.id()).is_some() {
            warn!(entity_id = %entity.id(), "entity_add_rejected_duplicate_id");
            return false;
        }
        debug!(entity_id = %entity.id(), kind = entity.kind().name(), "entity_added");
        self.entities.push(entity);
        true
    }

    /// Removing an unknown or already-removed id is a no-op.
    pub fn remove_entity(&mut self, id: &EntityId) -> Option<Entity> {
        let Some(index) = self.entities.iter().position(|entity| entity.id() == id) else {
            debug!(entity_id = %id, "entity_remove_ignored_unknown_id");
            return None;
        };
        info!(entity_id = %id, "entity_removed");
        Some(self.entities.remove(index))
    }

    /// Entities within Chebyshev distance `radius` of `center`.
    pub fn find_near(&self, center: Pos, radius: i32) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.pos.chebyshev(center) <= radius)
            .collect()
    }

    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        self.tile_map.is_passable(x, y) && !occupied_by_blocker(&self.entities, x, y)
    }

    pub fn reset(&mut self) {
        self.tile_map = self.blueprint.tile_map.clone();
        self.entities = self.blueprint.entities.clone();
        self.player_id = self.blueprint.player_id.clone();
        self.inventory = Inventory::new();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.generation = self.generation.wrapping_add(1);
        info!(
            generation = self.generation,
            entity_count = self.entities.len(),
            "world_reset"
        );
    }

    /// One simulation pass: route owned events, then step every entity.
    pub fn update(&mut self, dt: Duration, bus: &mut EventBus) {
        let events = bus.get_events();

        for event in &events {
            if event.is_consumed() {
                continue;
            }
            match event.payload() {
                EventPayload::NewGame => {
                    event.consume();
                    self.reset();
                    bus.clear(true);
                    bus.post(EventPayload::GameResumed);
                    return;
                }
                EventPayload::Input(input) => {
                    match input.input_type {
                        InputType::Key => match input.key.as_deref() {
                            Some(key) => self.handle_key(key),
                            None => warn!("input_key_missing_key"),
                        },
                        InputType::Click => match input.position {
                            Some((x, y)) => self.handle_click(x, y, bus),
                            None => warn!("input_click_missing_position"),
                        },
                    }
                    event.consume();
                }
                EventPayload::DialogChoice { pending, choice } => {
                    let entity_id = pending.entity_id.clone();
                    match self.entity_mut(&entity_id) {
                        Some(entity) => match entity.as_interactable_mut() {
                            Some(target) => {
                                let ctx = InteractContext {
                                    entity_id: &entity_id,
                                    actor_id: &pending.actor_id,
                                };
                                target.resolve(&ctx, choice, bus);
                            }
                            None => warn!(entity_id = %entity_id, "dialog_choice_target_not_interactable"),
                        },
                        None => warn!(entity_id = %entity_id, choice = choice.as_str(), "dialog_choice_entity_missing"),
                    }
                    event.consume();
                }
                EventPayload::FruitPicked { fruit_id, actor_id } => {
                    debug!(fruit_id = %fruit_id, actor_id = %actor_id, "fruit_picked");
                    self.remove_entity(fruit_id);
                    event.consume();
                }
                EventPayload::InventoryChange {
                    action,
                    object_name,
                    item_id,
                } => {
                    match action {
                        InventoryAction::Add => self.inventory.add(item_id, 1),
                        InventoryAction::Remove => {
                            self.inventory.remove(item_id, 1);
                        }
                    }
                    debug!(
                        action = ?action,
                        object_name = object_name.as_str(),
                        item_id = item_id.as_str(),
                        held = self.inventory.count(item_id),
                        "inventory_changed"
                    );
                    event.consume();
                }
                EventPayload::PuzzleFinished { stone_id, solved } => {
                    self.finish_puzzle(stone_id.as_ref(), *solved, bus);
                    event.consume();
                }
                _ => {}
            }
        }

        let player_id = self.player_id.clone();
        let player_pos = self
            .player_entity()
            .filter(|entity| entity.as_living().is_some_and(|living| living.is_alive()))
            .map(|entity| entity.pos);

        for index in 0..self.entities.len() {
            let (before, rest) = self.entities.split_at_mut(index);
            let Some((current, after)) = rest.split_first_mut() else {
                break;
            };
            let view = WorldView {
                tile_map: &self.tile_map,
                before,
                after,
            };
            let target = player_pos
                .filter(|_| current.id() != &player_id)
                .map(|pos| ChaseTarget {
                    id: &player_id,
                    pos,
                });
            let mut ctx = UpdateContext {
                dt,
                events: &events,
                world: &view,
                target,
                rng: &mut self.rng,
                bus,
            };
            current.update(&mut ctx);
            current.advance_animation(dt, &self.sprites);
        }

        for event in &events {
            if event.is_consumed() {
                continue;
            }
            if let EventPayload::EntityDamaged { target_id, .. } = event.payload() {
                warn!(target_id = %target_id, "entity_damaged_target_missing");
                event.consume();
            }
        }
    }

    fn handle_key(&mut self, key: &str) {
        let Some(direction) = Direction::from_key(key) else {
            debug!(key, "input_key_unhandled");
            return;
        };
        self.move_player(direction);
    }

    /// Steps the player by its step size. The move is rejected when the
    /// destination pixel is not passable.
    pub fn move_player(&mut self, direction: Direction) -> bool {
        let Some(index) = self.player_index() else {
            warn!(player_id = %self.player_id, "player_missing");
            return false;
        };
        let entity = &self.entities[index];
        let Some(player) = entity.as_player() else {
            return false;
        };
        let alive = entity.as_living().is_some_and(|living| living.is_alive());
        let (dx, dy) = direction.delta();
        let step = player.step_size();
        let target = entity.pos.offset(dx * step, dy * step);
        let accepted = alive && self.is_passable(target.x, target.y);

        let entity = &mut self.entities[index];
        if accepted {
            entity.pos = target;
        }
        if let Some(player) = entity.as_player_mut() {
            player.record_move(direction, accepted);
        }
        if !accepted {
            debug!(x = target.x, y = target.y, direction = direction.as_str(), "player_move_rejected");
        }
        accepted
    }

    /// Click at a world pixel. Candidates are entities near the player (not
    /// near the click) whose tile-sized box contains the point; the highest
    /// `z` wins, later entities win ties.
    fn handle_click(&mut self, x: i32, y: i32, bus: &mut EventBus) {
        let Some(player_pos) = self.player_entity().map(|entity| entity.pos) else {
            warn!(player_id = %self.player_id, "player_missing");
            return;
        };
        let tile_size = self.tile_size();
        let hit = self
            .find_near(player_pos, tile_size)
            .into_iter()
            .filter(|entity| {
                x >= entity.pos.x
                    && x < entity.pos.x + tile_size
                    && y >= entity.pos.y
                    && y < entity.pos.y + tile_size
            })
            .max_by_key(|entity| entity.pos.z)
            .map(|entity| entity.id().clone())
            .and_then(|id| self.entities.iter().position(|entity| entity.id() == &id));

        let Some(index) = hit else {
            debug!(x, y, "click_hit_nothing");
            return;
        };
        if !self.entities[index].accepts_interaction() {
            debug!(entity_id = %self.entities[index].id(), "click_target_not_interactable");
            return;
        }

        let actor_id = self.player_id.clone();
        let entity = &mut self.entities[index];
        let entity_id = entity.id().clone();
        if let Some(target) = entity.as_interactable_mut() {
            let ctx = InteractContext {
                entity_id: &entity_id,
                actor_id: &actor_id,
            };
            target.interact(&ctx, bus);
            debug!(entity_id = %entity_id, "entity_interacted");
        }
        if let Some(player) = self
            .entities
            .iter_mut()
            .find(|entity| entity.id() == &actor_id)
            .and_then(Entity::as_player_mut)
        {
            player.record_interaction();
        }
    }

    fn finish_puzzle(&mut self, stone_id: Option<&EntityId>, solved: bool, bus: &mut EventBus) {
        let Some(stone_id) = stone_id else {
            info!(solved, "trigger_puzzle_finished");
            return;
        };
        let newly_solved = match self.entity_mut(stone_id).map(Entity::kind_mut) {
            Some(EntityKind::Stone(stone)) => stone.finish_puzzle(stone_id, solved, bus),
            _ => {
                warn!(stone_id = %stone_id, "puzzle_finished_stone_missing");
                false
            }
        };
        if newly_solved {
            let player_id = self.player_id.clone();
            if let Some(player) = self.entity_mut(&player_id).and_then(Entity::as_player_mut) {
                player.gain_intelligence(1);
            }
        }
    }

    fn player_index(&self) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.id() == &self.player_id)
    }
}

impl Passability for World {
    fn is_passable(&self, x: i32, y: i32) -> bool {
        World::is_passable(self, x, y)
    }
}

/// The world as seen by one entity during its update: everything but itself.
struct WorldView<'a> {
    tile_map: &'a TileMap,
    before: &'a [Entity],
    after: &'a [Entity],
}

impl Passability for WorldView<'_> {
    fn is_passable(&self, x: i32, y: i32) -> bool {
        self.tile_map.is_passable(x, y)
            && !occupied_by_blocker(self.before, x, y)
            && !occupied_by_blocker(self.after, x, y)
    }
}

fn occupied_by_blocker(entities: &[Entity], x: i32, y: i32) -> bool {
    entities
        .iter()
        .any(|entity| entity.is_blocking() && entity.pos.x == x && entity.pos.y == y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::entities::{
        Fruit, PlayerState, Stone, StoneState, Tree, Zombie, ZombieTuning, FRUIT_OPTION_PICK_UP,
    };
    use crate::app::events::{EventKind, InputPayload, InteractionKind, PendingInteraction};
    use crate::app::tilemap::{CollisionBox, Tile};

    const GRASS: Tile = Tile::new(1, 0, true);
    const WALL: Tile = Tile::new(2, 0, false);
    const DT: Duration = Duration::from_millis(16);

    fn player_at(x: i32, y: i32) -> Entity {
        Entity::new("player", Pos::new(x, y, 2), EntityKind::Player(Player::new(100, 10)))
    }

    fn world_with(tile_map: TileMap, mut extra: Vec<Entity>, player: Entity) -> World {
        extra.insert(0, player);
        let blueprint =
            WorldBlueprint::new(tile_map, extra, EntityId::new("player")).expect("blueprint");
        World::new(Rc::new(blueprint), Rc::new(SpriteLibrary::new()), 7)
    }

    fn open_map(width: u32, height: u32) -> TileMap {
        TileMap::filled(width, height, 10, GRASS).expect("tilemap")
    }

    fn press(world: &mut World, bus: &mut EventBus, key: &str) {
        bus.post(EventPayload::Input(InputPayload::key(key)));
        world.update(DT, bus);
        bus.clear(false);
    }

    fn click(world: &mut World, bus: &mut EventBus, x: i32, y: i32) {
        bus.post(EventPayload::Input(InputPayload::click(x, y)));
        world.update(DT, bus);
    }

    #[test]
    fn blueprint_rejects_duplicate_ids_and_missing_player() {
        let duplicate = WorldBlueprint::new(
            open_map(2, 2),
            vec![player_at(0, 0), player_at(10, 0)],
            EntityId::new("player"),
        );
        assert_eq!(
            duplicate,
            Err(BlueprintError::DuplicateEntityId(EntityId::new("player")))
        );

        let missing = WorldBlueprint::new(open_map(2, 2), vec![], EntityId::new("player"));
        assert_eq!(
            missing,
            Err(BlueprintError::MissingPlayer(EntityId::new("player")))
        );
    }

    #[test]
    fn passability_combines_tiles_boxes_and_blockers() {
        let mut map = open_map(5, 5);
        map.push_tile(1, 1, WALL);
        map.add_collision_box(CollisionBox {
            x: 30,
            y: 30,
            width: 4,
            height: 4,
            passable: false,
        });
        let tree = Entity::new("tree_1", Pos::new(40, 0, 1), EntityKind::Tree(Tree::new("apple", 1)));
        let fruit = Entity::new("fruit_1", Pos::new(0, 40, 1), EntityKind::Fruit(Fruit::new("apple")));
        let world = world_with(map, vec![tree, fruit], player_at(0, 0));

        assert!(!world.is_passable(15, 15));
        assert!(!world.is_passable(31, 31));
        assert!(world.is_passable(34, 34));
        assert!(!world.is_passable(40, 0));
        assert!(world.is_passable(41, 0));
        assert!(world.is_passable(0, 40));
        assert!(world.is_passable(0, 0));
        assert!(!world.is_passable(50, 0));
    }

    #[test]
    fn blocked_move_keeps_position_and_idles_facing_last_walk() {
        let mut map = open_map(5, 5);
        map.push_tile(2, 1, WALL);
        let mut world = world_with(map, vec![], player_at(0, 10));
        let mut bus = EventBus::new();

        press(&mut world, &mut bus, "ArrowRight");
        assert_eq!(world.player_entity().map(|e| e.pos), Some(Pos::new(10, 10, 2)));

        press(&mut world, &mut bus, "ArrowRight");
        let player = world.player().expect("player");
        assert_eq!(world.player_entity().map(|e| e.pos), Some(Pos::new(10, 10, 2)));
        assert_eq!(player.state(), PlayerState::Idle(Direction::Right));
    }

    #[test]
    fn walking_into_a_wall_stops_at_its_edge() {
        let mut map = open_map(10, 10);
        map.set_tiles(5, 4, vec![WALL]);
        let mut world = world_with(map, vec![], player_at(0, 40));
        let mut bus = EventBus::new();
        let mut rejected = 0;

        for _ in 0..10 {
            let before = world.player_entity().map(|e| e.pos);
            press(&mut world, &mut bus, "ArrowRight");
            if world.player_entity().map(|e| e.pos) == before {
                rejected += 1;
            }
        }

        assert_eq!(rejected, 10 - 4);
        assert_eq!(world.player_entity().map(|e| e.pos), Some(Pos::new(40, 40, 2)));
    }

    #[test]
    fn malformed_input_is_consumed_without_effect() {
        let mut world = world_with(open_map(3, 3), vec![], player_at(0, 0));
        let mut bus = EventBus::new();
        bus.post(EventPayload::Input(InputPayload {
            input_type: InputType::Click,
            key: None,
            position: None,
        }));
        bus.post(EventPayload::Input(InputPayload {
            input_type: InputType::Key,
            key: None,
            position: None,
        }));

        world.update(DT, &mut bus);

        assert!(bus.get_events().iter().all(|event| event.is_consumed()));
        assert_eq!(world.player_entity().map(|e| e.pos), Some(Pos::new(0, 0, 2)));
    }

    #[test]
    fn fruit_pickup_round_trip_moves_fruit_into_inventory() {
        let fruit = Entity::new("fruit_1", Pos::new(10, 0, 1), EntityKind::Fruit(Fruit::new("apple")));
        let mut world = world_with(open_map(5, 5), vec![fruit], player_at(0, 0));
        let mut bus = EventBus::new();

        click(&mut world, &mut bus, 14, 5);
        let asked = bus
            .get_events()
            .iter()
            .find_map(|event| match event.payload() {
                EventPayload::AskDialog(request) => request.pending.clone(),
                _ => None,
            })
            .expect("ask dialog");
        assert_eq!(asked.entity_id, EntityId::new("fruit_1"));
        bus.clear(true);

        bus.post(EventPayload::DialogChoice {
            pending: asked,
            choice: FRUIT_OPTION_PICK_UP.to_string(),
        });
        world.update(DT, &mut bus);
        bus.clear(false);
        assert_eq!(bus.count_of(EventKind::InventoryChange), 1);
        assert_eq!(bus.count_of(EventKind::FruitPicked), 1);

        world.update(DT, &mut bus);

        assert!(world.entity(&EntityId::new("fruit_1")).is_none());
        assert_eq!(world.inventory().count("apple"), 1);
    }

    #[test]
    fn click_prefers_topmost_entity_and_ignores_far_ones() {
        let low = Entity::new("fruit_low", Pos::new(10, 0, 1), EntityKind::Fruit(Fruit::new("pear")));
        let high = Entity::new("fruit_high", Pos::new(8, 2, 3), EntityKind::Fruit(Fruit::new("plum")));
        let far = Entity::new("fruit_far", Pos::new(30, 0, 9), EntityKind::Fruit(Fruit::new("fig")));
        let mut world = world_with(open_map(5, 5), vec![low, high, far], player_at(0, 0));
        let mut bus = EventBus::new();

        click(&mut world, &mut bus, 15, 5);
        click(&mut world, &mut bus, 32, 2);

        let asked: Vec<EntityId> = bus
            .get_events()
            .iter()
            .filter_map(|event| match event.payload() {
                EventPayload::AskDialog(request) => {
                    request.pending.as_ref().map(|p| p.entity_id.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(asked, vec![EntityId::new("fruit_high")]);
        assert_eq!(world.player().map(Player::state), Some(PlayerState::Idle(Direction::Down)));
    }

    #[test]
    fn click_tie_on_z_goes_to_later_entity() {
        let first = Entity::new("fruit_first", Pos::new(5, 0, 1), EntityKind::Fruit(Fruit::new("pear")));
        let second = Entity::new("fruit_second", Pos::new(6, 1, 1), EntityKind::Fruit(Fruit::new("plum")));
        let mut world = world_with(open_map(5, 5), vec![first, second], player_at(0, 0));
        let mut bus = EventBus::new();

        click(&mut world, &mut bus, 10, 5);

        let asked = bus
            .get_events()
            .iter()
            .find_map(|event| match event.payload() {
                EventPayload::AskDialog(request) => request.pending.clone(),
                _ => None,
            })
            .expect("ask dialog");
        assert_eq!(asked.entity_id, EntityId::new("fruit_second"));
    }

    #[test]
    fn clicking_the_player_toggles_inventory() {
        let mut world = world_with(open_map(3, 3), vec![], player_at(0, 0));
        let mut bus = EventBus::new();

        click(&mut world, &mut bus, 3, 3);

        assert_eq!(bus.count_of(EventKind::InventoryToggle), 1);
    }

    #[test]
    fn double_removal_is_a_no_op() {
        let fruit = Entity::new("fruit_1", Pos::new(10, 0, 1), EntityKind::Fruit(Fruit::new("apple")));
        let mut world = world_with(open_map(3, 3), vec![fruit], player_at(0, 0));
        let id = EntityId::new("fruit_1");

        assert!(world.remove_entity(&id).is_some());
        assert!(world.remove_entity(&id).is_none());
        assert_eq!(world.entities().len(), 1);
    }

    #[test]
    fn dialog_choice_for_removed_entity_is_ignored() {
        let mut world = world_with(open_map(3, 3), vec![], player_at(0, 0));
        let mut bus = EventBus::new();
        bus.post(EventPayload::DialogChoice {
            pending: PendingInteraction {
                entity_id: EntityId::new("gone"),
                actor_id: EntityId::new("player"),
                kind: InteractionKind::PickFruit,
            },
            choice: FRUIT_OPTION_PICK_UP.to_string(),
        });

        world.update(DT, &mut bus);
        bus.clear(false);

        assert!(bus.is_empty());
    }

    #[test]
    fn new_game_restores_blueprint_and_reposts_resume() {
        let fruit = Entity::new("fruit_1", Pos::new(10, 0, 1), EntityKind::Fruit(Fruit::new("apple")));
        let mut world = world_with(open_map(5, 5), vec![fruit], player_at(0, 0));
        let mut bus = EventBus::new();
        world.remove_entity(&EntityId::new("fruit_1"));
        world.inventory_mut().add("apple", 3);
        press(&mut world, &mut bus, "ArrowDown");

        bus.post(EventPayload::Input(InputPayload::key("ArrowDown")));
        bus.post(EventPayload::NewGame);
        bus.post(EventPayload::InventoryToggle);
        world.update(DT, &mut bus);

        let kinds: Vec<EventKind> = bus.get_events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::GameResumed]);
        assert!(world.entity(&EntityId::new("fruit_1")).is_some());
        assert!(world.inventory().is_empty());
        assert_eq!(world.player_entity().map(|e| e.pos), Some(Pos::new(0, 0, 2)));
        assert_eq!(world.generation(), 1);
    }

    #[test]
    fn solving_a_stone_puzzle_raises_intelligence() {
        let stone = Entity::new("stone_1", Pos::new(10, 0, 1), EntityKind::Stone(Stone::new()));
        let mut world = world_with(open_map(5, 5), vec![stone], player_at(0, 0));
        let mut bus = EventBus::new();

        click(&mut world, &mut bus, 12, 2);
        assert_eq!(bus.count_of(EventKind::BeginPuzzle), 1);
        bus.clear(true);

        bus.post(EventPayload::PuzzleFinished {
            stone_id: Some(EntityId::new("stone_1")),
            solved: true,
        });
        world.update(DT, &mut bus);

        let state = match world.entity(&EntityId::new("stone_1")).map(Entity::kind) {
            Some(EntityKind::Stone(stone)) => Some(stone.state()),
            _ => None,
        };
        assert_eq!(state, Some(StoneState::Solved));
        assert_eq!(world.player().map(Player::intelligence), Some(1));
        assert_eq!(bus.count_of(EventKind::PuzzleSolved), 1);
    }

    #[test]
    fn zombie_contact_damages_player_on_following_pass() {
        let tuning = ZombieTuning {
            move_interval: Duration::from_secs(600),
            ..ZombieTuning::default()
        };
        let zombie = Entity::new("zombie_1", Pos::new(5, 0, 1), EntityKind::Zombie(Zombie::new(tuning)));
        let mut world = world_with(open_map(5, 5), vec![zombie], player_at(0, 0));
        let mut bus = EventBus::new();

        world.update(DT, &mut bus);
        assert_eq!(bus.count_of(EventKind::EntityDamaged), 1);
        world.update(DT, &mut bus);
        bus.clear(false);

        let hp = world
            .player_entity()
            .and_then(Entity::as_living)
            .map(|living| living.hp());
        assert_eq!(hp, Some(100 - tuning.contact_damage));
        assert!(bus.is_empty());
    }

    #[test]
    fn wandering_zombie_moves_on_open_ground() {
        let tuning = ZombieTuning {
            move_interval: Duration::ZERO,
            chase_radius: 0,
            ..ZombieTuning::default()
        };
        let zombie = Entity::new("zombie_1", Pos::new(20, 20, 1), EntityKind::Zombie(Zombie::new(tuning)));
        let mut world = world_with(open_map(6, 6), vec![zombie], player_at(0, 0));
        let mut bus = EventBus::new();

        world.update(DT, &mut bus);

        let moved = world.entity(&EntityId::new("zombie_1")).map(|e| e.pos);
        assert_ne!(moved, Some(Pos::new(20, 20, 1)));
    }

    #[test]
    fn find_near_uses_chebyshev_radius() {
        let a = Entity::new("fruit_a", Pos::new(10, 10, 1), EntityKind::Fruit(Fruit::new("apple")));
        let b = Entity::new("fruit_b", Pos::new(11, 0, 1), EntityKind::Fruit(Fruit::new("apple")));
        let world = world_with(open_map(3, 3), vec![a, b], player_at(0, 0));

        let near: Vec<&str> = world
            .find_near(Pos::new(0, 0, 0), 10)
            .iter()
            .map(|entity| entity.id().as_str())
            .collect();
        assert_eq!(near, vec!["player", "fruit_a"]);
    }
}
