use tracing::{debug, info};

use super::entities::{Entity, EntityId, EntityKind, Fruit};
use super::events::{EventBus, EventPayload, InputType};
use super::primitives::Pos;
use super::settings::GameContext;
use super::tilemap::RegionKind;
use super::world::World;

/// How far from the player, in tiles on each axis, an item may be placed.
const PLACE_REACH_TILES: i32 = 2;
const PLACED_Z: i32 = 1;

/// Why a placement click did nothing. Logged, never surfaced to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceRejection {
    NothingToPlace,
    OutsideMap,
    NotAnAltar,
    OutOfReach,
    Occupied,
}

/// Place mode: while on, clicks drop a held fruit onto an altar tile.
#[derive(Debug, Default)]
pub struct PlaceSystem {
    placed: u32,
}

impl PlaceSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bus: &mut EventBus, ctx: &mut GameContext, world: &mut World) {
        for event in bus.get_events() {
            if event.is_consumed() {
                continue;
            }
            match event.payload() {
                EventPayload::PlaceModeToggle => {
                    ctx.place_mode = !ctx.place_mode;
                    info!(enabled = ctx.place_mode, "place_mode_toggled");
                    event.consume();
                }
                EventPayload::Input(input)
                    if ctx.place_mode && input.input_type == InputType::Click =>
                {
                    if let Some((x, y)) = input.position {
                        if let Err(reason) = self.try_place(world, x, y) {
                            debug!(x, y, reason = ?reason, "place_rejected");
                        }
                    }
                    event.consume();
                }
                _ => {}
            }
        }
    }

    /// Snaps the click to its tile and spawns one held fruit there.
    pub fn try_place(&mut self, world: &mut World, x: i32, y: i32) -> Result<Pos, PlaceRejection> {
        let item_id = world
            .inventory()
            .iter()
            .map(|(item_id, _)| item_id.to_string())
            .next()
            .ok_or(PlaceRejection::NothingToPlace)?;
        let (tx, ty) = world
            .tile_map()
            .tile_coord_of(x, y)
            .ok_or(PlaceRejection::OutsideMap)?;
        if world.tile_map().region_at_tile(tx, ty) != Some(RegionKind::Altar) {
            return Err(PlaceRejection::NotAnAltar);
        }

        let tile_size = world.tile_size();
        let target = Pos::new(tx as i32 * tile_size, ty as i32 * tile_size, PLACED_Z);
        let player_pos = world
            .player_entity()
            .map(|entity| entity.pos)
            .ok_or(PlaceRejection::OutOfReach)?;
        let reach = PLACE_REACH_TILES * tile_size;
        if (target.x - player_pos.x).abs() > reach || (target.y - player_pos.y).abs() > reach {
            return Err(PlaceRejection::OutOfReach);
        }
        let occupied = world.entities().iter().any(|entity| {
            world.tile_map().tile_coord_of(entity.pos.x, entity.pos.y) == Some((tx, ty))
        });
        if occupied {
            return Err(PlaceRejection::Occupied);
        }

        self.placed = self.placed.saturating_add(1);
        let entity = Entity::new(
            EntityId::new(format!("fruit_placed_{}", self.placed)),
            target,
            EntityKind::Fruit(Fruit::new(&item_id)),
        );
        if !world.add_entity(entity) {
            return Err(PlaceRejection::Occupied);
        }
        world.inventory_mut().remove(&item_id, 1);
        info!(item_id = item_id.as_str(), tx, ty, "item_placed");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::app::audio::RecordingAudio;
    use crate::app::entities::Player;
    use crate::app::events::InputPayload;
    use crate::app::sprites::SpriteLibrary;
    use crate::app::tilemap::{Tile, TileMap};
    use crate::app::world::WorldBlueprint;

    fn world() -> World {
        let mut map = TileMap::filled(8, 8, 10, Tile::new(1, 0, true)).expect("tilemap");
        map.set_region(2, 1, RegionKind::Altar);
        map.set_region(6, 6, RegionKind::Altar);
        let player = Entity::new("player", Pos::new(10, 10, 2), EntityKind::Player(Player::new(100, 10)));
        let blueprint =
            WorldBlueprint::new(map, vec![player], EntityId::new("player")).expect("blueprint");
        World::new(Rc::new(blueprint), Rc::new(SpriteLibrary::new()), 1)
    }

    fn context() -> GameContext {
        GameContext::new(Box::new(RecordingAudio::new()))
    }

    #[test]
    fn toggle_is_consumed_and_flips_place_mode() {
        let mut world = world();
        let mut ctx = context();
        let mut bus = EventBus::new();
        bus.post(EventPayload::PlaceModeToggle);

        PlaceSystem::new().update(&mut bus, &mut ctx, &mut world);
        bus.clear(false);

        assert!(ctx.place_mode);
        assert!(bus.is_empty());
    }

    #[test]
    fn click_on_altar_spawns_fruit_snapped_to_tile() {
        let mut world = world();
        world.inventory_mut().add("apple", 2);
        let mut ctx = context();
        ctx.place_mode = true;
        let mut bus = EventBus::new();
        bus.post(EventPayload::Input(InputPayload::click(27, 13)));

        PlaceSystem::new().update(&mut bus, &mut ctx, &mut world);

        let placed = world.entity(&EntityId::new("fruit_placed_1")).expect("placed");
        assert_eq!(placed.pos, Pos::new(20, 10, 1));
        assert_eq!(world.inventory().count("apple"), 1);
        assert!(bus.get_events()[0].is_consumed());
    }

    #[test]
    fn placement_rules_reject_bad_targets() {
        let mut world = world();
        let mut place = PlaceSystem::new();

        assert_eq!(place.try_place(&mut world, 25, 15), Err(PlaceRejection::NothingToPlace));
        world.inventory_mut().add("apple", 3);
        assert_eq!(place.try_place(&mut world, 35, 15), Err(PlaceRejection::NotAnAltar));
        assert_eq!(place.try_place(&mut world, 65, 65), Err(PlaceRejection::OutOfReach));
        assert_eq!(place.try_place(&mut world, -5, 15), Err(PlaceRejection::OutsideMap));
        assert!(place.try_place(&mut world, 25, 15).is_ok());
        assert_eq!(place.try_place(&mut world, 21, 11), Err(PlaceRejection::Occupied));
        assert_eq!(world.inventory().count("apple"), 2);
    }

    #[test]
    fn clicks_pass_through_when_place_mode_is_off() {
        let mut world = world();
        world.inventory_mut().add("apple", 1);
        let mut ctx = context();
        let mut bus = EventBus::new();
        bus.post(EventPayload::Input(InputPayload::click(25, 15)));

        PlaceSystem::new().update(&mut bus, &mut ctx, &mut world);

        assert!(!bus.get_events()[0].is_consumed());
        assert_eq!(world.inventory().count("apple"), 1);
    }
}
