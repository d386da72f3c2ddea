use std::time::Duration;

use grove_engine::app::{
    Entity, EntityId, EntityKind, Fruit, Npc, Player, Pos, RegionKind, SpriteKeyError,
    SpriteLibrary, SpriteMeta, SpriteRegistry, Stone, Tile, TileMap, TileMapError, Tree, Zombie,
    ZombieTuning,
};
use grove_engine::app::{BlueprintError, WorldBlueprint};
use thiserror::Error;

use super::config::GameConfig;

const GID_GRASS: u32 = 1;
const GID_WALL: u32 = 2;
const GID_ALTAR: u32 = 3;
const GID_PUZZLE_FLOOR: u32 = 4;

const GRASS: Tile = Tile::new(GID_GRASS, 0, true);
const WALL: Tile = Tile::new(GID_WALL, 1, false);
const ALTAR: Tile = Tile::new(GID_ALTAR, 0, true);
const PUZZLE_FLOOR: Tile = Tile::new(GID_PUZZLE_FLOOR, 0, true);

const VERTICAL_WALL_X: u32 = 5;
const VERTICAL_WALL_Y: (u32, u32) = (3, 8);
const HORIZONTAL_WALL_Y: u32 = 7;
const HORIZONTAL_WALL_X: (u32, u32) = (8, 12);

const ALTAR_TILES: [(u32, u32); 4] = [(14, 3), (15, 3), (14, 4), (15, 4)];
const PUZZLE_TRIGGER_TILE: (u32, u32) = (18, 10);

const PLAYER_ID: &str = "player";
const PLAYER_SPAWN: (u32, u32) = (2, 2);

const WALK_FRAMES: u32 = 4;
const WALK_FRAME_TIME: Duration = Duration::from_millis(120);

#[derive(Debug, Error)]
pub(crate) enum WorldGenError {
    #[error(transparent)]
    TileMap(#[from] TileMapError),
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
    #[error(transparent)]
    SpriteKey(#[from] SpriteKeyError),
}

/// Bordered meadow with two interior walls, an altar and a puzzle trigger.
pub(crate) fn build_blueprint(config: &GameConfig) -> Result<WorldBlueprint, WorldGenError> {
    let tile_map = build_tile_map(config)?;
    let ts = config.tile_size as i32;
    let at = |tx: u32, ty: u32, z: i32| Pos::new(tx as i32 * ts, ty as i32 * ts, z);

    let zombie_tuning = ZombieTuning {
        max_hp: config.zombie_max_hp,
        step_size: config.zombie_step,
        move_interval: Duration::from_millis(config.zombie_move_interval_ms),
        chase_radius: config.zombie_chase_radius,
        contact_range: ts,
        contact_damage: config.zombie_contact_damage,
        attack_cooldown: Duration::from_millis(config.zombie_attack_cooldown_ms),
    };

    let mut entities = vec![Entity::new(
        PLAYER_ID,
        at(PLAYER_SPAWN.0, PLAYER_SPAWN.1, 2),
        EntityKind::Player(Player::new(config.player_max_hp, config.player_step)),
    )];
    entities.push(Entity::new(
        "fruit_1",
        at(12, 2, 1),
        EntityKind::Fruit(Fruit::new("apple")),
    ));
    entities.push(Entity::new(
        "fruit_2",
        at(3, 10, 1),
        EntityKind::Fruit(Fruit::new("pear")),
    ));
    for (idx, (tx, ty)) in [(3, 4), (4, 5), (2, 8)].into_iter().enumerate() {
        entities.push(Entity::new(
            format!("tree_{idx}").as_str(),
            at(tx, ty, 1),
            EntityKind::Tree(Tree::new("apple", 3)),
        ));
    }
    entities.push(Entity::new(
        "npc_elder",
        at(9, 4, 1),
        EntityKind::Npc(Npc::new("Elder", "Welcome to the grove. Mind the woods.")),
    ));
    entities.push(Entity::new(
        "stone_1",
        at(10, 12, 1),
        EntityKind::Stone(Stone::new()),
    ));
    entities.push(Entity::new(
        "zombie_1",
        at(20, 13, 1),
        EntityKind::Zombie(Zombie::new(zombie_tuning)),
    ));

    Ok(WorldBlueprint::new(
        tile_map,
        entities,
        EntityId::new(PLAYER_ID),
    )?)
}

fn build_tile_map(config: &GameConfig) -> Result<TileMap, TileMapError> {
    let (width, height) = (config.map_width, config.map_height);
    let mut tile_map = TileMap::filled(width, height, config.tile_size, GRASS)?;

    for y in 0..height {
        for x in 0..width {
            let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            let vertical = x == VERTICAL_WALL_X
                && (VERTICAL_WALL_Y.0..=VERTICAL_WALL_Y.1).contains(&y);
            let horizontal = y == HORIZONTAL_WALL_Y
                && (HORIZONTAL_WALL_X.0..=HORIZONTAL_WALL_X.1).contains(&x);
            if border || vertical || horizontal {
                tile_map.set_tiles(x, y, vec![WALL]);
            }
        }
    }

    for (tx, ty) in ALTAR_TILES {
        tile_map.set_tiles(tx, ty, vec![ALTAR]);
        tile_map.set_region(tx, ty, RegionKind::Altar);
    }
    let (tx, ty) = PUZZLE_TRIGGER_TILE;
    tile_map.set_tiles(tx, ty, vec![PUZZLE_FLOOR]);
    tile_map.set_region(tx, ty, RegionKind::PuzzleTrigger);

    Ok(tile_map)
}

/// Sprite keys resolve to `<assets>/sprites/<key>.png`; missing images draw
/// as flat placeholders.
pub(crate) fn build_sprite_library(tile_size: u32) -> Result<SpriteLibrary, SpriteKeyError> {
    let still = |key: &str| SpriteMeta::still(key, tile_size, tile_size);
    let walk = |key: &str| {
        SpriteMeta::animated(key, tile_size, tile_size, WALK_FRAMES, WALK_FRAME_TIME)
    };

    let mut library = SpriteLibrary::new();
    for (gid, key) in [
        (GID_GRASS, "tiles/grass"),
        (GID_WALL, "tiles/wall"),
        (GID_ALTAR, "tiles/altar"),
        (GID_PUZZLE_FLOOR, "tiles/puzzle_floor"),
    ] {
        library.insert_tile(gid, still(key)?);
    }

    let mut player = SpriteRegistry::new()
        .with("interacting", still("player/interacting")?)
        .with("dead", still("player/dead")?);
    let mut zombie = SpriteRegistry::new().with("dead", still("zombie/dead")?);
    for direction in ["up", "down", "left", "right"] {
        player.insert(
            &format!("idle_{direction}"),
            still(&format!("player/idle_{direction}"))?,
        );
        player.insert(
            &format!("walking_{direction}"),
            walk(&format!("player/walking_{direction}"))?,
        );
        zombie.insert(
            &format!("walking_{direction}"),
            walk(&format!("zombie/walking_{direction}"))?,
        );
    }
    library.insert_set("player", player);
    library.insert_set("zombie", zombie);

    library.insert_set(
        "fruit",
        SpriteRegistry::new()
            .with("fresh", still("fruit/fresh")?)
            .with("picked", still("fruit/picked")?),
    );
    library.insert_set(
        "tree",
        SpriteRegistry::new()
            .with("idle", still("tree/idle")?)
            .with("bare", still("tree/bare")?),
    );
    library.insert_set(
        "stone",
        SpriteRegistry::new()
            .with("idle", still("stone/idle")?)
            .with("puzzle_active", still("stone/puzzle_active")?)
            .with("solved", still("stone/solved")?),
    );
    library.insert_set("npc", SpriteRegistry::new().with("idle", still("npc/idle")?));

    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::{MIN_MAP_HEIGHT, MIN_MAP_WIDTH};

    fn blueprint() -> WorldBlueprint {
        build_blueprint(&GameConfig::default()).expect("blueprint")
    }

    #[test]
    fn default_world_has_player_at_spawn() {
        let blueprint = blueprint();
        let player = blueprint
            .entities()
            .iter()
            .find(|entity| entity.id() == blueprint.player_id())
            .expect("player");
        assert_eq!(player.pos, Pos::new(32, 32, 2));
    }

    #[test]
    fn walls_surround_the_map() {
        let blueprint = blueprint();
        let map = blueprint.tile_map();
        assert!(!map.is_passable(0, 0));
        assert!(!map.is_passable(map.pixel_width() - 1, 40));
        assert!(!map.is_passable(5 * 16 + 1, 4 * 16));
        assert!(map.is_passable(2 * 16, 2 * 16));
    }

    #[test]
    fn regions_are_marked() {
        let blueprint = blueprint();
        let map = blueprint.tile_map();
        assert_eq!(map.region_at_tile(14, 3), Some(RegionKind::Altar));
        assert_eq!(map.region_at_tile(18, 10), Some(RegionKind::PuzzleTrigger));
        assert_eq!(map.region_at_tile(2, 2), None);
    }

    #[test]
    fn entities_stand_on_open_ground() {
        let blueprint = blueprint();
        for entity in blueprint.entities() {
            assert!(
                blueprint.tile_map().is_passable(entity.pos.x, entity.pos.y),
                "{} spawns inside a wall",
                entity.id()
            );
        }
    }

    #[test]
    fn every_entity_state_has_a_sprite() {
        let library = build_sprite_library(16).expect("sprites");
        for entity in blueprint().entities() {
            let state = entity.sprite_state();
            assert!(
                library.sprite(entity.sprite_set(), &state).is_some(),
                "missing sprite {}/{state}",
                entity.sprite_set()
            );
        }
        for gid in [GID_GRASS, GID_WALL, GID_ALTAR, GID_PUZZLE_FLOOR] {
            assert!(library.tile(gid).is_some());
        }
    }

    #[test]
    fn smallest_allowed_map_still_builds() {
        let config = GameConfig {
            map_width: MIN_MAP_WIDTH,
            map_height: MIN_MAP_HEIGHT,
            ..GameConfig::default()
        };
        let blueprint = build_blueprint(&config).expect("blueprint");
        for entity in blueprint.entities() {
            assert!(blueprint.tile_map().is_passable(entity.pos.x, entity.pos.y));
        }
    }
}
