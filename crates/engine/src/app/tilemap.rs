use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub gid: u32,
    pub z: i32,
    pub passable: bool,
}

impl Tile {
    pub const fn new(gid: u32, z: i32, passable: bool) -> Self {
        Self { gid, z, passable }
    }
}

/// Axis-aligned obstacle in world pixels, independent of the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub passable: bool,
}

impl CollisionBox {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Half-open overlap test against `[min, max)` world rect.
    pub fn intersects(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> bool {
        (self.x as f32) < max_x
            && ((self.x + self.width) as f32) > min_x
            && (self.y as f32) < max_y
            && ((self.y + self.height) as f32) > min_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Altar,
    PuzzleTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileMapError {
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be non-zero")]
    ZeroTileSize,
}

/// Tile grid addressed by tile coordinates, with world pixels at
/// `tile * tile_size`. Each cell stacks zero or more z-layered tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_size: u32,
    cells: Vec<Vec<Tile>>,
    collision_boxes: Vec<CollisionBox>,
    regions: BTreeMap<(u32, u32), RegionKind>,
}

impl TileMap {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: u32,
        cells: Vec<Vec<Tile>>,
    ) -> Result<Self, TileMapError> {
        if tile_size == 0 {
            return Err(TileMapError::ZeroTileSize);
        }
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(TileMapError::CellCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            cells,
            collision_boxes: Vec::new(),
            regions: BTreeMap::new(),
        })
    }

    pub fn filled(width: u32, height: u32, tile_size: u32, tile: Tile) -> Result<Self, TileMapError> {
        let count = width as usize * height as usize;
        Self::new(width, height, tile_size, vec![vec![tile]; count])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn pixel_width(&self) -> i32 {
        (self.width as i64 * self.tile_size as i64).min(i32::MAX as i64) as i32
    }

    pub fn pixel_height(&self) -> i32 {
        (self.height as i64 * self.tile_size as i64).min(i32::MAX as i64) as i32
    }

    pub fn index_of(&self, tx: u32, ty: u32) -> Option<usize> {
        if tx >= self.width || ty >= self.height {
            return None;
        }
        Some(ty as usize * self.width as usize + tx as usize)
    }

    pub fn tiles_at(&self, tx: u32, ty: u32) -> Option<&[Tile]> {
        self.index_of(tx, ty)
            .and_then(|index| self.cells.get(index))
            .map(Vec::as_slice)
    }

    /// Replaces the stack at a cell. Returns false when out of bounds.
    pub fn set_tiles(&mut self, tx: u32, ty: u32, tiles: Vec<Tile>) -> bool {
        match self.index_of(tx, ty) {
            Some(index) => {
                self.cells[index] = tiles;
                true
            }
            None => false,
        }
    }

    pub fn push_tile(&mut self, tx: u32, ty: u32, tile: Tile) -> bool {
        match self.index_of(tx, ty) {
            Some(index) => {
                self.cells[index].push(tile);
                true
            }
            None => false,
        }
    }

    pub fn add_collision_box(&mut self, collision_box: CollisionBox) {
        self.collision_boxes.push(collision_box);
    }

    pub fn collision_boxes(&self) -> &[CollisionBox] {
        &self.collision_boxes
    }

    pub fn set_region(&mut self, tx: u32, ty: u32, kind: RegionKind) -> bool {
        if self.index_of(tx, ty).is_none() {
            return false;
        }
        self.regions.insert((tx, ty), kind);
        true
    }

    pub fn region_at_tile(&self, tx: u32, ty: u32) -> Option<RegionKind> {
        self.regions.get(&(tx, ty)).copied()
    }

    pub fn region_at_pixel(&self, x: i32, y: i32) -> Option<RegionKind> {
        let (tx, ty) = self.tile_coord_of(x, y)?;
        self.region_at_tile(tx, ty)
    }

    /// Tile containing a world pixel, or `None` outside the map.
    pub fn tile_coord_of(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        if x < 0 || y < 0 {
            return None;
        }
        let tx = x as u32 / self.tile_size;
        let ty = y as u32 / self.tile_size;
        self.index_of(tx, ty).map(|_| (tx, ty))
    }

    /// Terrain-only passability: every stacked tile and every collision box
    /// covering the pixel must be passable. Outside the map is a wall.
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        let Some((tx, ty)) = self.tile_coord_of(x, y) else {
            return false;
        };
        let tiles_ok = self
            .tiles_at(tx, ty)
            .map(|tiles| tiles.iter().all(|tile| tile.passable))
            .unwrap_or(false);
        tiles_ok
            && self
                .collision_boxes
                .iter()
                .filter(|collision_box| collision_box.contains(x, y))
                .all(|collision_box| collision_box.passable)
    }
}
