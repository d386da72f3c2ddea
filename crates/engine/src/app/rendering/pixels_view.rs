use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::puzzle::PuzzleView;
use crate::app::sprites::SpriteKey;

use super::draw_cmd::{DrawCmd, DrawKind};
use super::font::{glyph_rows, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::view::ViewSink;

const CLEAR_COLOR: [u8; 4] = [18, 20, 26, 255];
const TILE_FALLBACK_PASSABLE_COLOR: [u8; 4] = [74, 112, 56, 255];
const TILE_FALLBACK_BLOCKED_COLOR: [u8; 4] = [92, 88, 84, 255];
const SPRITE_PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const COLLISION_BLOCKED_COLOR: [u8; 4] = [235, 80, 80, 255];
const COLLISION_PASSABLE_COLOR: [u8; 4] = [80, 220, 120, 255];
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 255];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_SELECTED_COLOR: [u8; 4] = [255, 210, 70, 255];
const PUZZLE_CELL_COLOR: [u8; 4] = [60, 70, 90, 255];

const TEXT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
const PANEL_PADDING: i32 = 4 * TEXT_SCALE;

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl PixelRect {
    fn from_cmd(cmd: &DrawCmd) -> Self {
        Self {
            x: cmd.position.0.round() as i32,
            y: cmd.position.1.round() as i32,
            width: cmd.size.0.round().max(1.0) as i32,
            height: cmd.size.1.round().max(1.0) as i32,
        }
    }
}

/// Draws command queues into a `pixels` framebuffer sized to the window.
/// Sprite images load lazily from `<asset_root>/sprites/<key>.png`.
pub struct PixelsView {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    size: (u32, u32),
    asset_root: PathBuf,
    sprite_cache: HashMap<SpriteKey, Option<LoadedSprite>>,
    warned_sprite_keys: HashSet<SpriteKey>,
}

impl PixelsView {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            size: (size.width, size.height),
            asset_root,
            sprite_cache: HashMap::new(),
            warned_sprite_keys: HashSet::new(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.size = (width, height);
        Ok(())
    }

    pub fn present(&mut self) -> Result<(), Error> {
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }
}

impl ViewSink for PixelsView {
    fn flush_to_view(&mut self, commands: &[DrawCmd]) {
        let (width, height) = self.size;
        let frame = self.pixels.frame_mut();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }
        let mut canvas = Canvas {
            frame,
            width,
            height,
        };
        for cmd in commands {
            let rect = PixelRect::from_cmd(cmd);
            match &cmd.kind {
                DrawKind::Tile {
                    sprite, passable, ..
                } => {
                    let loaded = sprite.as_ref().and_then(|key| {
                        cached_sprite(
                            &mut self.sprite_cache,
                            &mut self.warned_sprite_keys,
                            &self.asset_root,
                            key,
                        )
                    });
                    match loaded {
                        Some(image) => canvas.sprite_frame(rect, image, 0, 1),
                        None if *passable => canvas.fill(rect, TILE_FALLBACK_PASSABLE_COLOR),
                        None => canvas.fill(rect, TILE_FALLBACK_BLOCKED_COLOR),
                    }
                }
                DrawKind::Sprite {
                    sprite,
                    frame_idx,
                    frame_count,
                    ..
                } => {
                    match cached_sprite(
                        &mut self.sprite_cache,
                        &mut self.warned_sprite_keys,
                        &self.asset_root,
                        sprite,
                    ) {
                        Some(image) => canvas.sprite_frame(rect, image, *frame_idx, *frame_count),
                        None => canvas.fill(rect, SPRITE_PLACEHOLDER_COLOR),
                    }
                }
                DrawKind::Collision { passable } => {
                    let color = if *passable {
                        COLLISION_PASSABLE_COLOR
                    } else {
                        COLLISION_BLOCKED_COLOR
                    };
                    canvas.outline(rect, color);
                }
                DrawKind::Text { lines } => {
                    canvas.panel(rect);
                    canvas.lines(rect, lines.iter().map(String::as_str), None);
                }
                DrawKind::Dialog {
                    text,
                    options,
                    selected_index,
                } => {
                    canvas.panel(rect);
                    let mut rows = vec![text.clone(), String::new()];
                    rows.extend(options.iter().enumerate().map(|(index, option)| {
                        let marker = if index == *selected_index { ">" } else { " " };
                        format!("{marker} {option}")
                    }));
                    canvas.lines(rect, rows.iter().map(String::as_str), Some(*selected_index + 2));
                }
                DrawKind::StatusBar(view) => {
                    canvas.panel(rect);
                    let rows = view.lines();
                    canvas.lines(rect, rows.iter().map(String::as_str), None);
                }
                DrawKind::InventoryOverlay { rows } => {
                    canvas.panel(rect);
                    let mut text = vec!["INVENTORY".to_string()];
                    if rows.is_empty() {
                        text.push("EMPTY".to_string());
                    }
                    text.extend(rows.iter().map(|(item, count)| format!("{item} X{count}")));
                    canvas.lines(rect, text.iter().map(String::as_str), None);
                }
                DrawKind::Puzzle(view) => {
                    canvas.panel(rect);
                    canvas.puzzle(rect, view);
                }
            }
        }
    }
}

fn cached_sprite<'a>(
    cache: &'a mut HashMap<SpriteKey, Option<LoadedSprite>>,
    warned: &mut HashSet<SpriteKey>,
    asset_root: &Path,
    key: &SpriteKey,
) -> Option<&'a LoadedSprite> {
    cache
        .entry(key.clone())
        .or_insert_with(|| {
            let path = asset_root
                .join("sprites")
                .join(format!("{}.png", key.as_str()));
            match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    if warned.insert(key.clone()) {
                        warn!(
                            sprite_key = key.as_str(),
                            path = %path.display(),
                            reason = reason.as_str(),
                            "sprite_load_failed_using_placeholder"
                        );
                    }
                    None
                }
            }
        })
        .as_ref()
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Clipped drawing onto an RGBA frame.
struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl Canvas<'_> {
    fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(pixel) = self.frame.get_mut(offset..offset + 4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn fill(&mut self, rect: PixelRect, color: [u8; 4]) {
        let x_end = (rect.x + rect.width).min(self.width as i32);
        let y_end = (rect.y + rect.height).min(self.height as i32);
        for y in rect.y.max(0)..y_end {
            for x in rect.x.max(0)..x_end {
                self.put(x, y, color);
            }
        }
    }

    fn outline(&mut self, rect: PixelRect, color: [u8; 4]) {
        let right = rect.x + rect.width - 1;
        let bottom = rect.y + rect.height - 1;
        for x in rect.x..=right {
            self.put(x, rect.y, color);
            self.put(x, bottom, color);
        }
        for y in rect.y..=bottom {
            self.put(rect.x, y, color);
            self.put(right, y, color);
        }
    }

    fn panel(&mut self, rect: PixelRect) {
        self.fill(rect, PANEL_BG_COLOR);
        self.outline(rect, PANEL_BORDER_COLOR);
    }

    /// Nearest-neighbour blit of frame `frame_idx` from a horizontal strip.
    /// Fully transparent source pixels are skipped.
    fn sprite_frame(&mut self, rect: PixelRect, sprite: &LoadedSprite, frame_idx: u32, frame_count: u32) {
        let frame_count = frame_count.max(1);
        let frame_width = sprite.width / frame_count;
        let expected_len = sprite.width as usize * sprite.height as usize * 4;
        if frame_width == 0 || sprite.height == 0 || sprite.rgba.len() < expected_len {
            return;
        }
        let src_x0 = (frame_idx % frame_count) * frame_width;
        for dy in 0..rect.height {
            let src_y = ((dy as u32 * sprite.height) / rect.height as u32).min(sprite.height - 1);
            for dx in 0..rect.width {
                let src_x = src_x0 + ((dx as u32 * frame_width) / rect.width as u32).min(frame_width - 1);
                let offset = (src_y as usize * sprite.width as usize + src_x as usize) * 4;
                let pixel = &sprite.rgba[offset..offset + 4];
                if pixel[3] == 0 {
                    continue;
                }
                self.put(rect.x + dx, rect.y + dy, [pixel[0], pixel[1], pixel[2], pixel[3]]);
            }
        }
    }

    fn text(&mut self, mut x: i32, y: i32, text: &str, color: [u8; 4]) {
        for ch in text.chars() {
            let rows = glyph_rows(ch);
            for (row_index, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    self.fill(
                        PixelRect {
                            x: x + col * TEXT_SCALE,
                            y: y + row_index as i32 * TEXT_SCALE,
                            width: TEXT_SCALE,
                            height: TEXT_SCALE,
                        },
                        color,
                    );
                }
            }
            x += GLYPH_ADVANCE;
        }
    }

    fn lines<'l>(&mut self, rect: PixelRect, lines: impl Iterator<Item = &'l str>, highlight: Option<usize>) {
        let mut y = rect.y + PANEL_PADDING;
        for (index, line) in lines.enumerate() {
            if y + LINE_ADVANCE > rect.y + rect.height {
                break;
            }
            let color = if highlight == Some(index) {
                TEXT_SELECTED_COLOR
            } else {
                TEXT_COLOR
            };
            self.text(rect.x + PANEL_PADDING, y, line, color);
            y += LINE_ADVANCE;
        }
    }

    fn puzzle(&mut self, rect: PixelRect, view: &PuzzleView) {
        let size = view.size.max(1) as i32;
        let inner = (rect.width.min(rect.height) - 2 * PANEL_PADDING).max(size);
        let cell = inner / size;
        for (index, value) in view.cells.iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            let cx = rect.x + PANEL_PADDING + (index as i32 % size) * cell;
            let cy = rect.y + PANEL_PADDING + (index as i32 / size) * cell;
            let tile = PixelRect {
                x: cx + 1,
                y: cy + 1,
                width: cell - 2,
                height: cell - 2,
            };
            self.fill(tile, PUZZLE_CELL_COLOR);
            self.outline(tile, PANEL_BORDER_COLOR);
            let label = value.to_string();
            let label_width = label.len() as i32 * GLYPH_ADVANCE;
            self.text(
                cx + (cell - label_width) / 2,
                cy + (cell - GLYPH_HEIGHT * TEXT_SCALE) / 2,
                &label,
                TEXT_COLOR,
            );
        }
    }
}
