use super::primitives::Pos;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.1;

/// World-space rectangle, half-open on the max edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// Top-left anchored viewport over the world.
///
/// After any call that moves or rezooms the camera, `x` stays within
/// `[0, max(0, world_max_x - screen_w / zoom)]` and likewise for `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    x: f32,
    y: f32,
    screen_w: u32,
    screen_h: u32,
    world_max_x: i32,
    world_max_y: i32,
    zoom: f32,
}

impl Camera {
    pub fn new(screen_w: u32, screen_h: u32, world_max_x: i32, world_max_y: i32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            screen_w,
            screen_h,
            world_max_x,
            world_max_y,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_w, self.screen_h)
    }

    pub fn view_width(&self) -> f32 {
        self.screen_w as f32 / self.zoom
    }

    pub fn view_height(&self) -> f32 {
        self.screen_h as f32 / self.zoom
    }

    pub fn visible_world_rect(&self) -> WorldRect {
        WorldRect {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.view_width(),
            max_y: self.y + self.view_height(),
        }
    }

    pub fn world_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.x) * self.zoom, (y - self.y) * self.zoom)
    }

    pub fn screen_to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        (sx / self.zoom + self.x, sy / self.zoom + self.y)
    }

    pub fn center_on(&mut self, x: f32, y: f32) {
        self.x = x - self.view_width() / 2.0;
        self.y = y - self.view_height() / 2.0;
        self.clamp();
    }

    pub fn center_on_pos(&mut self, pos: Pos) {
        self.center_on(pos.x as f32, pos.y as f32);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        let max_x = (self.world_max_x as f32 - self.view_width()).max(0.0);
        let max_y = (self.world_max_y as f32 - self.view_height()).max(0.0);
        self.x = clamp_axis(self.x, max_x);
        self.y = clamp_axis(self.y, max_y);
    }

    pub fn set_screen_size(&mut self, screen_w: u32, screen_h: u32) {
        self.screen_w = screen_w;
        self.screen_h = screen_h;
        self.clamp();
    }

    pub fn set_world_bounds(&mut self, world_max_x: i32, world_max_y: i32) {
        self.world_max_x = world_max_x;
        self.world_max_y = world_max_y;
        self.clamp();
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
        self.clamp();
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target_zoom = self.zoom + steps as f32 * CAMERA_ZOOM_STEP;
        self.set_zoom_clamped(target_zoom);
    }
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}
