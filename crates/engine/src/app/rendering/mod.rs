mod draw_cmd;
mod font;
mod pixels_view;
mod render_system;
mod view;

pub use draw_cmd::{DrawCmd, DrawKind, COLLISION_LAYER, UI_LAYER};
pub use pixels_view::PixelsView;
pub use render_system::RenderSystem;
pub use view::{RecordingView, ViewSink};
