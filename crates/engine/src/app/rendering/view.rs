use super::draw_cmd::DrawCmd;

/// Receives the finished draw queue once per rendered frame.
pub trait ViewSink {
    fn flush_to_view(&mut self, commands: &[DrawCmd]);
}

/// Keeps every flushed frame. Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingView {
    frames: Vec<Vec<DrawCmd>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Vec<DrawCmd>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[DrawCmd]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl ViewSink for RecordingView {
    fn flush_to_view(&mut self, commands: &[DrawCmd]) {
        self.frames.push(commands.to_vec());
    }
}
