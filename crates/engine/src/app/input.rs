use std::mem;

/// Raw host input, recorded between ticks. Keys use DOM-style names such as
/// `ArrowUp`, `Escape`, `Enter`, or the typed character.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    /// Screen-space pixel coordinates.
    Click { x: f32, y: f32 },
}

#[derive(Debug, Default)]
pub struct InputSystem {
    pending: Vec<InputEvent>,
}

impl InputSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    pub fn key_down(&mut self, key: impl Into<String>) {
        self.push(InputEvent::KeyDown(key.into()));
    }

    pub fn click(&mut self, x: f32, y: f32) {
        self.push(InputEvent::Click { x, y });
    }

    /// Drains everything recorded since the last call, oldest first.
    pub fn consume_events(&mut self) -> Vec<InputEvent> {
        mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
