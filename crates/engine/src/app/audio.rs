use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

pub const SFX_BUTTON_CLICK: &str = "btn-click";
pub const BGM_NORMAL: &str = "normal";

/// Fire-and-forget sound output. Implementations must not block the frame.
pub trait AudioSink {
    fn play_sfx(&mut self, name: &str);
    fn play_bgm(&mut self, name: &str);
}

/// Default sink for hosts without an audio device: cues become debug logs.
#[derive(Debug, Default)]
pub struct LoggingAudio;

impl AudioSink for LoggingAudio {
    fn play_sfx(&mut self, name: &str) {
        debug!(sfx = name, "audio_sfx");
    }

    fn play_bgm(&mut self, name: &str) {
        debug!(bgm = name, "audio_bgm");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCue {
    Sfx(String),
    Bgm(String),
}

/// Records cues into a shared log so callers keep a handle after boxing.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    cues: Rc<RefCell<Vec<AudioCue>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues.borrow().clone()
    }
}

impl AudioSink for RecordingAudio {
    fn play_sfx(&mut self, name: &str) {
        self.cues.borrow_mut().push(AudioCue::Sfx(name.to_string()));
    }

    fn play_bgm(&mut self, name: &str) {
        self.cues.borrow_mut().push(AudioCue::Bgm(name.to_string()));
    }
}
