use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key must not contain '\\\\'")]
    Backslash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Relative asset path of a sprite image, without extension
/// (`player/walking_up` resolves to `<assets>/sprites/player/walking_up.png`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteKey(String);

impl SpriteKey {
    pub fn parse(raw: &str) -> Result<Self, SpriteKeyError> {
        if raw.is_empty() {
            return Err(SpriteKeyError::Empty);
        }
        if raw.starts_with('/') {
            return Err(SpriteKeyError::LeadingSlash);
        }
        if raw.contains('\\') {
            return Err(SpriteKeyError::Backslash);
        }
        if raw.contains("..") {
            return Err(SpriteKeyError::ParentTraversal);
        }
        if let Some(character) = raw
            .chars()
            .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
        {
            return Err(SpriteKeyError::InvalidCharacter { character });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One drawable image. Animated sprites are horizontal strips of
/// `frame_count` frames, each `width` pixels wide.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteMeta {
    pub key: SpriteKey,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub frame_time: Duration,
}

impl SpriteMeta {
    pub fn still(key: &str, width: u32, height: u32) -> Result<Self, SpriteKeyError> {
        Ok(Self {
            key: SpriteKey::parse(key)?,
            width,
            height,
            frame_count: 1,
            frame_time: Duration::ZERO,
        })
    }

    pub fn animated(
        key: &str,
        width: u32,
        height: u32,
        frame_count: u32,
        frame_time: Duration,
    ) -> Result<Self, SpriteKeyError> {
        Ok(Self {
            key: SpriteKey::parse(key)?,
            width,
            height,
            frame_count: frame_count.max(1),
            frame_time,
        })
    }

    pub fn is_animated(&self) -> bool {
        self.frame_count > 1 && !self.frame_time.is_zero()
    }

    /// Frame shown after `elapsed` time in the current state.
    pub fn frame_at(&self, elapsed: Duration) -> u32 {
        if !self.is_animated() {
            return 0;
        }
        let step = elapsed.as_nanos() / self.frame_time.as_nanos();
        (step % u128::from(self.frame_count)) as u32
    }
}

/// Sprite per state name for one kind of entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteRegistry {
    states: BTreeMap<String, SpriteMeta>,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, state: &str, meta: SpriteMeta) -> Self {
        self.insert(state, meta);
        self
    }

    pub fn insert(&mut self, state: &str, meta: SpriteMeta) {
        self.states.insert(state.to_string(), meta);
    }

    pub fn get(&self, state: &str) -> Option<&SpriteMeta> {
        self.states.get(state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// All sprite registries keyed by sprite-set name, plus tile images by gid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteLibrary {
    sets: BTreeMap<String, SpriteRegistry>,
    tiles: BTreeMap<u32, SpriteMeta>,
}

impl SpriteLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_set(&mut self, name: &str, registry: SpriteRegistry) {
        self.sets.insert(name.to_string(), registry);
    }

    pub fn insert_tile(&mut self, gid: u32, meta: SpriteMeta) {
        self.tiles.insert(gid, meta);
    }

    pub fn registry(&self, name: &str) -> Option<&SpriteRegistry> {
        self.sets.get(name)
    }

    pub fn sprite(&self, set: &str, state: &str) -> Option<&SpriteMeta> {
        self.registry(set).and_then(|registry| registry.get(state))
    }

    pub fn tile(&self, gid: u32) -> Option<&SpriteMeta> {
        self.tiles.get(&gid)
    }
}
