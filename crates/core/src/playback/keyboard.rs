use serde::{Deserialize, Serialize};

use crate::config::PlayerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            " " | "Spacebar" => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c.to_ascii_lowercase()),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// Where keyboard focus was when the key went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    #[default]
    Page,
    TextInput,
    TextArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub target: FocusTarget,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            meta: false,
            shift: false,
            target: FocusTarget::Page,
        }
    }

    fn is_suppressed(&self) -> bool {
        self.ctrl
            || self.alt
            || self.meta
            || matches!(self.target, FocusTarget::TextInput | FocusTarget::TextArea)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortcut {
    TogglePlay,
    ToggleMute,
    ToggleFullscreen,
    ToggleTheater,
    TogglePictureInPicture,
    /// Relative seek in seconds.
    SeekBy(f64),
    /// Relative volume change.
    VolumeBy(f64),
    /// Seek to this fraction of the duration.
    SeekToFraction(f64),
}

pub fn shortcut_for(input: &KeyInput, config: &PlayerConfig) -> Option<Shortcut> {
    if input.is_suppressed() {
        return None;
    }

    let shortcut = match input.key {
        Key::Space | Key::Char('k') => Shortcut::TogglePlay,
        Key::Char('m') => Shortcut::ToggleMute,
        Key::Char('f') => Shortcut::ToggleFullscreen,
        Key::Char('t') => Shortcut::ToggleTheater,
        Key::Char('i') => Shortcut::TogglePictureInPicture,
        Key::Char('j') => Shortcut::SeekBy(-config.seek_step_long),
        Key::ArrowLeft => Shortcut::SeekBy(-config.seek_step_short),
        Key::Char('l') => Shortcut::SeekBy(config.seek_step_long),
        Key::ArrowRight => Shortcut::SeekBy(config.seek_step_short),
        Key::ArrowUp => Shortcut::VolumeBy(config.volume_step),
        Key::ArrowDown => Shortcut::VolumeBy(-config.volume_step),
        Key::Char(c) if c.is_ascii_digit() => {
            Shortcut::SeekToFraction(f64::from(c as u8 - b'0') / 10.0)
        }
        _ => return None,
    };
    Some(shortcut)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(key: &str) -> Option<Shortcut> {
        shortcut_for(&KeyInput::plain(Key::from_dom(key)), &PlayerConfig::default())
    }

    #[test]
    fn documented_keys_map_to_shortcuts() {
        assert_eq!(map(" "), Some(Shortcut::TogglePlay));
        assert_eq!(map("K"), Some(Shortcut::TogglePlay));
        assert_eq!(map("m"), Some(Shortcut::ToggleMute));
        assert_eq!(map("f"), Some(Shortcut::ToggleFullscreen));
        assert_eq!(map("t"), Some(Shortcut::ToggleTheater));
        assert_eq!(map("i"), Some(Shortcut::TogglePictureInPicture));
        assert_eq!(map("j"), Some(Shortcut::SeekBy(-10.0)));
        assert_eq!(map("ArrowLeft"), Some(Shortcut::SeekBy(-5.0)));
        assert_eq!(map("l"), Some(Shortcut::SeekBy(10.0)));
        assert_eq!(map("ArrowRight"), Some(Shortcut::SeekBy(5.0)));
        assert_eq!(map("ArrowUp"), Some(Shortcut::VolumeBy(0.1)));
        assert_eq!(map("ArrowDown"), Some(Shortcut::VolumeBy(-0.1)));
        assert_eq!(map("0"), Some(Shortcut::SeekToFraction(0.0)));
        assert_eq!(map("7"), Some(Shortcut::SeekToFraction(0.7)));
        assert_eq!(map("Escape"), None);
        assert_eq!(map("x"), None);
    }

    #[test]
    fn modifiers_and_text_fields_suppress_shortcuts() {
        let config = PlayerConfig::default();
        let mut input = KeyInput::plain(Key::Char('k'));

        input.ctrl = true;
        assert_eq!(shortcut_for(&input, &config), None);

        input.ctrl = false;
        input.meta = true;
        assert_eq!(shortcut_for(&input, &config), None);

        input.meta = false;
        input.alt = true;
        assert_eq!(shortcut_for(&input, &config), None);

        input.alt = false;
        input.target = FocusTarget::TextArea;
        assert_eq!(shortcut_for(&input, &config), None);

        input.target = FocusTarget::TextInput;
        assert_eq!(shortcut_for(&input, &config), None);
    }

    #[test]
    fn shift_alone_is_allowed() {
        let mut input = KeyInput::plain(Key::from_dom("L"));
        input.shift = true;
        assert_eq!(
            shortcut_for(&input, &PlayerConfig::default()),
            Some(Shortcut::SeekBy(10.0))
        );
    }
}
