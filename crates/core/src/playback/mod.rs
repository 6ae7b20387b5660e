pub mod controller;
pub mod controls;
pub mod keyboard;
pub mod state;

pub use controller::{
    NoticeLevel, PlaybackController, PlaybackNotice, PlaybackSession, PlaybackSnapshot,
    PlayerOutput, SeekOrigin,
};
pub use controls::ControlsVisibility;
pub use keyboard::{FocusTarget, Key, KeyInput, Shortcut, shortcut_for};
pub use state::{PlaybackState, Spinner};
