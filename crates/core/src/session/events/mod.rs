//! Everything that travels on a watch session's bus.
//!
//! Commands flow into the player and panels (`*.command`, key presses, seek
//! requests); facts flow out (`time_updated`, `cue_activated`, ...).

pub mod chapters;
pub mod playback;
pub mod transcript;

pub use chapters::*;
pub use playback::*;
pub use transcript::*;
