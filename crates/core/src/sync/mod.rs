pub mod chapters;
pub mod throttle;
pub mod transcript;

pub use chapters::{ChapterPanel, ChapterStrip, active_chapter_index, derive_chapters, resolve_chapters};
pub use throttle::Throttle;
pub use transcript::{CueClick, ScrollIntoView, TranscriptPanel, active_cue_index, normalize_cues};
