pub mod api;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod format;
pub mod media;
pub mod playback;
pub mod preferences;
pub mod queues;
pub mod routes;
pub mod session;
pub mod sync;
pub mod types;
pub mod workers;

pub use api::{HttpWatchApi, MemoryWatchApi, WatchApi};
pub use config::PlayerConfig;
pub use error::{ReelsyncError, Result};
pub use format::{format_chapter_strip, format_cues_with_timestamps, format_timestamp};
pub use media::{MediaElement, MediaEvent, SimulatedElement};
pub use playback::{PlaybackController, PlaybackSession, PlaybackSnapshot, PlaybackState, SeekOrigin};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use session::{SessionHandle, SessionOptions, start_session};
pub use types::{Chapter, QualityLabel, QualityOption, TranscriptCue, VideoId, WatchProgress};
