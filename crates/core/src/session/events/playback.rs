use serde::Serialize;
use tokio::time::Instant;

use crate::{
    events::EventHeader,
    impl_event,
    media::MediaEvent,
    playback::{KeyInput, PlaybackNotice, PlaybackState, SeekOrigin},
    types::{QualityLabel, QualityOption, VideoId},
};

/// Host-side actions on the player that are not keyboard shortcuts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum PlayerCommand {
    TogglePlay,
    Play,
    Pause,
    SetQuality(QualityLabel),
    SetVolume(f64),
    ToggleMute,
    SetPlaybackRate(f64),
    ToggleFullscreen,
    TogglePictureInPicture,
    ToggleTheater,
    PointerMoved,
    SetSettingsOpen(bool),
    BeginScrub,
    /// Scrub position as a fraction of the duration.
    ScrubTo(f64),
    EndScrub,
    /// Raw `src` supplied by the page, possibly relative.
    SyncSource(String),
    OpenVideo(VideoId),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerCommandIssued {
    pub header: EventHeader,
    pub command: PlayerCommand,
}

impl PlayerCommandIssued {
    pub const EVENT_TYPE: &'static str = "playback.command";

    pub fn new(command: PlayerCommand) -> Self {
        Self {
            header: EventHeader::new(),
            command,
        }
    }
}

impl_event!(PlayerCommandIssued);

#[derive(Debug, Clone, Serialize)]
pub struct KeyPressed {
    pub header: EventHeader,
    pub input: KeyInput,
}

impl KeyPressed {
    pub const EVENT_TYPE: &'static str = "playback.key_pressed";

    pub fn new(input: KeyInput) -> Self {
        Self {
            header: EventHeader::new(),
            input,
        }
    }
}

impl_event!(KeyPressed);

/// A native media event reported by the host's element.
#[derive(Debug, Clone, Serialize)]
pub struct MediaEventObserved {
    pub header: EventHeader,
    pub event: MediaEvent,
}

impl MediaEventObserved {
    pub const EVENT_TYPE: &'static str = "playback.media_event";

    pub fn new(event: MediaEvent) -> Self {
        Self {
            header: EventHeader::new(),
            event,
        }
    }
}

impl_event!(MediaEventObserved);

/// Clock pulse for elements that do not run on their own.
#[derive(Debug, Clone, Serialize)]
pub struct ClockTicked {
    pub header: EventHeader,
    #[serde(skip)]
    pub at: Instant,
}

impl ClockTicked {
    pub const EVENT_TYPE: &'static str = "playback.clock_ticked";

    pub fn new(at: Instant) -> Self {
        Self {
            header: EventHeader::new(),
            at,
        }
    }
}

impl_event!(ClockTicked);

/// Ask the player to move the playhead. Only the player worker writes to the
/// element, so panels go through this.
#[derive(Debug, Clone, Serialize)]
pub struct SeekRequested {
    pub header: EventHeader,
    pub time: f64,
    pub origin: SeekOrigin,
}

impl SeekRequested {
    pub const EVENT_TYPE: &'static str = "playback.seek_requested";

    pub fn new(time: f64, origin: SeekOrigin) -> Self {
        Self {
            header: EventHeader::new(),
            time,
            origin,
        }
    }

    pub fn external(time: f64) -> Self {
        Self::new(time, SeekOrigin::External)
    }
}

impl_event!(SeekRequested);

#[derive(Debug, Clone, Serialize)]
pub struct TimeUpdated {
    pub header: EventHeader,
    pub video_id: VideoId,
    pub current_time: f64,
    pub duration: f64,
}

impl TimeUpdated {
    pub const EVENT_TYPE: &'static str = "playback.time_updated";
}

impl_event!(TimeUpdated);

#[derive(Debug, Clone, Serialize)]
pub struct PlaybackStateChanged {
    pub header: EventHeader,
    pub video_id: VideoId,
    pub state: PlaybackState,
}

impl PlaybackStateChanged {
    pub const EVENT_TYPE: &'static str = "playback.state_changed";
}

impl_event!(PlaybackStateChanged);

#[derive(Debug, Clone, Serialize)]
pub struct QualityChanged {
    pub header: EventHeader,
    pub quality: QualityLabel,
    pub options: Vec<QualityOption>,
}

impl QualityChanged {
    pub const EVENT_TYPE: &'static str = "playback.quality_changed";
}

impl_event!(QualityChanged);

#[derive(Debug, Clone, Serialize)]
pub struct SourceLoaded {
    pub header: EventHeader,
    pub src: String,
}

impl SourceLoaded {
    pub const EVENT_TYPE: &'static str = "playback.source_loaded";
}

impl_event!(SourceLoaded);

/// Toast for the user.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeRaised {
    pub header: EventHeader,
    pub notice: PlaybackNotice,
}

impl NoticeRaised {
    pub const EVENT_TYPE: &'static str = "playback.notice";
}

impl_event!(NoticeRaised);

/// Theater mode changes the page layout, which the player does not own.
#[derive(Debug, Clone, Serialize)]
pub struct TheaterToggled {
    pub header: EventHeader,
    pub enabled: bool,
}

impl TheaterToggled {
    pub const EVENT_TYPE: &'static str = "playback.theater_toggled";
}

impl_event!(TheaterToggled);

/// The player has a new subject; panels reload for it.
#[derive(Debug, Clone, Serialize)]
pub struct VideoOpened {
    pub header: EventHeader,
    pub video_id: VideoId,
}

impl VideoOpened {
    pub const EVENT_TYPE: &'static str = "playback.video_opened";
}

impl_event!(VideoOpened);
