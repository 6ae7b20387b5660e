use serde::Serialize;

use crate::{
    events::EventHeader,
    impl_event,
    sync::ScrollIntoView,
    types::{TranscriptCue, VideoId},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum TranscriptCommand {
    ClickCue(usize),
    Search(String),
    /// The user scrolled the cue list by hand.
    UserScrolled,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptCommandIssued {
    pub header: EventHeader,
    pub command: TranscriptCommand,
}

impl TranscriptCommandIssued {
    pub const EVENT_TYPE: &'static str = "transcript.command";

    pub fn new(command: TranscriptCommand) -> Self {
        Self {
            header: EventHeader::new(),
            command,
        }
    }
}

impl_event!(TranscriptCommandIssued);

/// Cues for a video after normalization; empty when the backend had none.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptLoaded {
    pub header: EventHeader,
    pub video_id: VideoId,
    pub cues: Vec<TranscriptCue>,
}

impl TranscriptLoaded {
    pub const EVENT_TYPE: &'static str = "transcript.loaded";
}

impl_event!(TranscriptLoaded);

#[derive(Debug, Clone, Serialize)]
pub struct CueActivated {
    pub header: EventHeader,
    pub video_id: VideoId,
    pub index: Option<usize>,
    pub cue: Option<TranscriptCue>,
    pub scroll: Option<ScrollIntoView>,
}

impl CueActivated {
    pub const EVENT_TYPE: &'static str = "transcript.cue_activated";
}

impl_event!(CueActivated);

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptFiltered {
    pub header: EventHeader,
    pub query: String,
    pub visible: Vec<usize>,
}

impl TranscriptFiltered {
    pub const EVENT_TYPE: &'static str = "transcript.filtered";
}

impl_event!(TranscriptFiltered);
