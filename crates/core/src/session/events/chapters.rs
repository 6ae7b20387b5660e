use serde::Serialize;

use crate::{
    events::EventHeader,
    impl_event,
    types::{Chapter, VideoId},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ChapterCommand {
    Click { index: usize },
    /// One step back (negative) or forward (positive).
    ScrollStrip { direction: f64 },
    Resize { content_width: f64, viewport_width: f64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterCommandIssued {
    pub header: EventHeader,
    pub command: ChapterCommand,
}

impl ChapterCommandIssued {
    pub const EVENT_TYPE: &'static str = "chapters.command";

    pub fn new(command: ChapterCommand) -> Self {
        Self {
            header: EventHeader::new(),
            command,
        }
    }
}

impl_event!(ChapterCommandIssued);

#[derive(Debug, Clone, Serialize)]
pub struct ChaptersResolved {
    pub header: EventHeader,
    pub video_id: VideoId,
    pub chapters: Vec<Chapter>,
}

impl ChaptersResolved {
    pub const EVENT_TYPE: &'static str = "chapters.resolved";
}

impl_event!(ChaptersResolved);

#[derive(Debug, Clone, Serialize)]
pub struct ChapterActivated {
    pub header: EventHeader,
    pub index: usize,
    pub chapter: Chapter,
}

impl ChapterActivated {
    pub const EVENT_TYPE: &'static str = "chapters.activated";
}

impl_event!(ChapterActivated);

#[derive(Debug, Clone, Serialize)]
pub struct ChapterStripScrolled {
    pub header: EventHeader,
    pub scroll_left: f64,
    pub can_scroll_back: bool,
    pub can_scroll_forward: bool,
}

impl ChapterStripScrolled {
    pub const EVENT_TYPE: &'static str = "chapters.strip_scrolled";
}

impl_event!(ChapterStripScrolled);
