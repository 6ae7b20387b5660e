use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    config::PlayerConfig,
    events::{EnrichedEvent, EventBus, EventHeader, downcast_ref},
    playback::SeekOrigin,
    session::events::{
        ChapterActivated, ChapterCommand, ChapterCommandIssued, ChapterStripScrolled,
        ChaptersResolved, SeekRequested, TimeUpdated, TranscriptLoaded, VideoOpened,
    },
    sync::{ChapterPanel, resolve_chapters},
    types::{Chapter, VideoId},
    workers::{InputSpec, SubscriptionSpec, Worker},
};

pub struct ChapterSyncWorker {
    max_chapters: usize,
    poster: Option<String>,
    /// Chapters the backend supplied up front, per video.
    explicit: HashMap<VideoId, Vec<Chapter>>,
    video_id: Option<VideoId>,
    last_time: f64,
    panel: ChapterPanel,
}

impl ChapterSyncWorker {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            max_chapters: config.max_chapters,
            poster: None,
            explicit: HashMap::new(),
            video_id: None,
            last_time: 0.0,
            panel: ChapterPanel::new(Vec::new(), config.chapter_strip_scroll_px),
        }
    }

    pub fn with_poster(mut self, poster: Option<String>) -> Self {
        self.poster = poster;
        self
    }

    pub fn with_chapters(mut self, video_id: VideoId, chapters: Vec<Chapter>) -> Self {
        self.explicit.insert(video_id, chapters);
        self
    }

    fn has_explicit(&self, video_id: &VideoId) -> bool {
        self.explicit.get(video_id).is_some_and(|c| !c.is_empty())
    }

    fn install(&mut self, video_id: &VideoId, chapters: Vec<Chapter>, bus: &EventBus, parent: &EventHeader) {
        self.panel.set_chapters(chapters);
        self.panel.on_time(self.last_time);
        tracing::debug!(video_id = %video_id, chapters = self.panel.chapters().len(), "Chapters resolved");

        bus.publish(Arc::new(ChaptersResolved {
            header: parent.clone(),
            video_id: video_id.clone(),
            chapters: self.panel.chapters().to_vec(),
        }));
        self.publish_active(bus, parent.clone());
    }

    fn publish_active(&self, bus: &EventBus, header: EventHeader) {
        if let (Some(index), Some(chapter)) = (self.panel.active_index(), self.panel.active_chapter()) {
            bus.publish(Arc::new(ChapterActivated {
                header,
                index,
                chapter: chapter.clone(),
            }));
        }
    }

    fn publish_strip(&self, bus: &EventBus, header: EventHeader) {
        let strip = self.panel.strip();
        bus.publish(Arc::new(ChapterStripScrolled {
            header,
            scroll_left: strip.scroll_left(),
            can_scroll_back: strip.can_scroll_back(),
            can_scroll_forward: strip.can_scroll_forward(),
        }));
    }

    fn on_video(&mut self, opened: &VideoOpened, bus: &EventBus, header: EventHeader) {
        self.video_id = Some(opened.video_id.clone());
        self.last_time = 0.0;

        if self.has_explicit(&opened.video_id) {
            let chapters = resolve_chapters(
                self.explicit.get(&opened.video_id).map(Vec::as_slice),
                &[],
                self.max_chapters,
                self.poster.as_deref(),
            );
            self.install(&opened.video_id, chapters, bus, &header);
        } else {
            self.panel.set_chapters(Vec::new());
        }
    }

    fn on_transcript(&mut self, loaded: &TranscriptLoaded, bus: &EventBus, header: EventHeader) {
        if self.video_id.as_ref() != Some(&loaded.video_id) || self.has_explicit(&loaded.video_id) {
            return;
        }
        let chapters = resolve_chapters(None, &loaded.cues, self.max_chapters, self.poster.as_deref());
        self.install(&loaded.video_id, chapters, bus, &header);
    }

    fn on_time(&mut self, update: &TimeUpdated, bus: &EventBus, header: EventHeader) {
        if self.video_id.as_ref() != Some(&update.video_id) {
            return;
        }
        self.last_time = update.current_time;
        if self.panel.on_time(update.current_time).is_some() {
            self.publish_active(bus, header);
        }
    }

    fn on_command(&mut self, command: &ChapterCommand, bus: &EventBus, header: EventHeader) {
        match *command {
            ChapterCommand::Click { index } => {
                if let Some(time) = self.panel.click(index) {
                    bus.publish(Arc::new(SeekRequested {
                        header,
                        time,
                        origin: SeekOrigin::External,
                    }));
                }
            }
            ChapterCommand::ScrollStrip { direction } => {
                self.panel.strip_mut().scroll_by(direction);
                self.publish_strip(bus, header);
            }
            ChapterCommand::Resize {
                content_width,
                viewport_width,
            } => {
                self.panel
                    .strip_mut()
                    .set_dimensions(content_width, viewport_width);
                self.publish_strip(bus, header);
            }
        }
    }
}

#[async_trait]
impl Worker for ChapterSyncWorker {
    const SUBSCRIBER_ID: &'static str = "sync.chapters";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec::fifo(VideoOpened::EVENT_TYPE, 4),
                InputSpec::fifo(TranscriptLoaded::EVENT_TYPE, 4),
                InputSpec::latest(TimeUpdated::EVENT_TYPE),
                InputSpec::fifo(ChapterCommandIssued::EVENT_TYPE, 16),
            ],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> Result<()> {
        let e = &event.event;
        let header = EventHeader::caused_by(e.event_id());

        if let Some(opened) = downcast_ref::<VideoOpened>(e) {
            self.on_video(opened, bus, header);
        } else if let Some(loaded) = downcast_ref::<TranscriptLoaded>(e) {
            self.on_transcript(loaded, bus, header);
        } else if let Some(update) = downcast_ref::<TimeUpdated>(e) {
            self.on_time(update, bus, header);
        } else if let Some(issued) = downcast_ref::<ChapterCommandIssued>(e) {
            self.on_command(&issued.command, bus, header);
        } else {
            anyhow::bail!("unexpected event_type={}", e.event_type());
        }
        Ok(())
    }
}
