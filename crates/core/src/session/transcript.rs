use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    api::WatchApi,
    events::{EnrichedEvent, EventBus, EventHeader, downcast_ref},
    playback::SeekOrigin,
    session::events::{
        CueActivated, SeekRequested, TimeUpdated, TranscriptCommand, TranscriptCommandIssued,
        TranscriptFiltered, TranscriptLoaded, VideoOpened,
    },
    sync::TranscriptPanel,
    workers::{InputSpec, SubscriptionSpec, Worker},
};

pub struct TranscriptSyncWorker {
    api: Arc<dyn WatchApi>,
    limit: usize,
    panel: TranscriptPanel,
}

impl TranscriptSyncWorker {
    pub fn new(api: Arc<dyn WatchApi>, limit: usize) -> Self {
        Self {
            api,
            limit,
            panel: TranscriptPanel::new(),
        }
    }

    async fn on_video(&mut self, opened: &VideoOpened, bus: &EventBus, header: EventHeader) {
        if self.panel.video_id() == Some(&opened.video_id) {
            return;
        }
        if !self
            .panel
            .load(self.api.as_ref(), opened.video_id.clone(), self.limit)
            .await
        {
            return;
        }
        tracing::info!(video_id = %opened.video_id, cues = self.panel.cues().len(), "Transcript ready");
        bus.publish(Arc::new(TranscriptLoaded {
            header,
            video_id: opened.video_id.clone(),
            cues: self.panel.cues().to_vec(),
        }));
    }

    fn on_time(&mut self, update: &TimeUpdated, bus: &EventBus, header: EventHeader) {
        if self.panel.video_id() != Some(&update.video_id) {
            return;
        }
        let before = self.panel.active_index();
        let scroll = self.panel.on_time(update.current_time);
        if self.panel.active_index() == before {
            return;
        }
        bus.publish(Arc::new(CueActivated {
            header,
            video_id: update.video_id.clone(),
            index: self.panel.active_index(),
            cue: self.panel.active_cue().cloned(),
            scroll,
        }));
    }

    fn on_command(&mut self, command: &TranscriptCommand, bus: &EventBus, header: EventHeader) {
        match command {
            TranscriptCommand::ClickCue(index) => {
                let Some(click) = self.panel.click_cue(*index) else {
                    return;
                };
                if let (Some(scroll), Some(video_id)) = (click.scroll, self.panel.video_id()) {
                    bus.publish(Arc::new(CueActivated {
                        header: header.clone(),
                        video_id: video_id.clone(),
                        index: Some(scroll.cue_index),
                        cue: self.panel.cues().get(scroll.cue_index).cloned(),
                        scroll: Some(scroll),
                    }));
                }
                bus.publish(Arc::new(SeekRequested {
                    header,
                    time: click.seek_to,
                    origin: SeekOrigin::External,
                }));
            }
            TranscriptCommand::Search(query) => {
                self.panel.set_query(query.clone());
                bus.publish(Arc::new(TranscriptFiltered {
                    header,
                    query: query.clone(),
                    visible: self.panel.visible_indices(),
                }));
            }
            TranscriptCommand::UserScrolled => self.panel.on_user_scroll(),
        }
    }
}

#[async_trait]
impl Worker for TranscriptSyncWorker {
    const SUBSCRIBER_ID: &'static str = "sync.transcript";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec::fifo(VideoOpened::EVENT_TYPE, 4),
                InputSpec::latest(TimeUpdated::EVENT_TYPE),
                InputSpec::fifo(TranscriptCommandIssued::EVENT_TYPE, 16),
            ],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> Result<()> {
        let e = &event.event;
        let header = EventHeader::caused_by(e.event_id());

        if let Some(opened) = downcast_ref::<VideoOpened>(e) {
            self.on_video(opened, bus, header).await;
        } else if let Some(update) = downcast_ref::<TimeUpdated>(e) {
            self.on_time(update, bus, header);
        } else if let Some(issued) = downcast_ref::<TranscriptCommandIssued>(e) {
            self.on_command(&issued.command, bus, header);
        } else {
            anyhow::bail!("unexpected event_type={}", e.event_type());
        }
        Ok(())
    }
}
