use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    events::{EnrichedEvent, EventBus},
    queues::QueueKind,
    session::events::{
        ChapterActivated, ChapterStripScrolled, ChaptersResolved, CueActivated, NoticeRaised,
        PlaybackStateChanged, QualityChanged, SourceLoaded, TheaterToggled, TimeUpdated,
        TranscriptFiltered, TranscriptLoaded, VideoOpened,
    },
    workers::{InputSpec, SubscriptionSpec, Worker, WorkerFailed},
};

/// Hands every outward-facing session event to the host page.
pub struct HostSinkWorker {
    tx: mpsc::UnboundedSender<Arc<EnrichedEvent>>,
}

impl HostSinkWorker {
    pub fn new(tx: mpsc::UnboundedSender<Arc<EnrichedEvent>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Worker for HostSinkWorker {
    const SUBSCRIBER_ID: &'static str = "host.sink";

    fn subscription() -> SubscriptionSpec {
        let isolated = |event_type| InputSpec {
            event_type,
            queue_kind: QueueKind::Isolated { output_buffer: 64 },
        };
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec::latest(TimeUpdated::EVENT_TYPE),
                isolated(PlaybackStateChanged::EVENT_TYPE),
                isolated(QualityChanged::EVENT_TYPE),
                isolated(SourceLoaded::EVENT_TYPE),
                isolated(NoticeRaised::EVENT_TYPE),
                isolated(TheaterToggled::EVENT_TYPE),
                isolated(VideoOpened::EVENT_TYPE),
                isolated(TranscriptLoaded::EVENT_TYPE),
                isolated(CueActivated::EVENT_TYPE),
                isolated(TranscriptFiltered::EVENT_TYPE),
                isolated(ChaptersResolved::EVENT_TYPE),
                isolated(ChapterActivated::EVENT_TYPE),
                isolated(ChapterStripScrolled::EVENT_TYPE),
                isolated(WorkerFailed::EVENT_TYPE),
            ],
        }
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, _bus: &EventBus) -> Result<()> {
        if self.tx.send(event).is_err() {
            tracing::debug!("Host stopped listening");
        }
        Ok(())
    }
}
