//! A watch session: the bus plus the workers that sit on it.

pub mod chapters;
pub mod events;
pub mod player;
pub mod sink;
pub mod transcript;

use std::sync::Arc;

use anyhow::Result;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::Instant,
};

pub use chapters::ChapterSyncWorker;
pub use player::PlayerWorker;
pub use sink::HostSinkWorker;
pub use transcript::TranscriptSyncWorker;

use crate::{
    api::WatchApi,
    config::PlayerConfig,
    events::{BusConfig, EnrichedEvent, EventBus, EventBusBuilder},
    media::{MediaElement, MediaEvent},
    playback::{KeyInput, PlaybackController, SeekOrigin},
    preferences::PreferenceStore,
    session::events::{
        ChapterCommand, ChapterCommandIssued, ClockTicked, KeyPressed, MediaEventObserved,
        PlayerCommand, PlayerCommandIssued, SeekRequested, TranscriptCommand,
        TranscriptCommandIssued,
    },
    types::{Chapter, VideoId},
    workers::Worker,
};

pub struct SessionOptions<E> {
    pub config: Arc<PlayerConfig>,
    pub api: Arc<dyn WatchApi>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub element: E,
    pub video_id: VideoId,
    /// Backend chapters for `video_id`; derived from the transcript if absent.
    pub chapters: Option<Vec<Chapter>>,
    pub poster: Option<String>,
    pub bus: BusConfig,
}

pub struct SessionHandle {
    pub bus: Arc<EventBus>,
    pub shutdown_tx: broadcast::Sender<()>,
    /// Outward-facing events, in publish order per type.
    pub events: mpsc::UnboundedReceiver<Arc<EnrichedEvent>>,
    workers: Vec<JoinHandle<Result<()>>>,
}

impl SessionHandle {
    pub fn command(&self, command: PlayerCommand) {
        self.bus.publish(Arc::new(PlayerCommandIssued::new(command)));
    }

    pub fn press_key(&self, input: KeyInput) {
        self.bus.publish(Arc::new(KeyPressed::new(input)));
    }

    pub fn seek(&self, time: f64, origin: SeekOrigin) {
        self.bus.publish(Arc::new(SeekRequested::new(time, origin)));
    }

    pub fn media_event(&self, event: MediaEvent) {
        self.bus.publish(Arc::new(MediaEventObserved::new(event)));
    }

    pub fn tick(&self, at: Instant) {
        self.bus.publish(Arc::new(ClockTicked::new(at)));
    }

    pub fn transcript(&self, command: TranscriptCommand) {
        self.bus
            .publish(Arc::new(TranscriptCommandIssued::new(command)));
    }

    pub fn chapters(&self, command: ChapterCommand) {
        self.bus.publish(Arc::new(ChapterCommandIssued::new(command)));
    }

    /// Signals every worker and waits for them; the player saves progress on
    /// the way out.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        for worker in self.workers {
            worker.await??;
        }
        tracing::info!(session_id = %self.bus.session_id(), "Session stopped");
        Ok(())
    }
}

pub async fn start_session<E: MediaElement + 'static>(
    options: SessionOptions<E>,
) -> Result<SessionHandle> {
    let SessionOptions {
        config,
        api,
        preferences,
        element,
        video_id,
        chapters,
        poster,
        bus: bus_config,
    } = options;

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let builder = EventBusBuilder::new(bus_config)
        .subscribe(PlayerWorker::<E>::subscription())
        .subscribe(TranscriptSyncWorker::subscription())
        .subscribe(ChapterSyncWorker::subscription())
        .subscribe(HostSinkWorker::subscription());

    let (bus, mut wiring, tasks) = builder.build()?;
    let bus = Arc::new(bus);
    tracing::debug!(session_id = %bus.session_id(), "Event bus is ready");

    // isolated drain tasks must run before anything publishes
    for t in tasks.tokio {
        tokio::spawn(t);
    }

    let controller = PlaybackController::new(
        Arc::clone(&config),
        Arc::clone(&api),
        preferences,
        element,
        video_id.clone(),
        Instant::now(),
    );
    let player = PlayerWorker::new(controller);
    let transcript = TranscriptSyncWorker::new(Arc::clone(&api), config.transcript_limit);
    let mut chapter_sync = ChapterSyncWorker::new(&config).with_poster(poster);
    if let Some(chapters) = chapters {
        chapter_sync = chapter_sync.with_chapters(video_id.clone(), chapters);
    }
    let sink = HostSinkWorker::new(events_tx);

    let workers = vec![
        tokio::spawn(sink.run(
            wiring.require(HostSinkWorker::SUBSCRIBER_ID)?,
            Arc::clone(&bus),
            shutdown_rx.resubscribe(),
        )),
        tokio::spawn(transcript.run(
            wiring.require(TranscriptSyncWorker::SUBSCRIBER_ID)?,
            Arc::clone(&bus),
            shutdown_rx.resubscribe(),
        )),
        tokio::spawn(chapter_sync.run(
            wiring.require(ChapterSyncWorker::SUBSCRIBER_ID)?,
            Arc::clone(&bus),
            shutdown_rx.resubscribe(),
        )),
        tokio::spawn(player.run(
            wiring.require(PlayerWorker::<E>::SUBSCRIBER_ID)?,
            Arc::clone(&bus),
            shutdown_rx.resubscribe(),
        )),
    ];
    tracing::info!(session_id = %bus.session_id(), video_id = %video_id, "Session started");

    Ok(SessionHandle {
        bus,
        shutdown_tx,
        events: events_rx,
        workers,
    })
}
