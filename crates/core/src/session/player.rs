use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    events::{EnrichedEvent, Event, EventBus, EventHeader, downcast_ref},
    media::MediaElement,
    playback::{PlaybackController, PlayerOutput},
    session::events::{
        ClockTicked, KeyPressed, MediaEventObserved, NoticeRaised, PlaybackStateChanged,
        PlayerCommand, PlayerCommandIssued, QualityChanged, SeekRequested, SourceLoaded,
        TheaterToggled, TimeUpdated, VideoOpened,
    },
    workers::{InputSpec, SubscriptionSpec, Worker},
};

/// Owns the controller, and with it the only handle on the media element.
pub struct PlayerWorker<E: MediaElement> {
    controller: PlaybackController<E>,
    last_tick: Option<Instant>,
}

impl<E: MediaElement + 'static> PlayerWorker<E> {
    pub fn new(controller: PlaybackController<E>) -> Self {
        Self {
            controller,
            last_tick: None,
        }
    }

    async fn apply(&mut self, command: PlayerCommand, now: Instant, bus: &EventBus) -> Result<()> {
        match command {
            PlayerCommand::TogglePlay => self.controller.toggle_play(),
            PlayerCommand::Play => self.controller.play(),
            PlayerCommand::Pause => self.controller.pause(),
            PlayerCommand::SetQuality(label) => self.controller.handle_quality_change(label).await,
            PlayerCommand::SetVolume(volume) => self.controller.set_volume(volume),
            PlayerCommand::ToggleMute => self.controller.toggle_mute(),
            PlayerCommand::SetPlaybackRate(rate) => self.controller.set_playback_rate(rate),
            PlayerCommand::ToggleFullscreen => self.controller.toggle_fullscreen(),
            PlayerCommand::TogglePictureInPicture => self.controller.toggle_picture_in_picture(),
            PlayerCommand::ToggleTheater => self.controller.toggle_theater(),
            PlayerCommand::PointerMoved => self.controller.pointer_moved(now),
            PlayerCommand::SetSettingsOpen(open) => self.controller.set_settings_open(open, now),
            PlayerCommand::BeginScrub => self.controller.begin_scrub(now),
            PlayerCommand::ScrubTo(fraction) => self.controller.scrub_to(fraction),
            PlayerCommand::EndScrub => self.controller.end_scrub(now),
            PlayerCommand::SyncSource(src) => {
                self.controller.sync_source(&src)?;
            }
            PlayerCommand::OpenVideo(video_id) => {
                if video_id != self.controller.session().video_id {
                    bus.publish(Arc::new(VideoOpened {
                        header: EventHeader::new(),
                        video_id: video_id.clone(),
                    }));
                    self.controller.set_video(video_id).await;
                }
            }
        }
        Ok(())
    }

    fn publish_outputs(&mut self, bus: &EventBus, parent: Option<Uuid>) {
        let video_id = self.controller.session().video_id.clone();

        for output in self.controller.drain_outputs() {
            let header = parent.map(EventHeader::caused_by).unwrap_or_default();
            let event: Arc<dyn Event> = match output {
                PlayerOutput::TimeUpdated {
                    current_time,
                    duration,
                } => Arc::new(TimeUpdated {
                    header,
                    video_id: video_id.clone(),
                    current_time,
                    duration,
                }),
                PlayerOutput::StateChanged(state) => Arc::new(PlaybackStateChanged {
                    header,
                    video_id: video_id.clone(),
                    state,
                }),
                PlayerOutput::QualityChanged { quality } => Arc::new(QualityChanged {
                    header,
                    quality,
                    options: self.controller.session().qualities.clone(),
                }),
                PlayerOutput::SourceLoaded { src } => Arc::new(SourceLoaded {
                    header,
                    src: src.to_string(),
                }),
                PlayerOutput::Notice(notice) => Arc::new(NoticeRaised { header, notice }),
                PlayerOutput::TheaterToggled { enabled } => {
                    Arc::new(TheaterToggled { header, enabled })
                }
            };
            bus.publish(event);
        }
    }
}

#[async_trait]
impl<E: MediaElement + 'static> Worker for PlayerWorker<E> {
    const SUBSCRIBER_ID: &'static str = "playback.player";

    fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            inputs: vec![
                InputSpec::fifo(PlayerCommandIssued::EVENT_TYPE, 32),
                InputSpec::fifo(SeekRequested::EVENT_TYPE, 8),
                InputSpec::fifo(KeyPressed::EVENT_TYPE, 32),
                InputSpec::fifo(MediaEventObserved::EVENT_TYPE, 64),
                InputSpec::latest(ClockTicked::EVENT_TYPE),
            ],
        }
    }

    async fn on_start(&mut self, bus: &EventBus) -> Result<()> {
        bus.publish(Arc::new(VideoOpened {
            header: EventHeader::new(),
            video_id: self.controller.session().video_id.clone(),
        }));
        self.controller.open().await;
        self.controller.pump_element(Instant::now()).await;
        self.publish_outputs(bus, None);
        Ok(())
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> Result<()> {
        let now = Instant::now();
        let parent = event.event.event_id();
        let e = &event.event;

        let result = if let Some(issued) = downcast_ref::<PlayerCommandIssued>(e) {
            self.apply(issued.command.clone(), now, bus).await
        } else if let Some(seek) = downcast_ref::<SeekRequested>(e) {
            self.controller.seek(seek.time, seek.origin);
            Ok(())
        } else if let Some(key) = downcast_ref::<KeyPressed>(e) {
            self.controller.handle_key(&key.input, now);
            Ok(())
        } else if let Some(observed) = downcast_ref::<MediaEventObserved>(e) {
            self.controller
                .handle_media_event(observed.event.clone(), now)
                .await;
            Ok(())
        } else if let Some(tick) = downcast_ref::<ClockTicked>(e) {
            let elapsed = self
                .last_tick
                .map(|last| tick.at.saturating_duration_since(last).as_secs_f64())
                .unwrap_or(0.0);
            self.last_tick = Some(tick.at);
            self.controller.advance_clock(elapsed, tick.at).await;
            Ok(())
        } else {
            Err(anyhow::anyhow!("unexpected event_type={}", e.event_type()))
        };

        self.controller.pump_element(now).await;
        self.publish_outputs(bus, Some(parent));
        result
    }

    async fn on_stop(&mut self, bus: &EventBus) {
        self.controller.shutdown().await;
        self.publish_outputs(bus, None);
    }
}
