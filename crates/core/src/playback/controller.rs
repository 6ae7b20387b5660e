//! Playback controller: the single owner of the media element.
//!
//! Everything the watch page does to the element goes through here. The
//! controller never talks to sibling panels directly; it queues
//! `PlayerOutput`s which the player worker publishes on the bus.

use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;
use tokio::{task::JoinHandle, time::Instant};

use crate::{
    api::WatchApi,
    config::PlayerConfig,
    effects::{EffectGeneration, EffectTicket},
    error::{ReelsyncError, Result},
    media::{MediaElement, MediaEvent, resolve_src},
    playback::{
        controls::ControlsVisibility,
        keyboard::{KeyInput, Shortcut, shortcut_for},
        state::{PlaybackState, Spinner},
    },
    preferences::PreferenceStore,
    sync::throttle::Throttle,
    types::{QualityLabel, QualityOption, VideoId, WatchProgress, quality_options},
};

pub const MIN_PLAYBACK_RATE: f64 = 0.25;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;
pub const PLAYBACK_RATE_PRESETS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekOrigin {
    /// Dragging or clicking the scrub bar.
    Scrub,
    Keyboard,
    /// Transcript or chapter panel; resumes a paused player.
    External,
    /// Restoring saved watch progress.
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-facing message (a toast in the browser host).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl PlaybackNotice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What the controller wants the rest of the page to know.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerOutput {
    TimeUpdated { current_time: f64, duration: f64 },
    StateChanged(PlaybackState),
    QualityChanged { quality: QualityLabel },
    SourceLoaded { src: Url },
    Notice(PlaybackNotice),
    TheaterToggled { enabled: bool },
}

/// Transient state of one mounted player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSession {
    pub video_id: VideoId,
    #[serde(serialize_with = "serialize_url")]
    pub active_src: Option<Url>,
    pub current_time: f64,
    /// `NaN` until metadata has loaded.
    pub duration: f64,
    pub state: PlaybackState,
    pub quality: QualityLabel,
    pub qualities: Vec<QualityOption>,
    pub playback_rate: f64,
    pub volume: f64,
    pub muted: bool,
    pub fullscreen: bool,
    pub picture_in_picture: bool,
    pub theater: bool,
}

fn serialize_url<S: serde::Serializer>(
    url: &Option<Url>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match url {
        Some(url) => serializer.serialize_some(url.as_str()),
        None => serializer.serialize_none(),
    }
}

impl PlaybackSession {
    fn new(video_id: VideoId, quality: QualityLabel) -> Self {
        Self {
            video_id,
            active_src: None,
            current_time: 0.0,
            duration: f64::NAN,
            state: PlaybackState::Idle,
            quality,
            qualities: quality_options(&[]),
            playback_rate: 1.0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            picture_in_picture: false,
            theater: false,
        }
    }

    pub fn has_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Fraction of the video played, for the scrub bar.
    pub fn progress_fraction(&self) -> f64 {
        if self.has_duration() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Everything a host needs to render the player chrome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    #[serde(flatten)]
    pub session: PlaybackSession,
    pub spinner: Spinner,
    pub progress_fraction: f64,
    pub controls_visible: bool,
    pub scrubbing: bool,
}

pub struct PlaybackController<E: MediaElement> {
    config: Arc<PlayerConfig>,
    api: Arc<dyn WatchApi>,
    preferences: Arc<dyn PreferenceStore>,
    element: E,
    session: PlaybackSession,
    /// Last source handed to the element, already absolute.
    loaded_src: Option<Url>,
    time_throttle: Throttle<f64>,
    /// Latest instant any entry point was handed.
    clock: Instant,
    controls: ControlsVisibility,
    scrubbing: bool,
    pending_resume: Option<f64>,
    /// Set while the default-quality stream loaded after a media error has
    /// not produced metadata yet.
    fallback_in_flight: bool,
    /// Whether playback was running when the element last went into error.
    resume_after_error: bool,
    progress_generation: EffectGeneration,
    volume_before_mute: f64,
    last_saved: Option<WatchProgress>,
    pending_saves: Vec<JoinHandle<()>>,
    outbox: Vec<PlayerOutput>,
}

impl<E: MediaElement> PlaybackController<E> {
    pub fn new(
        config: Arc<PlayerConfig>,
        api: Arc<dyn WatchApi>,
        preferences: Arc<dyn PreferenceStore>,
        element: E,
        video_id: VideoId,
        now: Instant,
    ) -> Self {
        let quality = preferences.load_quality().unwrap_or_default();
        let time_throttle = Throttle::new(config.time_update_interval);
        let controls = ControlsVisibility::new(config.controls_hide_delay, now);

        Self {
            config,
            api,
            preferences,
            element,
            session: PlaybackSession::new(video_id, quality),
            loaded_src: None,
            time_throttle,
            clock: now,
            controls,
            scrubbing: false,
            pending_resume: None,
            fallback_in_flight: false,
            resume_after_error: false,
            progress_generation: EffectGeneration::new(),
            volume_before_mute: 1.0,
            last_saved: None,
            pending_saves: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> &PlaybackState {
        &self.session.state
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.is_visible()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            session: self.session.clone(),
            spinner: self.session.state.spinner(),
            progress_fraction: self.session.progress_fraction(),
            controls_visible: self.controls.is_visible(),
            scrubbing: self.scrubbing,
        }
    }

    /// Takes everything queued for the bus since the last call.
    pub fn drain_outputs(&mut self) -> Vec<PlayerOutput> {
        std::mem::take(&mut self.outbox)
    }

    fn set_state(&mut self, state: PlaybackState) {
        if state != self.session.state {
            tracing::debug!(from = self.session.state.name(), to = state.name(), "Playback state");
            if matches!(state, PlaybackState::Error { .. })
                && !matches!(self.session.state, PlaybackState::Error { .. })
            {
                self.resume_after_error = self.session.state.is_playing_or_will_resume();
            }
            self.session.state = state.clone();
            self.outbox.push(PlayerOutput::StateChanged(state));
        }
    }

    fn notify(&mut self, notice: PlaybackNotice) {
        self.outbox.push(PlayerOutput::Notice(notice));
    }

    fn publish_time(&mut self, current_time: f64) {
        self.outbox.push(PlayerOutput::TimeUpdated {
            current_time,
            duration: self.session.duration,
        });
    }

    // ----- source handling -------------------------------------------------

    /// Resolves the preferred quality's stream and loads it, then restores
    /// saved progress. A failed stream falls back to the default quality.
    pub async fn open(&mut self) {
        let quality = self.session.quality.clone();
        let url = match self.fetch_stream_url(&quality).await {
            Ok(url) => Some(url),
            Err(e) if quality != self.config.default_quality => {
                tracing::warn!(quality = %quality, error = %e, "Preferred quality unavailable, using default");
                let default = self.config.default_quality.clone();
                match self.fetch_stream_url(&default).await {
                    Ok(url) => {
                        self.session.quality = default.clone();
                        self.outbox
                            .push(PlayerOutput::QualityChanged { quality: default });
                        self.fallback_in_flight = true;
                        Some(url)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "No playable stream");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::error!(quality = %quality, error = %e, "No playable stream");
                None
            }
        };

        match url {
            Some(url) => {
                self.load_url(url);
                self.resume_from_saved_progress().await;
            }
            None => {
                self.set_state(PlaybackState::Error {
                    message: "stream unavailable".to_string(),
                });
                self.notify(PlaybackNotice::error("This video could not be loaded"));
            }
        }
    }

    /// Switches to another video, dropping any in-flight progress lookup.
    pub async fn set_video(&mut self, video_id: VideoId) {
        if video_id == self.session.video_id && self.loaded_src.is_some() {
            return;
        }
        self.flush_progress();
        self.progress_generation.invalidate();
        self.time_throttle.reset();
        self.pending_resume = None;
        self.fallback_in_flight = false;

        let mut session = PlaybackSession::new(video_id, self.session.quality.clone());
        session.volume = self.session.volume;
        session.muted = self.session.muted;
        session.playback_rate = self.session.playback_rate;
        session.theater = self.session.theater;
        self.session = session;
        self.loaded_src = None;
        self.outbox
            .push(PlayerOutput::StateChanged(PlaybackState::Idle));

        self.open().await;
    }

    /// Applies an externally supplied `src`.
    ///
    /// The element only reloads when the resolved absolute URL differs from
    /// the one last loaded; comparing raw strings would reload whenever a
    /// relative path is re-supplied. Returns whether a reload happened.
    pub fn sync_source(&mut self, raw_src: &str) -> Result<bool> {
        let resolved = resolve_src(&self.config.base_url, raw_src)?;
        if self.loaded_src.as_ref() == Some(&resolved) {
            return Ok(false);
        }
        self.load_url(resolved);
        Ok(true)
    }

    fn load_url(&mut self, url: Url) {
        tracing::info!(video_id = %self.session.video_id, src = %url, "Loading source");
        self.element.load(&url);
        self.element.set_volume(self.session.volume);
        self.element.set_muted(self.session.muted);
        self.element.set_playback_rate(self.session.playback_rate);
        self.loaded_src = Some(url.clone());
        self.session.active_src = Some(url.clone());
        self.outbox.push(PlayerOutput::SourceLoaded { src: url });
    }

    async fn fetch_stream_url(&mut self, quality: &QualityLabel) -> Result<Url> {
        let meta = self
            .api
            .get_stream_meta(&self.session.video_id, quality)
            .await?;
        let raw = meta
            .playback_url
            .ok_or_else(|| ReelsyncError::MissingPlaybackUrl {
                video_id: self.session.video_id.to_string(),
                quality: quality.to_string(),
            })?;
        let url = resolve_src(&self.config.base_url, &raw)?;

        if !meta.available_qualities.is_empty() {
            self.session.qualities = quality_options(&meta.available_qualities);
        }
        if let Some(option) = self
            .session
            .qualities
            .iter_mut()
            .find(|o| &o.label == quality)
        {
            option.url = Some(url.to_string());
        }
        Ok(url)
    }

    /// Loads `url` while remembering where to put the playhead once the new
    /// metadata is in.
    fn swap_source(&mut self, url: Url, restore_at: f64, resume_playing: bool) {
        if self.loaded_src.as_ref() == Some(&url) {
            return;
        }
        self.set_state(PlaybackState::SwitchingQuality {
            restore_at,
            resume_playing,
        });
        self.load_url(url);
    }

    // ----- quality ---------------------------------------------------------

    /// User picked a quality from the settings menu.
    ///
    /// The label and stored preference change immediately. If the stream
    /// request fails the old source keeps playing and the user is told; the
    /// label is not rolled back.
    pub async fn handle_quality_change(&mut self, label: QualityLabel) {
        if label == self.session.quality && self.session.active_src.is_some() {
            return;
        }

        // The element's own clock restarts at zero when a load fails, so the
        // session time is the position to come back to.
        let (restore_at, resume_playing) = match &self.session.state {
            PlaybackState::SwitchingQuality {
                restore_at,
                resume_playing,
            } => (*restore_at, *resume_playing),
            PlaybackState::Error { .. } => (self.session.current_time, self.resume_after_error),
            state => (self.session.current_time, state.is_playing_or_will_resume()),
        };

        if let Err(e) = self.preferences.save_quality(&label) {
            tracing::warn!(error = %e, "Could not persist quality preference");
        }
        self.session.quality = label.clone();
        self.outbox.push(PlayerOutput::QualityChanged {
            quality: label.clone(),
        });

        match self.fetch_stream_url(&label).await {
            Ok(url) => {
                tracing::info!(quality = %label, restore_at, resume_playing, "Switching quality");
                self.swap_source(url, restore_at, resume_playing);
            }
            Err(e) => {
                tracing::warn!(quality = %label, error = %e, "Quality switch failed");
                self.notify(PlaybackNotice::warning(format!(
                    "Could not switch to {}",
                    label
                )));
            }
        }
    }

    /// Recovery path for a media error: retry on the default quality.
    ///
    /// Already on the default quality means there is nothing left to fall
    /// back to, so nothing is requested. The user only hears about it when
    /// that default stream was itself the fallback.
    pub async fn handle_player_error(&mut self, message: &str) {
        let default = self.config.default_quality.clone();
        if self.session.quality == default {
            tracing::error!(quality = %default, message, "Playback failed on default quality");
            if std::mem::take(&mut self.fallback_in_flight) {
                self.notify(PlaybackNotice::error("Playback failed"));
            }
            return;
        }

        let restore_at = self.session.current_time;
        tracing::warn!(quality = %self.session.quality, message, "Playback error, falling back");

        match self.fetch_stream_url(&default).await {
            Ok(url) => {
                self.session.quality = default.clone();
                self.outbox
                    .push(PlayerOutput::QualityChanged { quality: default });
                self.fallback_in_flight = true;
                self.swap_source(url, restore_at, true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Fallback stream unavailable");
                self.notify(PlaybackNotice::error("Playback failed"));
            }
        }
    }

    // ----- media events ----------------------------------------------------

    pub async fn handle_media_event(&mut self, event: MediaEvent, now: Instant) {
        self.clock = now;
        let previous = self.session.state.clone();
        if let Some(next) = previous.next(&event) {
            self.set_state(next);
        }

        match event {
            MediaEvent::LoadedMetadata { duration } => {
                self.session.duration = duration;
                self.fallback_in_flight = false;
                if let PlaybackState::SwitchingQuality {
                    restore_at,
                    resume_playing,
                } = previous
                {
                    self.restore_after_switch(restore_at, resume_playing);
                } else if let Some(position) = self.pending_resume.take() {
                    self.seek(position, SeekOrigin::Resume);
                }
            }
            MediaEvent::TimeUpdate { current_time } => {
                if previous.is_switching_quality() {
                    return;
                }
                self.session.current_time = self.clamp_time(current_time);
                if let Some(t) = self.time_throttle.offer(self.session.current_time, now) {
                    self.publish_time(t);
                }
            }
            MediaEvent::Pause => {
                if let Some(t) = self.time_throttle.flush(now) {
                    self.publish_time(t);
                }
                if !previous.is_switching_quality() {
                    self.save_progress();
                }
            }
            MediaEvent::Ended => {
                if let Some(t) = self.time_throttle.flush(now) {
                    self.publish_time(t);
                }
                self.save_progress();
            }
            MediaEvent::Error { message } => {
                self.handle_player_error(&message).await;
            }
            MediaEvent::LoadStart | MediaEvent::Play | MediaEvent::Playing | MediaEvent::Waiting => {}
        }
    }

    /// Feeds events the element raised synchronously back through
    /// `handle_media_event` until it goes quiet.
    pub async fn pump_element(&mut self, now: Instant) {
        loop {
            let events = self.element.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.handle_media_event(event, now).await;
            }
        }
    }

    /// Advances a simulated element's clock and processes what it reports.
    pub async fn advance_clock(&mut self, elapsed: f64, now: Instant) {
        self.clock = now;
        self.element.tick(elapsed);
        self.pump_element(now).await;
        self.controls.tick(now);
    }

    fn restore_after_switch(&mut self, restore_at: f64, resume_playing: bool) {
        let target = self.clamp_time(restore_at);
        self.element.set_current_time(target);
        self.session.current_time = target;
        self.time_throttle.mark(self.clock);
        self.publish_time(target);
        if resume_playing {
            self.element.play();
        }
    }

    fn clamp_time(&self, t: f64) -> f64 {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        if self.session.has_duration() {
            t.min(self.session.duration)
        } else {
            t
        }
    }

    // ----- transport -------------------------------------------------------

    pub fn play(&mut self) {
        match &mut self.session.state {
            PlaybackState::SwitchingQuality { resume_playing, .. } => *resume_playing = true,
            _ => self.element.play(),
        }
    }

    pub fn pause(&mut self) {
        match &mut self.session.state {
            PlaybackState::SwitchingQuality { resume_playing, .. } => *resume_playing = false,
            _ => {
                self.element.pause();
                self.save_progress();
            }
        }
    }

    /// Play/pause. Pausing saves progress in the background.
    pub fn toggle_play(&mut self) {
        if self.session.state.is_playing_or_will_resume() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, time: f64, origin: SeekOrigin) {
        let target = self.clamp_time(time);

        if let PlaybackState::SwitchingQuality { restore_at, .. } = &mut self.session.state {
            *restore_at = target;
            self.session.current_time = target;
            return;
        }

        tracing::debug!(target, ?origin, "Seek");
        self.element.set_current_time(target);
        self.session.current_time = target;
        self.time_throttle.mark(self.clock);
        self.publish_time(target);

        if origin == SeekOrigin::External && self.element.is_paused() {
            self.element.play();
        }
    }

    pub fn seek_by(&mut self, delta: f64, origin: SeekOrigin) {
        self.seek(self.session.current_time + delta, origin);
    }

    pub fn begin_scrub(&mut self, now: Instant) {
        self.clock = now;
        self.scrubbing = true;
        self.controls.set_dragging(true, now);
    }

    /// Scrub-bar position as a fraction of the duration.
    pub fn scrub_to(&mut self, fraction: f64) {
        if !self.session.has_duration() {
            return;
        }
        let target = fraction.clamp(0.0, 1.0) * self.session.duration;
        self.seek(target, SeekOrigin::Scrub);
    }

    pub fn end_scrub(&mut self, now: Instant) {
        self.clock = now;
        if !self.scrubbing {
            return;
        }
        self.scrubbing = false;
        self.controls.set_dragging(false, now);
        self.save_progress();
    }

    // ----- volume, rate, display modes -------------------------------------

    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() {
            (volume.clamp(0.0, 1.0) * 100.0).round() / 100.0
        } else {
            return;
        };
        self.session.volume = volume;
        self.element.set_volume(volume);
        if self.session.muted && volume > 0.0 {
            self.session.muted = false;
            self.element.set_muted(false);
        }
    }

    pub fn toggle_mute(&mut self) {
        if self.session.muted {
            self.session.muted = false;
            if self.session.volume == 0.0 {
                self.session.volume = self.volume_before_mute.max(self.config.volume_step);
                self.element.set_volume(self.session.volume);
            }
        } else {
            self.volume_before_mute = self.session.volume;
            self.session.muted = true;
        }
        self.element.set_muted(self.session.muted);
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        if !rate.is_finite() {
            return;
        }
        let rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        self.session.playback_rate = rate;
        self.element.set_playback_rate(rate);
    }

    pub fn toggle_fullscreen(&mut self) {
        self.session.fullscreen = !self.session.fullscreen;
        self.element.set_fullscreen(self.session.fullscreen);
    }

    pub fn toggle_picture_in_picture(&mut self) {
        self.session.picture_in_picture = !self.session.picture_in_picture;
        self.element
            .set_picture_in_picture(self.session.picture_in_picture);
    }

    /// Theater mode is a page layout concern; the controller only tracks it
    /// and tells the page.
    pub fn toggle_theater(&mut self) {
        self.session.theater = !self.session.theater;
        self.outbox.push(PlayerOutput::TheaterToggled {
            enabled: self.session.theater,
        });
    }

    // ----- keyboard and pointer --------------------------------------------

    /// Returns whether the key was consumed as a player shortcut.
    pub fn handle_key(&mut self, input: &KeyInput, now: Instant) -> bool {
        let Some(shortcut) = shortcut_for(input, &self.config) else {
            return false;
        };
        self.clock = now;
        self.controls.pointer_moved(now);

        match shortcut {
            Shortcut::TogglePlay => self.toggle_play(),
            Shortcut::ToggleMute => self.toggle_mute(),
            Shortcut::ToggleFullscreen => self.toggle_fullscreen(),
            Shortcut::ToggleTheater => self.toggle_theater(),
            Shortcut::TogglePictureInPicture => self.toggle_picture_in_picture(),
            Shortcut::SeekBy(delta) => self.seek_by(delta, SeekOrigin::Keyboard),
            Shortcut::VolumeBy(delta) => self.set_volume(self.session.volume + delta),
            Shortcut::SeekToFraction(fraction) => {
                if self.session.has_duration() {
                    self.seek(fraction * self.session.duration, SeekOrigin::Keyboard);
                }
            }
        }
        true
    }

    pub fn pointer_moved(&mut self, now: Instant) {
        self.clock = now;
        self.controls.pointer_moved(now);
    }

    pub fn set_settings_open(&mut self, open: bool, now: Instant) {
        self.clock = now;
        self.controls.set_settings_open(open, now);
    }

    /// Re-evaluates the auto-hide timer; returns whether controls are shown.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.clock = now;
        self.controls.tick(now)
    }

    // ----- watch progress --------------------------------------------------

    fn progress_snapshot(&self) -> Option<WatchProgress> {
        if !self.session.has_duration() {
            return None;
        }
        Some(WatchProgress {
            video_id: self.session.video_id.clone(),
            progress_seconds: self.session.current_time,
            total_duration: self.session.duration,
        })
    }

    /// Pushes progress to the backend without waiting for it. Failures are
    /// logged and otherwise ignored. A position already sent is not resent,
    /// so a pause command and the pause event it causes save once.
    pub fn save_progress(&mut self) {
        let Some(progress) = self.progress_snapshot() else {
            return;
        };
        if self.last_saved.as_ref() == Some(&progress) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime, skipping progress save");
            return;
        };

        self.last_saved = Some(progress.clone());
        let api = Arc::clone(&self.api);
        self.pending_saves.retain(|h| !h.is_finished());
        self.pending_saves.push(runtime.spawn(async move {
            if let Err(e) = api.save_watch_progress(&progress).await {
                tracing::debug!(video_id = %progress.video_id, error = %e, "Progress save failed");
            }
        }));
    }

    fn flush_progress(&mut self) {
        if self.session.has_duration() && self.session.current_time > 0.0 {
            self.save_progress();
        }
    }

    /// Waits for background progress saves to finish.
    pub async fn settle_saves(&mut self) {
        for handle in self.pending_saves.drain(..) {
            let _ = handle.await;
        }
    }

    pub fn progress_ticket(&self) -> EffectTicket {
        self.progress_generation.ticket()
    }

    /// Applies fetched progress if it is still for the current video and worth
    /// resuming. Returns the resume position.
    pub fn apply_progress(
        &mut self,
        ticket: EffectTicket,
        result: Result<Option<WatchProgress>>,
    ) -> Option<f64> {
        if !self.progress_generation.is_current(ticket) {
            tracing::debug!("Discarding stale watch progress");
            return None;
        }
        let progress = match result {
            Ok(Some(progress)) => progress,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "Watch progress unavailable");
                return None;
            }
        };
        if progress.video_id != self.session.video_id {
            return None;
        }
        let position = progress.resume_position()?;

        tracing::info!(video_id = %progress.video_id, position, "Resuming from saved progress");
        if self.session.has_duration() {
            self.seek(position, SeekOrigin::Resume);
        } else {
            self.pending_resume = Some(position);
        }
        Some(position)
    }

    pub async fn resume_from_saved_progress(&mut self) -> Option<f64> {
        let ticket = self.progress_ticket();
        let result = self.api.get_watch_progress(&self.session.video_id).await;
        self.apply_progress(ticket, result)
    }

    /// Final save and teardown; later throttled updates are dropped.
    pub async fn shutdown(&mut self) {
        self.flush_progress();
        self.time_throttle.cancel();
        self.progress_generation.invalidate();
        self.settle_saves().await;
    }
}
