//! The host's media element, seen from the controller.
//!
//! A browser host backs `MediaElement` with an `HTMLVideoElement`; the CLI and
//! the tests use `SimulatedElement`, which advances on an explicit clock.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ReelsyncError, Result};

/// Events the element reports back, mirroring the native media events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaEvent {
    LoadStart,
    LoadedMetadata { duration: f64 },
    TimeUpdate { current_time: f64 },
    Play,
    Playing,
    Waiting,
    Pause,
    Ended,
    Error { message: String },
}

pub trait MediaElement: Send {
    /// Absolute URL currently loaded, if any.
    fn src(&self) -> Option<&Url>;
    /// Replaces the source and starts loading it.
    fn load(&mut self, src: &Url);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// `NaN` until metadata has loaded.
    fn duration(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
    fn set_playback_rate(&mut self, rate: f64);
    fn set_fullscreen(&mut self, fullscreen: bool);
    fn set_picture_in_picture(&mut self, enabled: bool);

    /// Events raised synchronously by the calls above (`load`, `play`,
    /// seeking). Hosts that deliver events through the bus return nothing.
    fn take_events(&mut self) -> Vec<MediaEvent>;

    /// Wall-clock time passed since the last tick. Native elements keep
    /// their own clock and ignore it.
    fn tick(&mut self, _elapsed: f64) {}
}

/// Resolves a raw `src` (absolute, root-relative or relative) against `base`.
pub fn resolve_src(base: &Url, raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ReelsyncError::InvalidSource {
            src: raw.to_string(),
            reason: "empty source".to_string(),
        });
    }
    base.join(trimmed).map_err(|e| ReelsyncError::InvalidSource {
        src: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Deterministic stand-in for a native element.
///
/// Time only moves through `advance`, which returns the events a browser would
/// have fired over that span.
#[derive(Debug, Clone)]
pub struct SimulatedElement {
    src: Option<Url>,
    media_duration: f64,
    loaded_duration: f64,
    current_time: f64,
    paused: bool,
    volume: f64,
    muted: bool,
    playback_rate: f64,
    fullscreen: bool,
    picture_in_picture: bool,
    pending: Vec<MediaEvent>,
    failing_hosts: Vec<String>,
    load_count: usize,
}

impl SimulatedElement {
    pub fn new(media_duration: f64) -> Self {
        Self {
            src: None,
            media_duration,
            loaded_duration: f64::NAN,
            current_time: 0.0,
            paused: true,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            fullscreen: false,
            picture_in_picture: false,
            pending: Vec::new(),
            failing_hosts: Vec::new(),
            load_count: 0,
        }
    }

    /// Sources whose URL contains `fragment` fail to decode after loading.
    pub fn fail_sources_containing(&mut self, fragment: &str) {
        self.failing_hosts.push(fragment.to_string());
    }

    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_picture_in_picture(&self) -> bool {
        self.picture_in_picture
    }

    /// Moves the playhead by `dt` seconds of wall time.
    pub fn advance(&mut self, dt: f64) -> Vec<MediaEvent> {
        let mut events = self.take_events();
        if self.paused || self.loaded_duration.is_nan() {
            return events;
        }

        self.current_time = (self.current_time + dt * self.playback_rate).min(self.loaded_duration);
        events.push(MediaEvent::TimeUpdate {
            current_time: self.current_time,
        });

        if self.current_time >= self.loaded_duration {
            self.paused = true;
            events.push(MediaEvent::Pause);
            events.push(MediaEvent::Ended);
        }
        events
    }
}

impl MediaElement for SimulatedElement {
    fn src(&self) -> Option<&Url> {
        self.src.as_ref()
    }

    fn load(&mut self, src: &Url) {
        self.src = Some(src.clone());
        self.load_count += 1;
        self.current_time = 0.0;
        self.paused = true;
        self.pending.push(MediaEvent::LoadStart);

        if self
            .failing_hosts
            .iter()
            .any(|fragment| src.as_str().contains(fragment.as_str()))
        {
            self.loaded_duration = f64::NAN;
            self.pending.push(MediaEvent::Error {
                message: "MEDIA_ERR_DECODE".to_string(),
            });
            return;
        }

        self.loaded_duration = self.media_duration;
        self.pending.push(MediaEvent::LoadedMetadata {
            duration: self.media_duration,
        });
    }

    fn play(&mut self) {
        if !self.paused || self.src.is_none() {
            return;
        }
        if self.current_time >= self.loaded_duration {
            self.current_time = 0.0;
        }
        self.paused = false;
        self.pending.push(MediaEvent::Play);
        self.pending.push(MediaEvent::Playing);
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.pending.push(MediaEvent::Pause);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let upper = if self.loaded_duration.is_nan() {
            seconds
        } else {
            self.loaded_duration
        };
        self.current_time = seconds.clamp(0.0, upper.max(0.0));
        self.pending.push(MediaEvent::TimeUpdate {
            current_time: self.current_time,
        });
    }

    fn duration(&self) -> f64 {
        self.loaded_duration
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate;
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    fn set_picture_in_picture(&mut self, enabled: bool) {
        self.picture_in_picture = enabled;
    }

    fn take_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.pending)
    }

    fn tick(&mut self, elapsed: f64) {
        let events = self.advance(elapsed);
        self.pending.extend(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://videos.example.com/watch/abc").unwrap()
    }

    #[test]
    fn relative_sources_resolve_against_base() {
        assert_eq!(
            resolve_src(&base(), "/media/abc/720.mp4").unwrap().as_str(),
            "https://videos.example.com/media/abc/720.mp4"
        );
        assert_eq!(
            resolve_src(&base(), "stream.m3u8").unwrap().as_str(),
            "https://videos.example.com/watch/stream.m3u8"
        );
        assert_eq!(
            resolve_src(&base(), "https://cdn.example.net/a.mp4")
                .unwrap()
                .as_str(),
            "https://cdn.example.net/a.mp4"
        );
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(resolve_src(&base(), "  ").is_err());
    }

    #[test]
    fn simulated_element_plays_to_the_end() {
        let mut el = SimulatedElement::new(3.0);
        el.load(&resolve_src(&base(), "/a.mp4").unwrap());
        el.play();
        let first = el.advance(1.0);
        assert!(first.contains(&MediaEvent::LoadedMetadata { duration: 3.0 }));
        assert!(first.contains(&MediaEvent::Playing));

        let last = el.advance(5.0);
        assert!(last.contains(&MediaEvent::Ended));
        assert_eq!(el.current_time(), 3.0);
        assert!(el.is_paused());
    }

    #[test]
    fn tick_queues_events_for_the_host() {
        let mut el = SimulatedElement::new(10.0);
        el.load(&resolve_src(&base(), "/a.mp4").unwrap());
        el.play();
        el.set_playback_rate(2.0);
        el.tick(1.0);
        let events = el.take_events();
        assert!(events.contains(&MediaEvent::TimeUpdate { current_time: 2.0 }));
        assert!(el.take_events().is_empty());
    }

    #[test]
    fn failing_source_reports_error_instead_of_metadata() {
        let mut el = SimulatedElement::new(10.0);
        el.fail_sources_containing("broken");
        el.load(&Url::parse("https://cdn.example.net/broken/1080.mp4").unwrap());
        let events = el.take_events();
        assert!(matches!(events.last(), Some(MediaEvent::Error { .. })));
        assert!(el.duration().is_nan());
    }
}
