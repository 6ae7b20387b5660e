//! Playback state machine.
//!
//! One enum replaces the loose `playing`/`buffering`/`switching`/`ended`
//! flags a media element exposes, so impossible combinations (playing and
//! ended at once) cannot be represented:
//! - Idle: no source yet
//! - Loading: source set, metadata not yet available
//! - Playing / Paused: steady states
//! - Buffering: playback wanted but stalled waiting for data
//! - SwitchingQuality: a new source is loading and the playhead must be restored
//! - Ended: reached the end of the media
//! - Error: the element reported an error that was not recovered

use serde::Serialize;

use crate::media::MediaEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Buffering,
    /// Carries the position and play intent captured when the switch began.
    SwitchingQuality {
        restore_at: f64,
        resume_playing: bool,
    },
    Ended,
    Error {
        message: String,
    },
}

impl PlaybackState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::SwitchingQuality { .. } => "switching_quality",
            Self::Ended => "ended",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_buffering(&self) -> bool {
        matches!(self, Self::Buffering)
    }

    pub fn is_switching_quality(&self) -> bool {
        matches!(self, Self::SwitchingQuality { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// True when playback is running or will continue once data or a new
    /// source arrives.
    pub fn is_playing_or_will_resume(&self) -> bool {
        match self {
            Self::Playing | Self::Buffering => true,
            Self::SwitchingQuality { resume_playing, .. } => *resume_playing,
            _ => false,
        }
    }

    /// Spinner shown over the video: buffering and quality switching are
    /// rendered differently, so they are reported separately.
    pub fn spinner(&self) -> Spinner {
        match self {
            Self::Loading | Self::Buffering => Spinner::Buffering,
            Self::SwitchingQuality { .. } => Spinner::SwitchingQuality,
            _ => Spinner::None,
        }
    }

    /// Transition table over native media events.
    ///
    /// Returns `None` when the event leaves the state unchanged.
    pub fn next(&self, event: &MediaEvent) -> Option<PlaybackState> {
        use MediaEvent as E;
        use PlaybackState as S;

        let next = match (self, event) {
            // A source swap owns the element until its metadata arrives; the
            // pause and time events the swap itself produces are noise.
            (S::SwitchingQuality { resume_playing, .. }, E::LoadedMetadata { .. }) => {
                if *resume_playing {
                    S::Buffering
                } else {
                    S::Paused
                }
            }
            (S::SwitchingQuality { .. }, E::Error { message }) => S::Error {
                message: message.clone(),
            },
            (S::SwitchingQuality { .. }, _) => return None,

            (_, E::Error { message }) => S::Error {
                message: message.clone(),
            },
            (_, E::Ended) => S::Ended,
            (_, E::LoadStart) => S::Loading,

            (S::Loading, E::LoadedMetadata { .. }) => S::Paused,
            (S::Idle | S::Loading | S::Paused | S::Ended, E::Play) => S::Buffering,
            (_, E::Playing) => S::Playing,
            (S::Playing, E::Waiting) => S::Buffering,
            (S::Playing | S::Buffering, E::Pause) => S::Paused,

            _ => return None,
        };

        if &next == self { None } else { Some(next) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Spinner {
    None,
    Buffering,
    SwitchingQuality,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(start: PlaybackState, events: &[MediaEvent]) -> PlaybackState {
        events.iter().fold(start, |state, event| {
            state.next(event).unwrap_or(state)
        })
    }

    #[test]
    fn normal_lifecycle_reaches_ended() {
        let state = run(
            PlaybackState::Idle,
            &[
                MediaEvent::LoadStart,
                MediaEvent::LoadedMetadata { duration: 10.0 },
                MediaEvent::Play,
                MediaEvent::Playing,
                MediaEvent::Pause,
                MediaEvent::Play,
                MediaEvent::Playing,
                MediaEvent::Ended,
            ],
        );
        assert_eq!(state, PlaybackState::Ended);
    }

    #[test]
    fn play_enters_buffering_until_playing() {
        let state = run(
            PlaybackState::Paused,
            &[MediaEvent::Play],
        );
        assert!(state.is_buffering());
        assert_eq!(state.spinner(), Spinner::Buffering);
        assert!(state.is_playing_or_will_resume());
    }

    #[test]
    fn waiting_reenters_buffering_and_playing_exits() {
        let stalled = PlaybackState::Playing
            .next(&MediaEvent::Waiting)
            .unwrap();
        assert_eq!(stalled, PlaybackState::Buffering);
        assert_eq!(
            stalled.next(&MediaEvent::Playing),
            Some(PlaybackState::Playing)
        );
    }

    #[test]
    fn waiting_while_paused_is_ignored() {
        assert_eq!(PlaybackState::Paused.next(&MediaEvent::Waiting), None);
    }

    #[test]
    fn time_updates_never_change_state() {
        for state in [
            PlaybackState::Idle,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Buffering,
            PlaybackState::Ended,
        ] {
            assert_eq!(state.next(&MediaEvent::TimeUpdate { current_time: 1.0 }), None);
        }
    }

    #[test]
    fn switching_quality_ignores_noise_until_metadata() {
        let switching = PlaybackState::SwitchingQuality {
            restore_at: 42.0,
            resume_playing: true,
        };
        assert_eq!(switching.next(&MediaEvent::LoadStart), None);
        assert_eq!(switching.next(&MediaEvent::Pause), None);
        assert_eq!(
            switching.next(&MediaEvent::TimeUpdate { current_time: 0.0 }),
            None
        );
        assert_eq!(
            switching.next(&MediaEvent::LoadedMetadata { duration: 100.0 }),
            Some(PlaybackState::Buffering)
        );
        assert_eq!(switching.spinner(), Spinner::SwitchingQuality);

        let paused_switch = PlaybackState::SwitchingQuality {
            restore_at: 42.0,
            resume_playing: false,
        };
        assert_eq!(
            paused_switch.next(&MediaEvent::LoadedMetadata { duration: 100.0 }),
            Some(PlaybackState::Paused)
        );
    }

    #[test]
    fn errors_are_terminal_until_a_new_load() {
        let failed = PlaybackState::Playing
            .next(&MediaEvent::Error {
                message: "decode".into(),
            })
            .unwrap();
        assert_eq!(failed.name(), "error");
        assert_eq!(failed.next(&MediaEvent::Pause), None);
        assert_eq!(
            failed.next(&MediaEvent::LoadStart),
            Some(PlaybackState::Loading)
        );
    }
}
