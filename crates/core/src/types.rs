use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound (exclusive) of the watched fraction that makes a resume worthwhile.
pub const RESUME_MIN_FRACTION: f64 = 0.05;
/// Upper bound (exclusive); past this the video counts as finished.
pub const RESUME_MAX_FRACTION: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-facing quality label such as `auto`, `1080p` or `MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityLabel(pub String);

impl QualityLabel {
    pub const AUTO: &'static str = "auto";
    /// Highest tier; also the fallback target when a stream fails.
    pub const MAX: &'static str = "MAX";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn auto() -> Self {
        Self::new(Self::AUTO)
    }

    pub fn max() -> Self {
        Self::new(Self::MAX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_auto(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::AUTO)
    }

    pub fn is_max(&self) -> bool {
        self.0 == Self::MAX
    }
}

impl Default for QualityLabel {
    fn default() -> Self {
        Self::auto()
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityOption {
    pub label: QualityLabel,
    /// Absolute stream URL, once the backend has resolved it.
    #[serde(default)]
    pub url: Option<String>,
}

impl QualityOption {
    pub fn unresolved(label: impl Into<String>) -> Self {
        Self {
            label: QualityLabel::new(label),
            url: None,
        }
    }
}

/// Builds the selectable option list. `auto` is always present, first.
pub fn quality_options(available: &[String]) -> Vec<QualityOption> {
    let mut options = vec![QualityOption::unresolved(QualityLabel::AUTO)];
    for label in available {
        if label.eq_ignore_ascii_case(QualityLabel::AUTO) {
            continue;
        }
        if options.iter().any(|o| o.label.as_str() == label) {
            continue;
        }
        options.push(QualityOption::unresolved(label.clone()));
    }
    options
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawStreaming {
    #[serde(default, rename = "selectedPlaybackUrl")]
    selected_playback_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawStreamMeta {
    #[serde(default, rename = "playbackUrl")]
    playback_url: Option<String>,
    #[serde(default)]
    streaming: Option<RawStreaming>,
    #[serde(default, rename = "availableQualities")]
    available_qualities: Vec<String>,
}

/// Stream metadata as returned by the backend for a `(video, quality)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStreamMeta")]
pub struct StreamMeta {
    pub playback_url: Option<String>,
    pub available_qualities: Vec<String>,
}

impl From<RawStreamMeta> for StreamMeta {
    fn from(raw: RawStreamMeta) -> Self {
        let playback_url = raw
            .playback_url
            .filter(|u| !u.is_empty())
            .or_else(|| raw.streaming.and_then(|s| s.selected_playback_url))
            .filter(|u| !u.is_empty());

        Self {
            playback_url,
            available_qualities: raw.available_qualities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    pub video_id: VideoId,
    #[serde(alias = "progress")]
    pub progress_seconds: f64,
    #[serde(alias = "duration")]
    pub total_duration: f64,
}

impl WatchProgress {
    /// Position to resume from, if the saved progress is neither trivial nor finished.
    pub fn resume_position(&self) -> Option<f64> {
        if !(self.total_duration > 0.0) || !self.progress_seconds.is_finite() {
            return None;
        }
        let fraction = self.progress_seconds / self.total_duration;
        if fraction > RESUME_MIN_FRACTION && fraction < RESUME_MAX_FRACTION {
            Some(self.progress_seconds)
        } else {
            None
        }
    }
}

/// Canonical transcript cue, produced by `sync::transcript::normalize_cues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub id: String,
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub start_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(alias = "startSeconds", alias = "start")]
    pub start_seconds: f64,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(progress_seconds: f64, total_duration: f64) -> WatchProgress {
        WatchProgress {
            video_id: VideoId::new("v1"),
            progress_seconds,
            total_duration,
        }
    }

    #[test]
    fn resume_applies_mid_video() {
        assert_eq!(progress(40.0, 100.0).resume_position(), Some(40.0));
    }

    #[test]
    fn resume_skipped_near_start_and_end() {
        assert_eq!(progress(2.0, 100.0).resume_position(), None);
        assert_eq!(progress(5.0, 100.0).resume_position(), None);
        assert_eq!(progress(96.0, 100.0).resume_position(), None);
        assert_eq!(progress(10.0, 0.0).resume_position(), None);
    }

    #[test]
    fn stream_meta_prefers_top_level_url() {
        let meta: StreamMeta = serde_json::from_str(
            r#"{"playbackUrl":"/s/a.m3u8","streaming":{"selectedPlaybackUrl":"/s/b.m3u8"}}"#,
        )
        .unwrap();
        assert_eq!(meta.playback_url.as_deref(), Some("/s/a.m3u8"));
    }

    #[test]
    fn stream_meta_falls_back_to_streaming_block() {
        let meta: StreamMeta = serde_json::from_str(
            r#"{"streaming":{"selectedPlaybackUrl":"/s/b.m3u8"},"availableQualities":["720p","MAX"]}"#,
        )
        .unwrap();
        assert_eq!(meta.playback_url.as_deref(), Some("/s/b.m3u8"));
        assert_eq!(meta.available_qualities, vec!["720p", "MAX"]);
    }

    #[test]
    fn quality_options_always_lead_with_auto() {
        let options = quality_options(&["1080p".into(), "auto".into(), "MAX".into()]);
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["auto", "1080p", "MAX"]);

        let empty = quality_options(&[]);
        assert_eq!(empty.len(), 1);
        assert!(empty[0].label.is_auto());
    }

    #[test]
    fn watch_progress_accepts_short_field_names() {
        let p: WatchProgress =
            serde_json::from_str(r#"{"videoId":"v9","progress":12.5,"duration":300}"#).unwrap();
        assert_eq!(p.progress_seconds, 12.5);
        assert_eq!(p.total_duration, 300.0);
    }
}
