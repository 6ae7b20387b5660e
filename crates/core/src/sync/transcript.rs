//! Transcript cues kept in step with playback.
//!
//! `normalize_cues` is the only code that knows the backend's field-name
//! variants; everything past it works on `TranscriptCue`.

use serde::Serialize;
use serde_json::Value;

use crate::{
    api::WatchApi,
    effects::{EffectGeneration, EffectTicket},
    error::Result,
    types::{TranscriptCue, VideoId},
};

/// End offset assumed when a cue has none.
pub const DEFAULT_CUE_LENGTH_MS: u64 = 2000;

/// Accepts a bare array or an `items` / `cues` envelope.
pub fn normalize_cues(body: &Value) -> Vec<TranscriptCue> {
    let items = match body {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("items")
            .or_else(|| map.get("cues"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let mut cues: Vec<TranscriptCue> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| normalize_cue(i, item))
        .collect();

    cues.sort_by_key(|cue| cue.start_ms);
    cues
}

fn normalize_cue(index: usize, item: &Value) -> Option<TranscriptCue> {
    let map = item.as_object()?;

    let start_ms = millis_field(map, &["startMs", "start_ms"])
        .or_else(|| seconds_field(map, &["start", "startTime", "start_time"]))?;
    let end_ms = millis_field(map, &["endMs", "end_ms"])
        .or_else(|| seconds_field(map, &["end", "endTime", "end_time"]))
        .filter(|end| *end > start_ms)
        .unwrap_or(start_ms + DEFAULT_CUE_LENGTH_MS);

    let text = ["text", "content"]
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string();

    let id = ["id", "_id", "cueId"]
        .iter()
        .find_map(|k| match map.get(*k) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("cue-{}", index));

    Some(TranscriptCue {
        id,
        text,
        start_ms,
        end_ms,
        start_s: start_ms as f64 / 1000.0,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite() && *n >= 0.0)
}

fn millis_field(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(number))
        .map(|ms| ms.round() as u64)
}

fn seconds_field(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(number))
        .map(|s| (s * 1000.0).round() as u64)
}

/// Last cue whose start is at or before `current_ms`.
pub fn active_cue_index(cues: &[TranscriptCue], current_ms: u64) -> Option<usize> {
    let mut active = None;
    for (i, cue) in cues.iter().enumerate() {
        if cue.start_ms <= current_ms {
            active = Some(i);
        } else {
            break;
        }
    }
    active
}

/// Indices of cues whose text contains `query`, ignoring case. An empty
/// query matches everything.
pub fn search_cues(cues: &[TranscriptCue], query: &str) -> Vec<usize> {
    let query = query.trim();
    cues.iter()
        .enumerate()
        .filter(|(_, cue)| query.is_empty() || find_ignore_case(&cue.text, query).is_some())
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub text: String,
    pub highlighted: bool,
}

impl Fragment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
        }
    }
}

/// Splits `text` around the first case-insensitive occurrence of `query`.
///
/// Concatenating the fragments always gives back `text`.
pub fn highlight_match(text: &str, query: &str) -> Vec<Fragment> {
    let query = query.trim();
    if query.is_empty() {
        return vec![Fragment::plain(text)];
    }
    let Some((start, end)) = find_ignore_case(text, query) else {
        return vec![Fragment::plain(text)];
    };

    let mut fragments = Vec::with_capacity(3);
    if start > 0 {
        fragments.push(Fragment::plain(&text[..start]));
    }
    fragments.push(Fragment {
        text: text[start..end].to_string(),
        highlighted: true,
    });
    if end < text.len() {
        fragments.push(Fragment::plain(&text[end..]));
    }
    fragments
}

/// Byte range of the first case-insensitive match, on char boundaries.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    for (start, _) in haystack.char_indices() {
        let mut matched = 0;
        for (offset, c) in haystack[start..].char_indices() {
            for lower in c.to_lowercase() {
                if matched < needle.len() && needle[matched] == lower {
                    matched += 1;
                } else {
                    matched = usize::MAX;
                    break;
                }
            }
            if matched == usize::MAX {
                break;
            }
            if matched == needle.len() {
                return Some((start, start + offset + c.len_utf8()));
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollIntoView {
    pub cue_index: usize,
    pub smooth: bool,
}

/// Outcome of clicking a cue.
#[derive(Debug, Clone, PartialEq)]
pub struct CueClick {
    /// Seconds.
    pub seek_to: f64,
    pub scroll: Option<ScrollIntoView>,
}

/// State behind the transcript panel.
pub struct TranscriptPanel {
    video_id: Option<VideoId>,
    cues: Vec<TranscriptCue>,
    query: String,
    active: Option<usize>,
    auto_scroll: bool,
    generation: EffectGeneration,
}

impl Default for TranscriptPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptPanel {
    pub fn new() -> Self {
        Self {
            video_id: None,
            cues: Vec::new(),
            query: String::new(),
            active: None,
            auto_scroll: true,
            generation: EffectGeneration::new(),
        }
    }

    pub fn with_cues(cues: Vec<TranscriptCue>) -> Self {
        let mut panel = Self::new();
        panel.cues = cues;
        panel
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.video_id.as_ref()
    }

    pub fn cues(&self) -> &[TranscriptCue] {
        &self.cues
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_cue(&self) -> Option<&TranscriptCue> {
        self.active.and_then(|i| self.cues.get(i))
    }

    pub fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Shared handle so an owner can invalidate in-flight loads on teardown.
    pub fn generation(&self) -> EffectGeneration {
        self.generation.clone()
    }

    /// Starts loading a new video's transcript; any earlier load goes stale.
    pub fn begin_load(&mut self, video_id: VideoId) -> EffectTicket {
        self.generation.invalidate();
        self.video_id = Some(video_id);
        self.cues.clear();
        self.active = None;
        self.auto_scroll = true;
        self.generation.ticket()
    }

    /// Applies a finished load. Returns `false` when the ticket was stale.
    ///
    /// A failed fetch leaves the panel empty; it is not an error for the player.
    pub fn finish_load(&mut self, ticket: EffectTicket, result: Result<Value>) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::debug!("Discarding stale transcript load");
            return false;
        }
        match result {
            Ok(body) => {
                self.cues = normalize_cues(&body);
                tracing::debug!(cues = self.cues.len(), "Transcript loaded");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Transcript unavailable");
                self.cues.clear();
            }
        }
        self.active = None;
        true
    }

    pub async fn load(&mut self, api: &dyn WatchApi, video_id: VideoId, limit: usize) -> bool {
        let ticket = self.begin_load(video_id.clone());
        let result = api.get_watch_transcript(&video_id, limit).await;
        self.finish_load(ticket, result)
    }

    /// Recomputes the active cue; asks for a scroll when it moved and
    /// auto-scroll is on.
    pub fn on_time(&mut self, current_time_s: f64) -> Option<ScrollIntoView> {
        let current_ms = (current_time_s.max(0.0) * 1000.0) as u64;
        let active = active_cue_index(&self.cues, current_ms);
        if active == self.active {
            return None;
        }
        self.active = active;

        let cue_index = active?;
        if !self.auto_scroll || !self.is_visible(cue_index) {
            return None;
        }
        Some(ScrollIntoView {
            cue_index,
            smooth: true,
        })
    }

    /// Any user-initiated scroll of the list stops following playback.
    pub fn on_user_scroll(&mut self) {
        self.auto_scroll = false;
    }

    /// Clicking a cue resumes following playback and returns the seek target.
    ///
    /// A click on the cue that is already active will not move the active
    /// index, so the scroll back to it is requested here.
    pub fn click_cue(&mut self, index: usize) -> Option<CueClick> {
        let cue = self.cues.get(index)?;
        self.auto_scroll = true;
        let scroll = (self.active == Some(index)).then_some(ScrollIntoView {
            cue_index: index,
            smooth: true,
        });
        Some(CueClick {
            seek_to: cue.start_s,
            scroll,
        })
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Cue indices shown under the current search.
    pub fn visible_indices(&self) -> Vec<usize> {
        search_cues(&self.cues, &self.query)
    }

    fn is_visible(&self, index: usize) -> bool {
        let query = self.query.trim();
        query.is_empty()
            || self
                .cues
                .get(index)
                .is_some_and(|cue| find_ignore_case(&cue.text, query).is_some())
    }

    pub fn highlighted(&self, index: usize) -> Option<Vec<Fragment>> {
        self.cues
            .get(index)
            .map(|cue| highlight_match(&cue.text, &self.query))
    }
}
