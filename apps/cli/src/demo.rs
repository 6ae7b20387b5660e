use reelsync_core::{MemoryWatchApi, VideoId};
use serde_json::json;

const LINES: &[&str] = &[
    "Welcome back, today we pick up where the last session stopped.",
    "First a quick recap of the previous example.",
    "Notice how the state only changes in one place.",
    "Let's open the editor and look at the handler.",
    "This branch covers the empty input case.",
    "Now run it again and watch the output.",
    "Here is where most people get tripped up.",
    "The fix is smaller than you would expect.",
    "Let's move on to the second part.",
    "That's it for this section, questions are in the notes.",
];

/// Seconds between demo cues.
const CUE_SPACING: f64 = 4.0;

/// In-memory backend with three renditions and a transcript spanning
/// `duration` seconds.
pub fn demo_backend(video_id: &VideoId, duration: f64) -> MemoryWatchApi {
    let count = (duration / CUE_SPACING).floor().max(1.0) as usize;
    let items: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "id": format!("demo-{}", i),
                "text": LINES[i % LINES.len()],
                "startMs": (i as f64 * CUE_SPACING * 1000.0) as u64,
            })
        })
        .collect();

    let id = video_id.as_str();
    MemoryWatchApi::new()
        .with_stream(video_id, "auto", &format!("/media/{}/auto.m3u8", id))
        .with_stream(video_id, "720p", &format!("/media/{}/720.mp4", id))
        .with_stream(video_id, "MAX", &format!("/media/{}/max.mp4", id))
        .with_transcript(video_id, json!({ "items": items }))
}
