use crate::types::{Chapter, TranscriptCue};

/// Format seconds as MM:SS, or H:MM:SS past the hour
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format transcript cues with timestamps, one per line
pub fn format_cues_with_timestamps(cues: &[TranscriptCue]) -> String {
    cues.iter()
        .map(|cue| format!("[{}] {}", format_timestamp(cue.start_s), cue.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_chapter_strip(chapters: &[Chapter], active: Option<usize>) -> String {
    let mut output = String::new();
    for (i, chapter) in chapters.iter().enumerate() {
        let marker = if Some(i) == active { '▶' } else { ' ' };
        output.push_str(&format!(
            "{} [{}] {}\n",
            marker,
            format_timestamp(chapter.start_seconds),
            chapter.title
        ));
    }
    output
}
