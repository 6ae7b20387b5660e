use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reelsync_core::{
    Chapter, format_chapter_strip, format_timestamp,
    events::{EnrichedEvent, downcast_ref},
    playback::{NoticeLevel, PlaybackState},
    session::events::{
        ChapterActivated, ChaptersResolved, CueActivated, NoticeRaised, PlaybackStateChanged,
        QualityChanged, SourceLoaded, TimeUpdated, TranscriptLoaded,
    },
    workers::WorkerFailed,
};

/// Terminal rendering of the session's outward events.
pub struct PlaybackView {
    bar: ProgressBar,
    chapters: Vec<Chapter>,
}

impl PlaybackView {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>10.cyan.bold} [{bar:40.cyan/blue}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━╸─"),
        );
        bar.set_prefix("idle");
        bar.enable_steady_tick(Duration::from_millis(250));
        Self {
            bar,
            chapters: Vec::new(),
        }
    }

    /// Renders one event; true once playback has ended.
    pub fn apply(&mut self, event: &EnrichedEvent) -> bool {
        if let Some(update) = downcast_ref::<TimeUpdated>(&event.event) {
            if update.duration.is_finite() && update.duration > 0.0 {
                self.bar.set_length((update.duration * 1000.0) as u64);
            }
            self.bar.set_position((update.current_time * 1000.0) as u64);
            self.bar.set_message(format!(
                "{} / {}",
                format_timestamp(update.current_time),
                format_timestamp(update.duration)
            ));
        } else if let Some(changed) = downcast_ref::<PlaybackStateChanged>(&event.event) {
            self.bar.set_prefix(changed.state.name());
            if let PlaybackState::Error { message } = &changed.state {
                self.line(format!("{} {}", style("Media error:").red().bold(), message));
            }
            return changed.state.is_ended();
        } else if let Some(loaded) = downcast_ref::<TranscriptLoaded>(&event.event) {
            self.line(format!(
                "{} Transcript: {} cues",
                style("✓").green().bold(),
                loaded.cues.len()
            ));
        } else if let Some(resolved) = downcast_ref::<ChaptersResolved>(&event.event) {
            self.chapters = resolved.chapters.clone();
            if !self.chapters.is_empty() {
                self.line(format!("{}", style("Chapters").bold()));
                self.line(format_chapter_strip(&self.chapters, None).trim_end().to_string());
            }
        } else if let Some(activated) = downcast_ref::<ChapterActivated>(&event.event) {
            self.line(format!(
                "\n{} {} {}",
                style("§").magenta().bold(),
                style(&activated.chapter.title).bold(),
                style(format!(
                    "({}/{})",
                    activated.index + 1,
                    self.chapters.len().max(activated.index + 1)
                ))
                .dim()
            ));
        } else if let Some(activated) = downcast_ref::<CueActivated>(&event.event) {
            if let Some(cue) = &activated.cue {
                self.line(format!(
                    "  {} {}",
                    style(format!("[{}]", format_timestamp(cue.start_s))).dim(),
                    cue.text.trim()
                ));
            }
        } else if let Some(changed) = downcast_ref::<QualityChanged>(&event.event) {
            self.line(format!(
                "{} Quality: {}",
                style("✓").green().bold(),
                style(changed.quality.as_str()).yellow()
            ));
        } else if let Some(loaded) = downcast_ref::<SourceLoaded>(&event.event) {
            tracing::debug!(src = %loaded.src, "Source loaded");
        } else if let Some(raised) = downcast_ref::<NoticeRaised>(&event.event) {
            let label = match raised.notice.level {
                NoticeLevel::Info => style("Note:").cyan(),
                NoticeLevel::Warning => style("Warning:").yellow(),
                NoticeLevel::Error => style("Error:").red(),
            };
            self.line(format!("{} {}", label.bold(), raised.notice.message));
        } else if let Some(failed) = downcast_ref::<WorkerFailed>(&event.event) {
            self.line(format!(
                "{} {} on {}: {}",
                style("Failed:").red().bold(),
                failed.subscriber_id,
                failed.failed_event_type,
                failed.message
            ));
        }
        false
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    fn line(&self, text: String) {
        self.bar.println(text);
    }
}
