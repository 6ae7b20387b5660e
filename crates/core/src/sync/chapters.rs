use crate::types::{Chapter, TranscriptCue};

pub const DEFAULT_MAX_CHAPTERS: usize = 8;
/// Derived chapter titles are cut to this many characters.
pub const DERIVED_TITLE_CHARS: usize = 60;

/// Samples every `floor(n / max_chapters)`-th cue (at least every cue) and
/// keeps at most `max_chapters` of them.
pub fn derive_chapters(
    cues: &[TranscriptCue],
    max_chapters: usize,
    poster: Option<&str>,
) -> Vec<Chapter> {
    if cues.is_empty() || max_chapters == 0 {
        return Vec::new();
    }
    let stride = (cues.len() / max_chapters).max(1);

    cues.iter()
        .step_by(stride)
        .take(max_chapters)
        .map(|cue| Chapter {
            title: derived_title(&cue.text),
            start_seconds: cue.start_s,
            thumbnail: poster.map(str::to_string),
        })
        .collect()
}

fn derived_title(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= DERIVED_TITLE_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DERIVED_TITLE_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// Backend chapters win when present; otherwise they are derived from cues.
pub fn resolve_chapters(
    explicit: Option<&[Chapter]>,
    cues: &[TranscriptCue],
    max_chapters: usize,
    poster: Option<&str>,
) -> Vec<Chapter> {
    match explicit {
        Some(chapters) if !chapters.is_empty() => {
            let mut chapters = chapters.to_vec();
            chapters.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
            for chapter in &mut chapters {
                if chapter.thumbnail.is_none() {
                    chapter.thumbnail = poster.map(str::to_string);
                }
            }
            chapters
        }
        _ => derive_chapters(cues, max_chapters, poster),
    }
}

/// Last chapter starting at or before `current_time`; the first chapter
/// when playback is before all of them. `None` only for an empty list.
pub fn active_chapter_index(chapters: &[Chapter], current_time: f64) -> Option<usize> {
    if chapters.is_empty() {
        return None;
    }
    Some(
        chapters
            .iter()
            .enumerate()
            .fold(0, |active, (i, chapter)| {
                if chapter.start_seconds <= current_time {
                    i
                } else {
                    active
                }
            }),
    )
}

/// Horizontal scroll position of the chapter strip.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterStrip {
    scroll_left: f64,
    content_width: f64,
    viewport_width: f64,
    step_px: f64,
}

impl ChapterStrip {
    pub fn new(step_px: f64) -> Self {
        Self {
            scroll_left: 0.0,
            content_width: 0.0,
            viewport_width: 0.0,
            step_px,
        }
    }

    pub fn set_dimensions(&mut self, content_width: f64, viewport_width: f64) {
        self.content_width = content_width.max(0.0);
        self.viewport_width = viewport_width.max(0.0);
        self.scroll_left = self.scroll_left.clamp(0.0, self.max_scroll());
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    fn max_scroll(&self) -> f64 {
        (self.content_width - self.viewport_width).max(0.0)
    }

    pub fn can_scroll_back(&self) -> bool {
        self.scroll_left > 0.0
    }

    pub fn can_scroll_forward(&self) -> bool {
        self.scroll_left < self.max_scroll()
    }

    /// Moves by one step in `direction` (negative = back); returns the new
    /// offset, which the host animates to smoothly.
    pub fn scroll_by(&mut self, direction: f64) -> f64 {
        let delta = direction.signum() * self.step_px;
        self.scroll_left = (self.scroll_left + delta).clamp(0.0, self.max_scroll());
        self.scroll_left
    }
}

/// State behind the chapter strip.
pub struct ChapterPanel {
    chapters: Vec<Chapter>,
    active: Option<usize>,
    strip: ChapterStrip,
}

impl ChapterPanel {
    pub fn new(chapters: Vec<Chapter>, step_px: f64) -> Self {
        let active = active_chapter_index(&chapters, 0.0);
        Self {
            chapters,
            active,
            strip: ChapterStrip::new(step_px),
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn set_chapters(&mut self, chapters: Vec<Chapter>) {
        self.active = active_chapter_index(&chapters, 0.0);
        self.chapters = chapters;
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_chapter(&self) -> Option<&Chapter> {
        self.active.and_then(|i| self.chapters.get(i))
    }

    pub fn strip(&self) -> &ChapterStrip {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut ChapterStrip {
        &mut self.strip
    }

    /// Returns the new active index when it changed.
    pub fn on_time(&mut self, current_time: f64) -> Option<usize> {
        let active = active_chapter_index(&self.chapters, current_time);
        if active == self.active {
            return None;
        }
        self.active = active;
        active
    }

    /// Seek target for a clicked chapter.
    pub fn click(&self, index: usize) -> Option<f64> {
        self.chapters.get(index).map(|c| c.start_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cues(n: usize) -> Vec<TranscriptCue> {
        (0..n)
            .map(|i| TranscriptCue {
                id: format!("c{}", i),
                text: format!("cue number {}", i),
                start_ms: i as u64 * 3000,
                end_ms: i as u64 * 3000 + 2000,
                start_s: i as f64 * 3.0,
            })
            .collect()
    }

    fn chapter(title: &str, start_seconds: f64) -> Chapter {
        Chapter {
            title: title.to_string(),
            start_seconds,
            thumbnail: None,
        }
    }

    #[test]
    fn eighty_cues_yield_eight_chapters_at_stride_ten() {
        let chapters = derive_chapters(&cues(80), DEFAULT_MAX_CHAPTERS, Some("/poster.jpg"));
        assert_eq!(chapters.len(), 8);
        let starts: Vec<f64> = chapters.iter().map(|c| c.start_seconds).collect();
        assert_eq!(
            starts,
            vec![0.0, 30.0, 60.0, 90.0, 120.0, 150.0, 180.0, 210.0]
        );
        assert_eq!(chapters[1].title, "cue number 10");
        assert_eq!(chapters[0].thumbnail.as_deref(), Some("/poster.jpg"));
    }

    #[test]
    fn few_cues_use_every_cue() {
        let chapters = derive_chapters(&cues(5), DEFAULT_MAX_CHAPTERS, None);
        assert_eq!(chapters.len(), 5);
        assert!(derive_chapters(&[], DEFAULT_MAX_CHAPTERS, None).is_empty());
    }

    #[test]
    fn uneven_counts_are_capped_at_max() {
        let chapters = derive_chapters(&cues(85), DEFAULT_MAX_CHAPTERS, None);
        assert_eq!(chapters.len(), 8);
        assert_eq!(chapters[7].start_seconds, 210.0);
    }

    #[test]
    fn long_cue_text_is_truncated() {
        let mut long = cues(1);
        long[0].text = "word ".repeat(30);
        let chapters = derive_chapters(&long, 8, None);
        assert!(chapters[0].title.ends_with('…'));
        assert!(chapters[0].title.chars().count() <= DERIVED_TITLE_CHARS + 1);
    }

    #[test]
    fn explicit_chapters_take_precedence() {
        let explicit = vec![chapter("Outro", 200.0), chapter("Intro", 0.0)];
        let resolved = resolve_chapters(Some(&explicit), &cues(80), 8, Some("/p.jpg"));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].title, "Intro");
        assert_eq!(resolved[1].thumbnail.as_deref(), Some("/p.jpg"));

        let derived = resolve_chapters(Some(&[]), &cues(16), 8, None);
        assert_eq!(derived.len(), 8);
    }

    #[test]
    fn active_chapter_is_last_started() {
        let chapters = vec![chapter("a", 10.0), chapter("b", 60.0), chapter("c", 120.0)];
        assert_eq!(active_chapter_index(&chapters, 0.0), Some(0));
        assert_eq!(active_chapter_index(&chapters, 60.0), Some(1));
        assert_eq!(active_chapter_index(&chapters, 119.9), Some(1));
        assert_eq!(active_chapter_index(&chapters, 500.0), Some(2));
        assert_eq!(active_chapter_index(&[], 5.0), None);
    }

    #[test]
    fn panel_reports_only_changes() {
        let mut panel = ChapterPanel::new(vec![chapter("a", 0.0), chapter("b", 30.0)], 220.0);
        assert_eq!(panel.active_index(), Some(0));
        assert_eq!(panel.on_time(10.0), None);
        assert_eq!(panel.on_time(31.0), Some(1));
        assert_eq!(panel.on_time(40.0), None);
        assert_eq!(panel.click(1), Some(30.0));
        assert_eq!(panel.click(9), None);
    }

    #[test]
    fn strip_scrolls_in_fixed_steps_within_bounds() {
        let mut strip = ChapterStrip::new(220.0);
        strip.set_dimensions(1000.0, 400.0);
        assert!(!strip.can_scroll_back());

        assert_eq!(strip.scroll_by(1.0), 220.0);
        assert_eq!(strip.scroll_by(1.0), 440.0);
        assert_eq!(strip.scroll_by(1.0), 600.0);
        assert!(!strip.can_scroll_forward());

        assert_eq!(strip.scroll_by(-1.0), 380.0);
        strip.set_dimensions(500.0, 400.0);
        assert_eq!(strip.scroll_left(), 100.0);
    }
}
