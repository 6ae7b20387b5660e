use std::{sync::Arc, time::Duration};

use reelsync_core::{
    MemoryPreferenceStore, MemoryWatchApi, PlaybackState, PlayerConfig, QualityLabel,
    SimulatedElement, VideoId, WatchApi,
    events::{BusConfig, EnrichedEvent, downcast_ref},
    playback::{Key, KeyInput},
    preferences::PreferenceStore,
    session::{
        SessionHandle, SessionOptions,
        events::{
            ChaptersResolved, CueActivated, PlaybackStateChanged, PlayerCommand, QualityChanged,
            SourceLoaded, TheaterToggled, TimeUpdated, TranscriptCommand, TranscriptLoaded,
        },
        start_session,
    },
    workers::WorkerFailed,
};
use reqwest::Url;
use serde_json::json;
use tokio::time::{Instant, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn video() -> VideoId {
    VideoId::new("lecture-7")
}

fn transcript(n: usize) -> serde_json::Value {
    let items: Vec<_> = (0..n)
        .map(|i| json!({ "id": format!("c{}", i), "text": format!("line {}", i), "startMs": i * 3000 }))
        .collect();
    json!({ "items": items })
}

fn backend() -> MemoryWatchApi {
    MemoryWatchApi::new()
        .with_stream(&video(), "auto", "/media/lecture-7/auto.m3u8")
        .with_stream(&video(), "720p", "/media/lecture-7/720.mp4")
        .with_stream(&video(), "MAX", "/media/lecture-7/max.mp4")
        .with_transcript(&video(), transcript(80))
}

async fn start(api: Arc<MemoryWatchApi>, preferences: MemoryPreferenceStore) -> SessionHandle {
    let config = PlayerConfig {
        base_url: Url::parse("https://videos.example.com/").unwrap(),
        ..PlayerConfig::default()
    };
    let api: Arc<dyn WatchApi> = api;
    start_session(SessionOptions {
        config: Arc::new(config),
        api,
        preferences: Arc::new(preferences),
        element: SimulatedElement::new(300.0),
        video_id: video(),
        chapters: None,
        poster: Some("/posters/lecture-7.jpg".to_string()),
        bus: BusConfig::new(),
    })
    .await
    .unwrap()
}

/// Reads host events until `done` matches one, returning everything seen.
async fn collect_until(
    handle: &mut SessionHandle,
    mut done: impl FnMut(&Arc<EnrichedEvent>) -> bool,
) -> Vec<Arc<EnrichedEvent>> {
    let mut seen = Vec::new();
    timeout(WAIT, async {
        while let Some(event) = handle.events.recv().await {
            let finished = done(&event);
            seen.push(event);
            if finished {
                return;
            }
        }
    })
    .await
    .expect("timed out waiting for session event");
    seen
}

fn is_state(event: &Arc<EnrichedEvent>, expected: &PlaybackState) -> bool {
    downcast_ref::<PlaybackStateChanged>(&event.event).is_some_and(|e| &e.state == expected)
}

async fn play_from_start(handle: &mut SessionHandle, t0: Instant) {
    handle.tick(t0);
    handle.command(PlayerCommand::TogglePlay);
    collect_until(handle, |e| is_state(e, &PlaybackState::Playing)).await;
}

#[tokio::test]
async fn transcript_and_chapters_follow_playback() {
    let api = Arc::new(backend());
    let mut handle = start(api, MemoryPreferenceStore::default()).await;

    let mut chapters = None;
    collect_until(&mut handle, |e| {
        if let Some(resolved) = downcast_ref::<ChaptersResolved>(&e.event) {
            chapters = Some(resolved.chapters.clone());
        }
        chapters.is_some()
    })
    .await;
    let chapters = chapters.unwrap();
    assert_eq!(chapters.len(), 8);
    assert_eq!(chapters[1].start_seconds, 30.0);
    assert_eq!(chapters[0].thumbnail.as_deref(), Some("/posters/lecture-7.jpg"));

    let t0 = Instant::now();
    play_from_start(&mut handle, t0).await;
    handle.tick(t0 + Duration::from_secs(31));

    let seen = collect_until(&mut handle, |e| {
        downcast_ref::<CueActivated>(&e.event).is_some_and(|c| c.index == Some(10))
    })
    .await;
    let cue = seen
        .iter()
        .filter_map(|e| downcast_ref::<CueActivated>(&e.event))
        .find(|c| c.index == Some(10))
        .and_then(|c| c.cue.clone())
        .unwrap();
    assert_eq!(cue.text, "line 10");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn clicking_a_cue_seeks_and_resumes() {
    let api = Arc::new(backend());
    let mut handle = start(api, MemoryPreferenceStore::default()).await;
    collect_until(&mut handle, |e| downcast_ref::<TranscriptLoaded>(&e.event).is_some()).await;

    handle.transcript(TranscriptCommand::ClickCue(5));

    let mut position = None;
    let mut playing = false;
    collect_until(&mut handle, |e| {
        if let Some(update) = downcast_ref::<TimeUpdated>(&e.event) {
            position = Some(update.current_time);
        }
        playing |= is_state(e, &PlaybackState::Playing);
        playing && position == Some(15.0)
    })
    .await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn clicking_the_active_cue_scrolls_it_back_into_view() {
    let api = Arc::new(backend());
    let mut handle = start(api, MemoryPreferenceStore::default()).await;
    collect_until(&mut handle, |e| downcast_ref::<TranscriptLoaded>(&e.event).is_some()).await;

    let t0 = Instant::now();
    play_from_start(&mut handle, t0).await;
    handle.tick(t0 + Duration::from_secs(31));
    collect_until(&mut handle, |e| {
        downcast_ref::<CueActivated>(&e.event).is_some_and(|c| c.index == Some(10))
    })
    .await;

    handle.transcript(TranscriptCommand::UserScrolled);
    handle.transcript(TranscriptCommand::ClickCue(10));

    let seen = collect_until(&mut handle, |e| {
        downcast_ref::<CueActivated>(&e.event).is_some_and(|c| c.index == Some(10))
    })
    .await;
    let activated = seen
        .iter()
        .filter_map(|e| downcast_ref::<CueActivated>(&e.event))
        .find(|c| c.index == Some(10))
        .unwrap();
    assert_eq!(activated.scroll.map(|s| s.cue_index), Some(10));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn quality_switch_keeps_position_and_playing() {
    let api = Arc::new(backend());
    let preferences = MemoryPreferenceStore::default();
    let mut handle = start(api.clone(), preferences).await;

    let t0 = Instant::now();
    play_from_start(&mut handle, t0).await;
    handle.tick(t0 + Duration::from_secs(30));
    collect_until(&mut handle, |e| {
        downcast_ref::<TimeUpdated>(&e.event).is_some_and(|u| u.current_time == 30.0)
    })
    .await;

    handle.command(PlayerCommand::SetQuality(QualityLabel::new("720p")));

    let mut switching = false;
    let seen = collect_until(&mut handle, |e| {
        if let Some(changed) = downcast_ref::<PlaybackStateChanged>(&e.event) {
            if changed.state.is_switching_quality() {
                switching = true;
                return false;
            }
            return switching && changed.state == PlaybackState::Playing;
        }
        false
    })
    .await;

    let restored = seen
        .iter()
        .filter_map(|e| downcast_ref::<TimeUpdated>(&e.event))
        .last()
        .map(|u| u.current_time)
        .unwrap();
    assert!((restored - 30.0).abs() < 1.0, "restored at {}", restored);

    let src = seen
        .iter()
        .filter_map(|e| downcast_ref::<SourceLoaded>(&e.event))
        .last()
        .map(|s| s.src.clone())
        .unwrap();
    assert_eq!(src, "https://videos.example.com/media/lecture-7/720.mp4");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn broken_stream_falls_back_to_default_quality() {
    let api = Arc::new(
        backend().with_stream(&video(), "1080p", "https://broken.example.net/1080.mp4"),
    );
    let preferences = MemoryPreferenceStore::with_quality(QualityLabel::new("1080p"));

    let config = PlayerConfig {
        base_url: Url::parse("https://videos.example.com/").unwrap(),
        ..PlayerConfig::default()
    };
    let mut element = SimulatedElement::new(300.0);
    element.fail_sources_containing("broken");
    let dyn_api: Arc<dyn WatchApi> = api.clone();
    let mut handle = start_session(SessionOptions {
        config: Arc::new(config),
        api: dyn_api,
        preferences: Arc::new(preferences),
        element,
        video_id: video(),
        chapters: None,
        poster: None,
        bus: BusConfig::new(),
    })
    .await
    .unwrap();

    let mut fell_back = false;
    let mut reloaded = false;
    let seen = collect_until(&mut handle, |e| {
        fell_back |= downcast_ref::<QualityChanged>(&e.event).is_some_and(|q| q.quality.is_max());
        reloaded |=
            downcast_ref::<SourceLoaded>(&e.event).is_some_and(|s| s.src.ends_with("/max.mp4"));
        fell_back && reloaded
    })
    .await;
    assert!(
        seen.iter()
            .filter_map(|e| downcast_ref::<SourceLoaded>(&e.event))
            .any(|s| s.src.contains("broken"))
    );

    handle.shutdown().await.unwrap();
    assert_eq!(api.stream_requests(), 2);
}

#[tokio::test]
async fn shutdown_saves_final_progress() {
    let api = Arc::new(backend());
    let mut handle = start(api.clone(), MemoryPreferenceStore::default()).await;

    let t0 = Instant::now();
    play_from_start(&mut handle, t0).await;
    handle.tick(t0 + Duration::from_secs(40));
    collect_until(&mut handle, |e| {
        downcast_ref::<TimeUpdated>(&e.event).is_some_and(|u| u.current_time == 40.0)
    })
    .await;

    handle.shutdown().await.unwrap();
    let saved = api.saved_progress();
    assert_eq!(saved.last().map(|p| p.progress_seconds), Some(40.0));
}

#[tokio::test]
async fn keys_and_bad_sources_travel_over_the_bus() {
    let api = Arc::new(backend());
    let mut handle = start(api, MemoryPreferenceStore::default()).await;

    handle.press_key(KeyInput::plain(Key::from_dom("t")));
    collect_until(&mut handle, |e| {
        downcast_ref::<TheaterToggled>(&e.event).is_some_and(|t| t.enabled)
    })
    .await;

    handle.command(PlayerCommand::SyncSource("   ".to_string()));
    let seen = collect_until(&mut handle, |e| downcast_ref::<WorkerFailed>(&e.event).is_some()).await;
    let failed = seen
        .iter()
        .find_map(|e| downcast_ref::<WorkerFailed>(&e.event))
        .unwrap();
    assert_eq!(failed.subscriber_id, "playback.player");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn quality_choice_is_persisted() {
    let api = Arc::new(backend());
    let preferences = Arc::new(MemoryPreferenceStore::default());
    let config = PlayerConfig {
        base_url: Url::parse("https://videos.example.com/").unwrap(),
        ..PlayerConfig::default()
    };
    let dyn_api: Arc<dyn WatchApi> = api;
    let mut handle = start_session(SessionOptions {
        config: Arc::new(config),
        api: dyn_api,
        preferences: preferences.clone(),
        element: SimulatedElement::new(120.0),
        video_id: video(),
        chapters: None,
        poster: None,
        bus: BusConfig::new(),
    })
    .await
    .unwrap();

    handle.command(PlayerCommand::SetQuality(QualityLabel::max()));
    collect_until(&mut handle, |e| {
        downcast_ref::<QualityChanged>(&e.event).is_some_and(|q| q.quality.is_max())
    })
    .await;

    handle.shutdown().await.unwrap();
    assert_eq!(preferences.load_quality(), Some(QualityLabel::max()));
}
