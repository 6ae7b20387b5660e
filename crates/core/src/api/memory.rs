use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    api::WatchApi,
    error::{ReelsyncError, Result},
    types::{QualityLabel, StreamMeta, VideoId, WatchProgress},
};

/// Calls seen by a `MemoryWatchApi`, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    StreamMeta { video_id: VideoId, quality: QualityLabel },
    GetProgress { video_id: VideoId },
    SaveProgress(WatchProgress),
    Transcript { video_id: VideoId, limit: usize },
}

#[derive(Default)]
struct MemoryState {
    streams: HashMap<(VideoId, QualityLabel), String>,
    qualities: HashMap<VideoId, Vec<String>>,
    failing_qualities: Vec<QualityLabel>,
    progress: HashMap<VideoId, WatchProgress>,
    transcripts: HashMap<VideoId, serde_json::Value>,
    fail_progress: bool,
    calls: Vec<ApiCall>,
}

/// In-process backend used by the simulator and by tests.
#[derive(Default)]
pub struct MemoryWatchApi {
    state: Mutex<MemoryState>,
}

impl MemoryWatchApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(self, video_id: &VideoId, quality: &str, url: &str) -> Self {
        {
            let mut state = self.state.lock().expect("MemoryWatchApi poisoned");
            state
                .streams
                .insert((video_id.clone(), QualityLabel::new(quality)), url.to_string());
            let labels = state.qualities.entry(video_id.clone()).or_default();
            if !labels.iter().any(|l| l == quality) {
                labels.push(quality.to_string());
            }
        }
        self
    }

    pub fn with_progress(self, progress: WatchProgress) -> Self {
        self.state
            .lock()
            .expect("MemoryWatchApi poisoned")
            .progress
            .insert(progress.video_id.clone(), progress);
        self
    }

    pub fn with_transcript(self, video_id: &VideoId, body: serde_json::Value) -> Self {
        self.state
            .lock()
            .expect("MemoryWatchApi poisoned")
            .transcripts
            .insert(video_id.clone(), body);
        self
    }

    /// Stream requests for `quality` fail with a 503.
    pub fn fail_quality(&self, quality: &str) {
        self.state
            .lock()
            .expect("MemoryWatchApi poisoned")
            .failing_qualities
            .push(QualityLabel::new(quality));
    }

    /// Progress load and save fail with a 500.
    pub fn fail_progress(&self) {
        self.state.lock().expect("MemoryWatchApi poisoned").fail_progress = true;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state
            .lock()
            .expect("MemoryWatchApi poisoned")
            .calls
            .clone()
    }

    pub fn stream_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::StreamMeta { .. }))
            .count()
    }

    pub fn saved_progress(&self) -> Vec<WatchProgress> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::SaveProgress(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl WatchApi for MemoryWatchApi {
    async fn get_stream_meta(
        &self,
        video_id: &VideoId,
        quality: &QualityLabel,
    ) -> Result<StreamMeta> {
        let mut state = self.state.lock().expect("MemoryWatchApi poisoned");
        state.calls.push(ApiCall::StreamMeta {
            video_id: video_id.clone(),
            quality: quality.clone(),
        });

        let endpoint = format!("watch/{}/stream?quality={}", video_id, quality);
        if state.failing_qualities.contains(quality) {
            return Err(ReelsyncError::BackendStatus {
                endpoint,
                status: 503,
            });
        }

        let url = state
            .streams
            .get(&(video_id.clone(), quality.clone()))
            .cloned()
            .ok_or(ReelsyncError::BackendStatus {
                endpoint,
                status: 404,
            })?;

        Ok(StreamMeta {
            playback_url: Some(url),
            available_qualities: state.qualities.get(video_id).cloned().unwrap_or_default(),
        })
    }

    async fn get_watch_progress(&self, video_id: &VideoId) -> Result<Option<WatchProgress>> {
        let mut state = self.state.lock().expect("MemoryWatchApi poisoned");
        state.calls.push(ApiCall::GetProgress {
            video_id: video_id.clone(),
        });
        if state.fail_progress {
            return Err(ReelsyncError::BackendStatus {
                endpoint: format!("watch-history/{}/progress", video_id),
                status: 500,
            });
        }
        Ok(state.progress.get(video_id).cloned())
    }

    async fn save_watch_progress(&self, progress: &WatchProgress) -> Result<()> {
        let mut state = self.state.lock().expect("MemoryWatchApi poisoned");
        state.calls.push(ApiCall::SaveProgress(progress.clone()));
        if state.fail_progress {
            return Err(ReelsyncError::BackendStatus {
                endpoint: "watch-history/progress".to_string(),
                status: 500,
            });
        }
        state
            .progress
            .insert(progress.video_id.clone(), progress.clone());
        Ok(())
    }

    async fn get_watch_transcript(
        &self,
        video_id: &VideoId,
        limit: usize,
    ) -> Result<serde_json::Value> {
        let mut state = self.state.lock().expect("MemoryWatchApi poisoned");
        state.calls.push(ApiCall::Transcript {
            video_id: video_id.clone(),
            limit,
        });
        state
            .transcripts
            .get(video_id)
            .cloned()
            .ok_or(ReelsyncError::BackendStatus {
                endpoint: format!("watch/{}/transcript", video_id),
                status: 404,
            })
    }
}
