//! Boundary to the watch backend.
//!
//! Only the four calls the playback core needs are modelled. Transcripts come
//! back as raw JSON because the backend is inconsistent about field names;
//! `sync::transcript::normalize_cues` is the single place that copes with it.

pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{QualityLabel, StreamMeta, VideoId, WatchProgress},
};

pub use http::HttpWatchApi;
pub use memory::{ApiCall, MemoryWatchApi};

#[async_trait]
pub trait WatchApi: Send + Sync {
    async fn get_stream_meta(&self, video_id: &VideoId, quality: &QualityLabel)
    -> Result<StreamMeta>;

    /// `None` when the viewer has no saved progress for the video.
    async fn get_watch_progress(&self, video_id: &VideoId) -> Result<Option<WatchProgress>>;

    async fn save_watch_progress(&self, progress: &WatchProgress) -> Result<()>;

    async fn get_watch_transcript(
        &self,
        video_id: &VideoId,
        limit: usize,
    ) -> Result<serde_json::Value>;
}
