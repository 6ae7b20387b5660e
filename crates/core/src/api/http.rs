use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    api::WatchApi,
    error::{ReelsyncError, Result},
    types::{QualityLabel, StreamMeta, VideoId, WatchProgress},
};

/// `WatchApi` over the platform's REST endpoints.
pub struct HttpWatchApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpWatchApi {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        let endpoint = self.endpoint(path);
        let response = self
            .authorize(self.client.get(&endpoint).query(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReelsyncError::BackendStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        Ok(unwrap_envelope(body))
    }
}

/// Some endpoints wrap their payload in `{ "data": ... }`.
fn unwrap_envelope(body: serde_json::Value) -> serde_json::Value {
    match body {
        serde_json::Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}

#[async_trait]
impl WatchApi for HttpWatchApi {
    async fn get_stream_meta(
        &self,
        video_id: &VideoId,
        quality: &QualityLabel,
    ) -> Result<StreamMeta> {
        let body = self
            .get_json(
                &format!("watch/{}/stream", video_id),
                &[("quality", quality.as_str().to_string())],
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_watch_progress(&self, video_id: &VideoId) -> Result<Option<WatchProgress>> {
        let endpoint = self.endpoint(&format!("watch-history/{}/progress", video_id));
        let response = self.authorize(self.client.get(&endpoint)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ReelsyncError::BackendStatus {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        let body = unwrap_envelope(response.json::<serde_json::Value>().await?);
        if body.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(body)?))
    }

    async fn save_watch_progress(&self, progress: &WatchProgress) -> Result<()> {
        let endpoint = self.endpoint("watch-history/progress");
        let response = self
            .authorize(self.client.post(&endpoint))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "videoId": progress.video_id,
                "progress": progress.progress_seconds,
                "duration": progress.total_duration,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReelsyncError::BackendStatus {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn get_watch_transcript(
        &self,
        video_id: &VideoId,
        limit: usize,
    ) -> Result<serde_json::Value> {
        self.get_json(
            &format!("watch/{}/transcript", video_id),
            &[("limit", limit.to_string())],
        )
        .await
    }
}
