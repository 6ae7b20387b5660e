use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelsyncError {
    #[error("Invalid media source {src}: {reason}")]
    InvalidSource { src: String, reason: String },

    #[error("Stream for {video_id} at {quality} has no playback URL")]
    MissingPlaybackUrl { video_id: String, quality: String },

    #[error("Backend returned {status} for {endpoint}")]
    BackendStatus { endpoint: String, status: u16 },

    #[error("Preference store at {path} is unusable: {reason}")]
    PreferenceStore { path: PathBuf, reason: String },

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReelsyncError>;
