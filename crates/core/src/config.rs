use std::time::Duration;

use reqwest::Url;

use crate::{
    error::{ReelsyncError, Result},
    types::QualityLabel,
};

pub const ENV_API_URL: &str = "REELSYNC_API_URL";
pub const ENV_BASE_URL: &str = "REELSYNC_BASE_URL";
pub const ENV_TRANSCRIPT_LIMIT: &str = "REELSYNC_TRANSCRIPT_LIMIT";
pub const ENV_MAX_CHAPTERS: &str = "REELSYNC_MAX_CHAPTERS";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Root of the watch REST API, without trailing slash.
    pub api_url: String,
    /// Origin relative media sources are resolved against.
    pub base_url: Url,
    pub time_update_interval: Duration,
    pub controls_hide_delay: Duration,
    pub seek_step_short: f64,
    pub seek_step_long: f64,
    pub volume_step: f64,
    /// Quality used on error fallback.
    pub default_quality: QualityLabel,
    pub max_chapters: usize,
    pub transcript_limit: usize,
    pub chapter_strip_scroll_px: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            time_update_interval: Duration::from_secs(1),
            controls_hide_delay: Duration::from_secs(2),
            seek_step_short: 5.0,
            seek_step_long: 10.0,
            volume_step: 0.1,
            default_quality: QualityLabel::max(),
            max_chapters: 8,
            transcript_limit: 1000,
            chapter_strip_scroll_px: 220.0,
        }
    }
}

impl PlayerConfig {
    /// Defaults overridden by `REELSYNC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(api_url) = lookup(ENV_API_URL) {
            Url::parse(&api_url).map_err(|_| ReelsyncError::InvalidConfig {
                key: ENV_API_URL,
                value: api_url.clone(),
            })?;
            config.api_url = api_url.trim_end_matches('/').to_string();
        }

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = Url::parse(&base_url).map_err(|_| ReelsyncError::InvalidConfig {
                key: ENV_BASE_URL,
                value: base_url.clone(),
            })?;
        }

        if let Some(limit) = lookup(ENV_TRANSCRIPT_LIMIT) {
            config.transcript_limit = parse_positive(ENV_TRANSCRIPT_LIMIT, &limit)?;
        }

        if let Some(max) = lookup(ENV_MAX_CHAPTERS) {
            config.max_chapters = parse_positive(ENV_MAX_CHAPTERS, &max)?;
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ReelsyncError::InvalidConfig {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_player_behaviour() {
        let config = PlayerConfig::default();
        assert_eq!(config.time_update_interval, Duration::from_secs(1));
        assert_eq!(config.controls_hide_delay, Duration::from_secs(2));
        assert_eq!(config.max_chapters, 8);
        assert!(config.default_quality.is_max());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = PlayerConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://videos.example.com/api/"),
            (ENV_BASE_URL, "https://videos.example.com/"),
            (ENV_MAX_CHAPTERS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://videos.example.com/api");
        assert_eq!(config.base_url.as_str(), "https://videos.example.com/");
        assert_eq!(config.max_chapters, 5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = PlayerConfig::from_lookup(lookup_from(&[(ENV_MAX_CHAPTERS, "0")])).unwrap_err();
        assert!(matches!(
            err,
            ReelsyncError::InvalidConfig {
                key: ENV_MAX_CHAPTERS,
                ..
            }
        ));
        assert!(PlayerConfig::from_lookup(lookup_from(&[(ENV_BASE_URL, "not a url")])).is_err());
    }
}
