use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// MyAnimeList API client identifier
    pub mal_client_id: String,

    /// MyAnimeList API base URL
    #[serde(default = "default_mal_api_url")]
    pub mal_api_url: String,

    /// Path to the catalog artifact (JSON array of `{"title": ...}` records)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the similarity matrix artifact (JSON array of rows)
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned per query
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Per-attempt timeout for image lookups
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,

    /// Total attempts per image lookup, first attempt included
    #[serde(default = "default_image_retry_attempts")]
    pub image_retry_attempts: u32,

    /// Pause between failed image lookup attempts
    #[serde(default = "default_image_retry_delay_ms")]
    pub image_retry_delay_ms: u64,

    /// Minimum spacing between outbound image API requests, 0 disables pacing
    #[serde(default = "default_image_min_interval_ms")]
    pub image_min_interval_ms: u64,

    /// Maximum number of memoized image lookups; unbounded when unset
    #[serde(default)]
    pub image_cache_capacity: Option<usize>,

    /// Lifetime of a memoized image lookup; never expires when unset
    #[serde(default)]
    pub image_cache_ttl_secs: Option<u64>,

    /// Placeholder returned whenever no thumbnail can be resolved
    #[serde(default = "default_fallback_image_url")]
    pub fallback_image_url: String,
}

pub const DEFAULT_FALLBACK_IMAGE_URL: &str =
    "https://via.placeholder.com/150x200.png?text=No+Image";

fn default_mal_api_url() -> String {
    "https://api.myanimelist.net/v2".to_string()
}

fn default_catalog_path() -> String {
    "artifacts/anime_list.json".to_string()
}

fn default_similarity_path() -> String {
    "artifacts/similarity.json".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_count() -> usize {
    20
}

fn default_image_timeout_ms() -> u64 {
    5000
}

fn default_image_retry_attempts() -> u32 {
    3
}

fn default_image_retry_delay_ms() -> u64 {
    2000
}

fn default_image_min_interval_ms() -> u64 {
    1000
}

fn default_fallback_image_url() -> String {
    DEFAULT_FALLBACK_IMAGE_URL.to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the service unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mal_client_id.trim().is_empty() {
            anyhow::bail!("MAL_CLIENT_ID must not be empty");
        }
        if self.recommendation_count == 0 {
            anyhow::bail!("RECOMMENDATION_COUNT must be at least 1");
        }
        if self.image_retry_attempts == 0 {
            anyhow::bail!("IMAGE_RETRY_ATTEMPTS must be at least 1");
        }
        if self.image_cache_capacity == Some(0) {
            anyhow::bail!("IMAGE_CACHE_CAPACITY must be at least 1 when set");
        }
        Ok(())
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn image_retry_delay(&self) -> Duration {
        Duration::from_millis(self.image_retry_delay_ms)
    }

    pub fn image_min_interval(&self) -> Duration {
        Duration::from_millis(self.image_min_interval_ms)
    }

    pub fn image_cache_ttl(&self) -> Option<Duration> {
        self.image_cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
