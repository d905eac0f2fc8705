//! MyAnimeList API provider
//!
//! Looks up anime by free-text title and returns the first result's
//! `main_picture`. Every request, retries included, is paced by the shared
//! [`Throttle`].
//!
//! API Flow:
//! 1. Search: GET /anime?q={title}&limit=1 with `X-MAL-CLIENT-ID`
//! 2. Thumbnail: data[0].node.main_picture.medium

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::MalSearchResponse,
    services::{providers::ImageProvider, throttle::Throttle},
};

const CLIENT_ID_HEADER: &str = "X-MAL-CLIENT-ID";
const SEARCH_LIMIT: &str = "1";

#[derive(Clone)]
pub struct MyAnimeListProvider {
    http_client: HttpClient,
    client_id: String,
    api_url: String,
    throttle: Arc<Throttle>,
}

impl MyAnimeListProvider {
    /// Creates a provider whose requests time out after `timeout`
    pub fn new(
        client_id: String,
        api_url: String,
        timeout: Duration,
        throttle: Arc<Throttle>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            client_id,
            api_url: api_url.trim_end_matches('/').to_string(),
            throttle,
        })
    }
}

#[async_trait::async_trait]
impl ImageProvider for MyAnimeListProvider {
    async fn find_thumbnail(&self, name: &str) -> AppResult<Option<String>> {
        self.throttle.wait().await;

        let url = format!("{}/anime", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .header(CLIENT_ID_HEADER, &self.client_id)
            .query(&[("q", name), ("limit", SEARCH_LIMIT)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "MyAnimeList API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(anime = %name, response = %response_text, "Raw MyAnimeList response");

        let search: MalSearchResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                anime = %name,
                "Failed to deserialize MyAnimeList response"
            );
            AppError::MalformedResponse(format!("Failed to parse MyAnimeList response: {}", e))
        })?;

        let thumbnail = search.thumbnail();

        tracing::info!(
            anime = %name,
            found = thumbnail.is_some(),
            provider = "myanimelist",
            "Thumbnail lookup completed"
        );

        Ok(thumbnail)
    }

    fn name(&self) -> &'static str {
        "myanimelist"
    }
}
