use crate::error::{NarravidError, Result};
use serde::Deserialize;
use tracing::debug;

/// Google Custom Search endpoint.
const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Image lookup against the Google Custom Search API.
pub struct GoogleImageClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    search_engine_id: String,
}

impl GoogleImageClient {
    pub fn new(api_key: String, search_engine_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: GOOGLE_CSE_URL.to_string(),
            api_key,
            search_engine_id,
        }
    }

    /// Override the API endpoint (used by tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    /// First image-result URL for a query, or `None` when the search comes
    /// back empty.
    pub async fn first_image_url(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.search_engine_id.as_str()),
                ("searchType", "image"),
                ("q", query),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(NarravidError::Api(format!(
                "Google Image Search API error ({}): {}",
                status, error_body
            )));
        }

        let parsed: SearchResponse = serde_json::from_str(&response.text().await?)?;
        let link = parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .find_map(|item| item.link);

        debug!("Image search '{}' -> {:?}", query, link);
        Ok(link)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}
