use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;
use watchseerr_model::CatalogId;

use super::traits::{ProviderError, RequestService};

const PAGE_SIZE: usize = 100;
const API_KEY_HEADER: &str = "X-Api-Key";

/// Client for Jellyseerr/Overseerr-compatible request APIs.
#[derive(Debug, Clone)]
pub struct SeerrClient {
    client: Client,
    base_url: Url,
    api_key: String,
    user_id: Option<u64>,
}

impl SeerrClient {
    pub fn new(client: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
            user_id: None,
        }
    }

    /// Requests are filed on behalf of this user instead of the key owner.
    pub fn with_user_id(mut self, user_id: Option<u64>) -> Self {
        self.user_id = user_id;
        self
    }

    fn request_endpoint(&self) -> String {
        format!(
            "{}/api/v1/request",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn fetch_page(
        &self,
        skip: usize,
    ) -> Result<RequestPage, ProviderError> {
        let response = self
            .client
            .get(self.request_endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("take", PAGE_SIZE), ("skip", skip)])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::InvalidApiKey);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ProviderError::RateLimited);
            }
            s if !s.is_success() => {
                return Err(ProviderError::Api(format!(
                    "request list returned status: {s}"
                )));
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RequestService for SeerrClient {
    async fn list_already_requested(
        &self,
    ) -> Result<HashSet<CatalogId>, ProviderError> {
        let mut requested = HashSet::new();
        let mut skip = 0;

        loop {
            let page = self.fetch_page(skip).await?;
            let fetched = page.results.len();

            requested.extend(
                page.results
                    .into_iter()
                    .filter_map(|entry| {
                        entry.media.and_then(RequestMedia::movie_id)
                    })
                    .map(CatalogId),
            );

            skip += fetched;
            let total = page.page_info.and_then(|info| info.results);
            let exhausted = match total {
                Some(total) => skip >= total,
                None => fetched < PAGE_SIZE,
            };
            if fetched == 0 || exhausted {
                break;
            }
        }

        debug!(count = requested.len(), "fetched already-requested set");
        Ok(requested)
    }

    async fn create_request(
        &self,
        catalog_id: CatalogId,
    ) -> Result<(), ProviderError> {
        let body = CreateRequestBody {
            media_type: "movie",
            media_id: catalog_id.get(),
            user_id: self.user_id,
        };

        let response = self
            .client
            .post(self.request_endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        warn!(%catalog_id, %status, "request service refused create");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ProviderError::InvalidApiKey)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
            _ => Err(ProviderError::Api(format!(
                "create request returned {status}: {}",
                text.trim()
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequestBody {
    media_type: &'static str,
    media_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestPage {
    #[serde(default)]
    page_info: Option<PageInfo>,
    #[serde(default)]
    results: Vec<RequestEntry>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RequestEntry {
    #[serde(default)]
    media: Option<RequestMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestMedia {
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    media_type: Option<String>,
}

impl RequestMedia {
    /// Movie and tv ids are separate catalog ranges; only movies count.
    fn movie_id(self) -> Option<u64> {
        match self.media_type.as_deref() {
            Some("movie") => self.tmdb_id,
            _ => None,
        }
    }
}
