use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use watchseerr_model::{CandidateItem, CatalogId, ExternalId};

use super::traits::{CandidateSource, SourceError};

/// Candidate lists served as JSON by a scraper sidecar.
///
/// `GET {base}/{username}{endpoint}` with basic auth returns an array of
/// `{id, link, slug?, tmdbId?, onSecondary?}` objects.
#[derive(Debug, Clone)]
pub struct HttpCandidateSource {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpCandidateSource {
    pub fn new(
        client: Client,
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            username: username.into(),
            password: password.into(),
        }
    }

    fn list_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim();
        let separator = if endpoint.starts_with('/') { "" } else { "/" };
        format!(
            "{}/{}{separator}{endpoint}",
            self.base_url.as_str().trim_end_matches('/'),
            self.username
        )
    }
}

#[async_trait]
impl CandidateSource for HttpCandidateSource {
    async fn list(
        &self,
        endpoint: &str,
    ) -> Result<Vec<CandidateItem>, SourceError> {
        let response = self
            .client
            .get(self.list_url(endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::Unauthorized);
            }
            s if !s.is_success() => {
                return Err(SourceError::Status {
                    endpoint: endpoint.to_string(),
                    status: s.as_u16(),
                });
            }
            _ => {}
        }

        let entries: Vec<SourceEntry> = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        debug!(endpoint, count = entries.len(), "fetched candidate list");

        Ok(entries.into_iter().map(SourceEntry::into_candidate).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceEntry {
    id: u64,
    link: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    on_secondary: Option<bool>,
}

impl SourceEntry {
    fn into_candidate(self) -> CandidateItem {
        let mut candidate = CandidateItem::new(ExternalId(self.id), self.link);
        candidate.slug = self.slug;
        candidate.catalog_hint = self.tmdb_id.map(CatalogId);
        candidate.in_secondary = self.on_secondary;
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_url_joins_user_and_endpoint() {
        let source = HttpCandidateSource::new(
            Client::new(),
            Url::parse("http://sidecar:8080/").expect("url"),
            "cinephile",
            "pw",
        );
        assert_eq!(
            source.list_url("/watchlist"),
            "http://sidecar:8080/cinephile/watchlist"
        );
        assert_eq!(
            source.list_url("watchlist/on/favorite-services"),
            "http://sidecar:8080/cinephile/watchlist/on/favorite-services"
        );
    }

    #[test]
    fn entries_map_optional_fields() {
        let entries: Vec<SourceEntry> = serde_json::from_str(
            r#"[
                {"id": 1, "link": "/film/heat/", "slug": "heat", "tmdbId": 949},
                {"id": 2, "link": "/film/ran/", "onSecondary": true}
            ]"#,
        )
        .expect("parse");
        let candidates: Vec<_> =
            entries.into_iter().map(SourceEntry::into_candidate).collect();

        assert_eq!(candidates[0].catalog_hint, Some(CatalogId(949)));
        assert_eq!(candidates[0].slug.as_deref(), Some("heat"));
        assert_eq!(candidates[1].in_secondary, Some(true));
        assert_eq!(candidates[1].catalog_hint, None);
    }
}
