use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;
use watchseerr_model::{CatalogId, FilmMetadata};

use super::traits::{
    EnrichmentRequest, MetadataProvider, ProviderError, ResolvedFilm,
};

static TMDB_ID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-tmdb-id="(\d+)""#).expect("tmdb id pattern is valid")
});

/// TMDb-backed catalog lookup.
///
/// The catalog id comes from the candidate's hint when present, otherwise
/// from the `data-tmdb-id` attribute of the candidate's film page.
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    api_key: String,
    base_url: Url,
    page_base_url: Url,
    client: Client,
}

impl TmdbProvider {
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        base_url: Url,
        page_base_url: Url,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            page_base_url,
            client,
        }
    }

    async fn catalog_id_from_page(
        &self,
        source_link: &str,
    ) -> Result<CatalogId, ProviderError> {
        let url = self.page_base_url.join(source_link).map_err(|err| {
            ProviderError::Parse(format!("invalid film link {source_link}: {err}"))
        })?;

        let response = self.client.get(url).send().await?;
        check_status(response.status())?;
        let body = response.text().await?;

        let id = extract_catalog_id(&body).ok_or(ProviderError::NotFound)?;
        debug!(source_link, catalog_id = %id, "resolved catalog id from film page");
        Ok(id)
    }

    async fn movie_details(
        &self,
        catalog_id: CatalogId,
    ) -> Result<TmdbMovieDetails, ProviderError> {
        let url = format!(
            "{}/movie/{}",
            self.base_url.as_str().trim_end_matches('/'),
            catalog_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;
        check_status(response.status())?;

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn resolve(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<ResolvedFilm, ProviderError> {
        let catalog_id = match request.catalog_id {
            Some(id) => id,
            None => {
                self.catalog_id_from_page(&request.candidate.source_link)
                    .await?
            }
        };

        let details = self.movie_details(catalog_id).await?;
        Ok(ResolvedFilm {
            catalog_id: CatalogId(details.id),
            metadata: details.into_metadata(),
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(ProviderError::InvalidApiKey),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
        s if !s.is_success() => Err(ProviderError::Api(format!(
            "TMDB API returned status: {s}"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn extract_catalog_id(page: &str) -> Option<CatalogId> {
    TMDB_ID_ATTR
        .captures(page)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    budget: Option<u64>,
    #[serde(default)]
    revenue: Option<u64>,
    #[serde(default)]
    release_date: Option<String>,
}

impl TmdbMovieDetails {
    fn into_metadata(self) -> FilmMetadata {
        FilmMetadata {
            title: self.title.unwrap_or_default(),
            budget: self.budget.unwrap_or(0),
            revenue: self.revenue.unwrap_or(0),
            release_date: self.release_date.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_id_is_read_from_page_markup() {
        let page = r#"<div class="film" data-film-id="51568" data-tmdb-id="949" data-tmdb-type="movie">"#;
        assert_eq!(extract_catalog_id(page), Some(CatalogId(949)));
        assert_eq!(extract_catalog_id("<div data-film-id=\"1\">"), None);
    }

    #[test]
    fn missing_detail_fields_default_to_empty() {
        let details: TmdbMovieDetails =
            serde_json::from_str(r#"{"id": 12, "title": "Finding Nemo"}"#)
                .expect("parse");
        let metadata = details.into_metadata();
        assert_eq!(metadata.title, "Finding Nemo");
        assert_eq!(metadata.budget, 0);
        assert!(metadata.release_date.is_empty());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(ProviderError::InvalidApiKey)
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(ProviderError::RateLimited)
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(ProviderError::Api(_))
        ));
        assert!(check_status(StatusCode::OK).is_ok());
    }
}
