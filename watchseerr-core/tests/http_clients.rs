use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
};
use serde_json::{Value, json};
use url::Url;
use watchseerr_core::providers::{
    CandidateSource, EnrichmentRequest, HttpCandidateSource, MetadataProvider,
    ProviderError, RequestService, SeerrClient, SourceError, TmdbProvider,
};
use watchseerr_model::{CandidateItem, CatalogId, ExternalId};

async fn spawn(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}/")).expect("url")
}

#[derive(Clone, Default)]
struct SeerrState {
    created: Arc<Mutex<Vec<Value>>>,
}

fn has_key(headers: &HeaderMap) -> bool {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "seerr-key")
}

async fn list_requests(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, usize>>,
) -> impl IntoResponse {
    if !has_key(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let take = params.get("take").copied().unwrap_or(10);
    let skip = params.get("skip").copied().unwrap_or(0);
    let total = 150;
    let results: Vec<Value> = (skip..total.min(skip + take))
        .map(|i| {
            let media_type = if i % 10 == 0 { "tv" } else { "movie" };
            json!({"id": i, "media": {"tmdbId": 1000 + i, "mediaType": media_type}})
        })
        .collect();
    Json(json!({
        "pageInfo": {"pages": 2, "pageSize": take, "results": total, "page": skip / take + 1},
        "results": results,
    }))
    .into_response()
}

async fn create_request(
    State(state): State<SeerrState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    if !has_key(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    if body["mediaId"] == json!(13) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.created.lock().unwrap().push(body);
    StatusCode::CREATED
}

fn seerr_router(state: SeerrState) -> Router {
    Router::new()
        .route("/api/v1/request", get(list_requests).post(create_request))
        .with_state(state)
}

#[tokio::test]
async fn seerr_lists_every_page() {
    let base = spawn(seerr_router(SeerrState::default())).await;
    let client = SeerrClient::new(reqwest::Client::new(), base, "seerr-key");

    let requested = client.list_already_requested().await.expect("list");

    // every tenth entry is a tv request and shares no id space with movies
    assert_eq!(requested.len(), 135);
    assert!(!requested.contains(&CatalogId(1000)));
    assert!(requested.contains(&CatalogId(1001)));
    assert!(requested.contains(&CatalogId(1149)));
}

#[tokio::test]
async fn seerr_create_succeeds_only_on_201() {
    let state = SeerrState::default();
    let base = spawn(seerr_router(state.clone())).await;
    let client = SeerrClient::new(reqwest::Client::new(), base, "seerr-key")
        .with_user_id(Some(2));

    client.create_request(CatalogId(603)).await.expect("created");
    let err = client
        .create_request(CatalogId(13))
        .await
        .expect_err("server error");

    assert!(matches!(err, ProviderError::Api(_)));
    assert_eq!(
        *state.created.lock().unwrap(),
        vec![json!({"mediaType": "movie", "mediaId": 603, "userId": 2})]
    );
}

#[tokio::test]
async fn seerr_rejects_bad_key() {
    let base = spawn(seerr_router(SeerrState::default())).await;
    let client = SeerrClient::new(reqwest::Client::new(), base, "wrong");

    assert!(matches!(
        client.list_already_requested().await,
        Err(ProviderError::InvalidApiKey)
    ));
}

async fn film_page(Path(slug): Path<String>) -> impl IntoResponse {
    match slug.as_str() {
        "heat" => Html(
            r#"<body class="film"><div id="film-page-wrapper" data-film-id="51568" data-tmdb-id="949" data-tmdb-type="movie"></div></body>"#,
        )
        .into_response(),
        "blank" => Html("<body></body>").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn movie(
    Path(id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if params.get("api_key").map(String::as_str) != Some("tmdb-key") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match id {
        949 => Json(json!({
            "id": 949,
            "title": "Heat",
            "budget": 60000000,
            "revenue": 187436818,
            "release_date": "1995-12-15",
            "runtime": 170
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn tmdb_router() -> Router {
    Router::new()
        .route("/film/{slug}/", get(film_page))
        .route("/3/movie/{id}", get(movie))
}

fn tmdb_provider(base: &Url, key: &str) -> TmdbProvider {
    TmdbProvider::new(
        reqwest::Client::new(),
        key,
        base.join("3").expect("api base"),
        base.clone(),
    )
}

#[tokio::test]
async fn tmdb_resolves_through_film_page() {
    let base = spawn(tmdb_router()).await;
    let provider = tmdb_provider(&base, "tmdb-key");

    let request =
        EnrichmentRequest::new(CandidateItem::new(ExternalId(51568), "/film/heat/"));
    let resolved = provider.resolve(&request).await.expect("resolved");

    assert_eq!(resolved.catalog_id, CatalogId(949));
    assert_eq!(resolved.metadata.title, "Heat");
    assert_eq!(resolved.metadata.budget, 60_000_000);
    assert_eq!(resolved.metadata.release_date, "1995-12-15");
}

#[tokio::test]
async fn tmdb_uses_catalog_hint_without_page_fetch() {
    let base = spawn(tmdb_router()).await;
    let provider = tmdb_provider(&base, "tmdb-key");

    let request = EnrichmentRequest::new(
        CandidateItem::new(ExternalId(1), "/film/does-not-exist/")
            .with_catalog_hint(CatalogId(949)),
    );
    let resolved = provider.resolve(&request).await.expect("resolved");
    assert_eq!(resolved.metadata.revenue, 187_436_818);
}

#[tokio::test]
async fn tmdb_failures_map_to_provider_errors() {
    let base = spawn(tmdb_router()).await;

    let blank =
        EnrichmentRequest::new(CandidateItem::new(ExternalId(2), "/film/blank/"));
    assert!(matches!(
        tmdb_provider(&base, "tmdb-key").resolve(&blank).await,
        Err(ProviderError::NotFound)
    ));

    let hinted = EnrichmentRequest::new(
        CandidateItem::new(ExternalId(3), "/film/heat/")
            .with_catalog_hint(CatalogId(949)),
    );
    assert!(matches!(
        tmdb_provider(&base, "bad-key").resolve(&hinted).await,
        Err(ProviderError::InvalidApiKey)
    ));
}

async fn watchlist(
    Path((user, list)): Path<(String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Basic Y2luZXBoaWxlOmh1bnRlcjI=");
    if !authorized || user != "cinephile" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match list.as_str() {
        "watchlist" => Json(json!([
            {"id": 51568, "link": "/film/heat/", "slug": "heat"},
            {"id": 2, "link": "/film/ran/", "tmdbId": 11645, "onSecondary": true}
        ]))
        .into_response(),
        _ => StatusCode::BAD_GATEWAY.into_response(),
    }
}

#[tokio::test]
async fn candidate_source_uses_basic_auth() {
    let base = spawn(Router::new().route("/{user}/{list}", get(watchlist))).await;

    let source = HttpCandidateSource::new(
        reqwest::Client::new(),
        base.clone(),
        "cinephile",
        "hunter2",
    );
    let items = source.list("/watchlist").await.expect("list");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].external_id, ExternalId(51568));
    assert_eq!(items[1].catalog_hint, Some(CatalogId(11645)));
    assert_eq!(items[1].in_secondary, Some(true));

    assert!(matches!(
        source.list("/broken").await,
        Err(SourceError::Status { status: 502, .. })
    ));

    let wrong = HttpCandidateSource::new(
        reqwest::Client::new(),
        base,
        "cinephile",
        "nope",
    );
    assert!(matches!(
        wrong.list("/watchlist").await,
        Err(SourceError::Unauthorized)
    ));
}
