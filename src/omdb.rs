use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    catalog::CatalogClient,
    error::ClientError,
    models::{MovieDetails, SearchResult},
};

/// OMDb answers an exhausted or empty search with this error text.
const NOT_FOUND: &str = "Movie not found!";
/// OMDb refuses to page past this.
const MAX_SEARCH_PAGES: u32 = 100;

pub struct OmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OmdbClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, rps: u32) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no OMDB_API_KEY provided, catalog requests will be rejected");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, api_key, base_url, limiter }
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, ClientError> {
        self.limiter.until_ready().await;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    async fn search_page(&self, query: &str, page: u32) -> Result<SearchResponse, ClientError> {
        debug!(query = %query, page = page, "searching catalog");
        let page_param = page.to_string();
        self.get(&[("s", query), ("type", "movie"), ("page", page_param.as_str())]).await
    }
}

#[async_trait]
impl CatalogClient for OmdbClient {
    async fn get_by_external_id(&self, external_id: &str) -> Result<MovieDetails, ClientError> {
        debug!(imdb_id = %external_id, "fetching movie details");
        let resp: DetailResponse = self.get(&[("i", external_id), ("plot", "full")]).await?;
        resp.into_details()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        let results = collect_search_pages(|page| self.search_page(query, page)).await?;
        debug!(query = %query, result_count = results.len(), "search complete");
        Ok(results)
    }
}

/// Read search pages from 1 upward until `totalResults` hits are collected,
/// a page comes back empty or not found, or the page cap is reached.
async fn collect_search_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<SearchResult>, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<SearchResponse, ClientError>>,
{
    let mut results = Vec::new();
    let mut page = 1;

    loop {
        let Some((hits, total)) = fetch_page(page).await?.into_page()? else {
            break;
        };
        if hits.is_empty() {
            break;
        }
        results.extend(hits);

        if results.len() >= total || page >= MAX_SEARCH_PAGES {
            break;
        }
        page += 1;
    }

    Ok(results)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetailResponse {
    response: String,
    error: Option<String>,
    title: Option<String>,
    year: Option<String>,
    plot: Option<String>,
    runtime: Option<String>,
    genre: Option<String>,
}

impl DetailResponse {
    fn into_details(self) -> Result<MovieDetails, ClientError> {
        if !is_true(&self.response) {
            return Err(ClientError::Api(self.error.unwrap_or_else(|| "unknown error".to_string())));
        }
        let title = self.title.ok_or_else(|| ClientError::Malformed("missing Title".to_string()))?;

        Ok(MovieDetails {
            title,
            year: self.year.as_deref().and_then(parse_year),
            plot: self.plot.and_then(not_available),
            runtime_minutes: self.runtime.as_deref().and_then(parse_runtime),
            genres: self.genre.as_deref().map(parse_genres).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    response: String,
    error: Option<String>,
    search: Option<Vec<SearchMovie>>,
    #[serde(rename = "totalResults")]
    total_results: Option<String>,
}

impl SearchResponse {
    /// Hits on this page plus the total across all pages, or `None` when
    /// there is nothing (more) to read.
    fn into_page(self) -> Result<Option<(Vec<SearchResult>, usize)>, ClientError> {
        if !is_true(&self.response) {
            return match self.error.as_deref() {
                Some(NOT_FOUND) => Ok(None),
                other => Err(ClientError::Api(other.unwrap_or("unknown error").to_string())),
            };
        }

        let total = self.total_results.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0);
        let hits = self
            .search
            .unwrap_or_default()
            .into_iter()
            .map(|m| SearchResult { year: parse_year(&m.year), title: m.title, imdb_id: m.imdb_id })
            .collect();
        Ok(Some((hits, total)))
    }
}

#[derive(Debug, Deserialize)]
struct SearchMovie {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

fn is_true(flag: &str) -> bool {
    flag.eq_ignore_ascii_case("true")
}

fn not_available(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty() && trimmed != "N/A").then(|| trimmed.to_string())
}

/// Leading four digits of an OMDb year, so ranges like `2005–2007` keep their start.
fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    let digits = s.get(..4)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `"136 min"` -> 136.
fn parse_runtime(s: &str) -> Option<i32> {
    s.split_whitespace().next().and_then(|n| n.parse().ok())
}

fn parse_genres(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|g| not_available(g.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_response_is_parsed() {
        let json = r#"{
            "Title": "The Matrix",
            "Year": "1999",
            "Runtime": "136 min",
            "Genre": "Action, Sci-Fi",
            "Plot": "A computer hacker learns about the true nature of reality.",
            "imdbID": "tt0133093",
            "Response": "True"
        }"#;
        let resp: DetailResponse = serde_json::from_str(json).unwrap();
        let details = resp.into_details().unwrap();

        assert_eq!(details.title, "The Matrix");
        assert_eq!(details.year, Some(1999));
        assert_eq!(details.runtime_minutes, Some(136));
        assert_eq!(details.genres, vec!["Action".to_string(), "Sci-Fi".to_string()]);
        assert!(details.plot.unwrap().starts_with("A computer hacker"));
    }

    #[test]
    fn not_available_fields_become_empty() {
        let json = r#"{
            "Title": "Obscure Short",
            "Year": "N/A",
            "Runtime": "N/A",
            "Genre": "N/A",
            "Plot": "N/A",
            "Response": "True"
        }"#;
        let resp: DetailResponse = serde_json::from_str(json).unwrap();
        let details = resp.into_details().unwrap();

        assert_eq!(details.year, None);
        assert_eq!(details.runtime_minutes, None);
        assert_eq!(details.plot, None);
        assert!(details.genres.is_empty());
    }

    #[test]
    fn detail_error_response_is_api_error() {
        let json = r#"{"Response": "False", "Error": "Incorrect IMDb ID."}"#;
        let resp: DetailResponse = serde_json::from_str(json).unwrap();
        match resp.into_details() {
            Err(ClientError::Api(msg)) => assert_eq!(msg, "Incorrect IMDb ID."),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn detail_without_title_is_malformed() {
        let json = r#"{"Response": "True", "Year": "2001"}"#;
        let resp: DetailResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.into_details(), Err(ClientError::Malformed(_))));
    }

    #[test]
    fn search_page_is_parsed() {
        let json = r#"{
            "Search": [
                {"Title": "Star Wars", "Year": "1977", "imdbID": "tt0076759", "Type": "movie", "Poster": "N/A"},
                {"Title": "Star Wars: The Clone Wars", "Year": "2008–2020", "imdbID": "tt0458290", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "12",
            "Response": "True"
        }"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let (hits, total) = resp.into_page().unwrap().unwrap();

        assert_eq!(total, 12);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].imdb_id, "tt0076759");
        assert_eq!(hits[0].year, Some(1977));
        assert_eq!(hits[1].year, Some(2008));
    }

    #[test]
    fn search_not_found_is_end_of_results() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(resp.into_page().unwrap().is_none());
    }

    #[test]
    fn search_other_error_is_api_error() {
        let json = r#"{"Response": "False", "Error": "Too many results."}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.into_page(), Err(ClientError::Api(_))));
    }

    fn hits_page(first_id: usize, hits: usize, total: usize) -> SearchResponse {
        SearchResponse {
            response: "True".to_string(),
            error: None,
            search: Some(
                (first_id..first_id + hits)
                    .map(|i| SearchMovie {
                        title: format!("Movie {i}"),
                        year: "2000".to_string(),
                        imdb_id: format!("tt{i:07}"),
                    })
                    .collect(),
            ),
            total_results: Some(total.to_string()),
        }
    }

    fn not_found_page() -> SearchResponse {
        SearchResponse {
            response: "False".to_string(),
            error: Some(NOT_FOUND.to_string()),
            search: None,
            total_results: None,
        }
    }

    #[tokio::test]
    async fn paging_follows_until_total_results() {
        let mut requested = Vec::new();
        let results = collect_search_pages(|page| {
            requested.push(page);
            let resp = match page {
                1 => hits_page(1, 2, 3),
                _ => hits_page(3, 1, 3),
            };
            async move { Ok(resp) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2]);
        let ids: Vec<&str> = results.iter().map(|r| r.imdb_id.as_str()).collect();
        assert_eq!(ids, vec!["tt0000001", "tt0000002", "tt0000003"]);
    }

    #[tokio::test]
    async fn paging_stops_on_empty_page() {
        let mut requested = Vec::new();
        let results = collect_search_pages(|page| {
            requested.push(page);
            let resp = match page {
                1 => hits_page(1, 10, 50),
                _ => hits_page(11, 0, 50),
            };
            async move { Ok(resp) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2]);
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn paging_treats_not_found_as_end_of_results() {
        let results = collect_search_pages(|_| async { Ok(not_found_page()) }).await.unwrap();
        assert!(results.is_empty());

        let mut requested = Vec::new();
        let results = collect_search_pages(|page| {
            requested.push(page);
            let resp = match page {
                1 => hits_page(1, 10, 25),
                _ => not_found_page(),
            };
            async move { Ok(resp) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2]);
        assert_eq!(results.len(), 10);
    }

    #[tokio::test]
    async fn paging_is_capped() {
        let mut requested = Vec::new();
        let results = collect_search_pages(|page| {
            requested.push(page);
            let resp = hits_page((page as usize - 1) * 10 + 1, 10, 5_000);
            async move { Ok(resp) }
        })
        .await
        .unwrap();

        assert_eq!(requested.len(), MAX_SEARCH_PAGES as usize);
        assert_eq!(requested.last(), Some(&MAX_SEARCH_PAGES));
        assert_eq!(results.len(), 1_000);
    }

    #[tokio::test]
    async fn paging_propagates_page_errors() {
        let mut requested = Vec::new();
        let err = collect_search_pages(|page| {
            requested.push(page);
            let resp = match page {
                1 => Ok(hits_page(1, 10, 30)),
                _ => Err(ClientError::Api("Request limit reached!".to_string())),
            };
            async move { resp }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Api(_)));
        assert_eq!(requested, vec![1, 2]);
    }

    #[test]
    fn field_parsers() {
        assert_eq!(parse_year("2019"), Some(2019));
        assert_eq!(parse_year("2005–2007"), Some(2005));
        assert_eq!(parse_year("N/A"), None);
        assert_eq!(parse_year("99"), None);
        assert_eq!(parse_runtime("90 min"), Some(90));
        assert_eq!(parse_runtime("N/A"), None);
        assert_eq!(parse_genres("Drama"), vec!["Drama".to_string()]);
        assert_eq!(parse_genres(" Comedy ,Romance"), vec!["Comedy".to_string(), "Romance".to_string()]);
    }
}
