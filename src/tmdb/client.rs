use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    expand_posters, normalize_multi, CatalogItem, MovieSummary, MultiResult, Page,
    SEARCH_MOVIE_LIMIT,
};
use crate::config::TmdbConfig;

/// Read-only view of the third-party film catalog.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn search_movies(&self, query: &str) -> anyhow::Result<Vec<MovieSummary>>;
    async fn search_multi(&self, query: &str) -> anyhow::Result<Vec<CatalogItem>>;
    async fn popular_movies(&self, page: u32) -> anyhow::Result<Vec<MovieSummary>>;
}

#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
}

impl TmdbClient {
    pub fn new(cfg: &TmdbConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.api_key.clone(),
            image_base_url: cfg.image_base_url.clone(),
        })
    }

    /// GETs `path` and decodes it as `T`; a body that doesn't match `T` is an error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, path, "tmdb request failed");
            anyhow::bail!("GET {path} returned {status}");
        }

        let body = res
            .json::<T>()
            .await
            .map_err(|e| {
                warn!(error = %e, path, "tmdb response failed shape check");
                e
            })
            .with_context(|| format!("decode {path}"))?;
        debug!(path, "tmdb request ok");
        Ok(body)
    }
}

#[async_trait]
impl MetadataClient for TmdbClient {
    async fn search_movies(&self, query: &str) -> anyhow::Result<Vec<MovieSummary>> {
        let page: Page<MovieSummary> = self
            .get_json(
                "/search/movie",
                &[("query", query), ("page", "1"), ("include_adult", "false")],
            )
            .await?;
        Ok(page.results.into_iter().take(SEARCH_MOVIE_LIMIT).collect())
    }

    async fn search_multi(&self, query: &str) -> anyhow::Result<Vec<CatalogItem>> {
        let page: Page<MultiResult> = self
            .get_json(
                "/search/multi",
                &[("query", query), ("page", "1"), ("include_adult", "false")],
            )
            .await?;
        Ok(normalize_multi(page.results))
    }

    async fn popular_movies(&self, page: u32) -> anyhow::Result<Vec<MovieSummary>> {
        let page = page.to_string();
        let body: Page<MovieSummary> = self
            .get_json("/movie/popular", &[("page", page.as_str())])
            .await?;
        Ok(expand_posters(&self.image_base_url, body.results))
    }
}
