use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    extract::AppQuery,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct Results<T> {
    pub results: Vec<T>,
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/search/movie", get(search_movie))
        .route("/search/multi", get(search_multi))
        .route("/films/popular", get(popular))
}

fn upstream(e: anyhow::Error) -> AppError {
    AppError::Upstream(format!("{e:#}"))
}

#[instrument(skip(state))]
pub async fn search_movie(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<SearchQuery>,
) -> AppResult<Json<Results<super::MovieSummary>>> {
    let query = q.query.trim();
    if query.is_empty() {
        return Ok(Json(Results { results: Vec::new() }));
    }
    let results = state.metadata.search_movies(query).await.map_err(upstream)?;
    Ok(Json(Results { results }))
}

#[instrument(skip(state))]
pub async fn search_multi(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<SearchQuery>,
) -> AppResult<Json<Results<super::CatalogItem>>> {
    let query = q.query.trim();
    if query.is_empty() {
        return Ok(Json(Results { results: Vec::new() }));
    }
    let results = state.metadata.search_multi(query).await.map_err(upstream)?;
    Ok(Json(Results { results }))
}

#[instrument(skip(state))]
pub async fn popular(
    State(state): State<AppState>,
    AppQuery(p): AppQuery<PageQuery>,
) -> AppResult<Json<Results<super::MovieSummary>>> {
    if !(1..=500).contains(&p.page) {
        return Err(AppError::validation("page", "Page must be between 1 and 500"));
    }
    let results = state.metadata.popular_movies(p.page).await.map_err(upstream)?;
    Ok(Json(Results { results }))
}
