use serde::{Deserialize, Serialize};

use crate::catalog::MediaKind;

pub const SEARCH_MOVIE_LIMIT: usize = 5;
pub const SEARCH_MULTI_LIMIT: usize = 8;

/// Paged envelope used by every TMDB list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
}

/// Raw `/search/multi` hit. Movies carry `title`/`release_date`, series
/// carry `name`/`first_air_date`, people carry neither.
#[derive(Debug, Deserialize)]
pub struct MultiResult {
    pub id: i64,
    pub media_type: String,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
}

/// Normalised catalog entry returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub media_type: MediaKind,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
}

impl MultiResult {
    fn into_item(self) -> Option<CatalogItem> {
        let media_type = self.media_type.parse::<MediaKind>().ok()?;
        let title = self.title.or(self.name)?;
        Some(CatalogItem {
            id: self.id,
            media_type,
            title,
            release_date: self.release_date.or(self.first_air_date),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            overview: self.overview,
        })
    }
}

/// Keeps films and series only, in upstream order.
pub fn normalize_multi(results: Vec<MultiResult>) -> Vec<CatalogItem> {
    results
        .into_iter()
        .filter_map(MultiResult::into_item)
        .take(SEARCH_MULTI_LIMIT)
        .collect()
}

/// Turns relative poster paths into absolute image URLs.
pub fn expand_posters(image_base_url: &str, movies: Vec<MovieSummary>) -> Vec<MovieSummary> {
    let base = image_base_url.trim_end_matches('/');
    movies
        .into_iter()
        .map(|mut m| {
            m.poster_path = m.poster_path.map(|p| format!("{base}{p}"));
            m
        })
        .collect()
}
