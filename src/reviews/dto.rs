use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::Rating;
use crate::catalog::MediaKind;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Review submission body. Also carries the film metadata needed to cache it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub tmdb_id: Option<i64>,
    pub media_type: Option<MediaKind>,
    #[serde(default)]
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub rating: Option<f64>,
    pub content: Option<String>,
    pub watched_date: Option<String>,
    #[serde(default)]
    pub has_spoilers: bool,
    #[serde(default)]
    pub is_rewatch: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewResponse {
    pub success: bool,
    pub review_id: Uuid,
}

/// Query of the film reviews read. Review payloads are camelCase both ways.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmReviewsQuery {
    #[serde(default, alias = "media_type")]
    pub media_type: MediaKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub rating: Rating,
    pub content: Option<String>,
    #[serde(with = "iso_date::option")]
    pub watched_date: Option<Date>,
    pub has_spoilers: bool,
    pub is_rewatch: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: ReviewAuthor,
}

/// Reviews of one film plus statistics computed from the same rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmReviews {
    pub reviews: Vec<ReviewView>,
    pub average_rating: f64,
    pub total_reviews: i64,
}
