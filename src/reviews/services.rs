use anyhow::Context;
use sqlx::PgPool;
use time::{macros::format_description, Date};
use tracing::info;
use uuid::Uuid;

use super::{
    dto::{FilmReviews, ReviewAuthor, ReviewView, SubmitReviewRequest},
    repo,
    repo_types::{NewReview, Rating, ReviewRow},
};
use crate::{
    catalog::{ensure_film, MediaKind, NewFilm},
    error::{AppError, AppResult},
};

const MAX_CONTENT_LEN: usize = 10_000;
const MAX_TITLE_LEN: usize = 500;

fn parse_date(field: &'static str, raw: Option<&str>) -> AppResult<Option<Date>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| AppError::validation(field, "Expected a YYYY-MM-DD date"))
}

/// Checks a submission before any storage access.
pub fn validate_submission(req: SubmitReviewRequest) -> AppResult<NewReview> {
    let tmdb_id = match req.tmdb_id {
        Some(id) if id > 0 => id,
        Some(_) => return Err(AppError::validation("tmdbId", "Invalid film id")),
        None => return Err(AppError::validation("tmdbId", "Film id is required")),
    };

    let title = req.title.trim().to_owned();
    if title.is_empty() {
        return Err(AppError::validation("title", "Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation("title", "Title is too long"));
    }

    let rating = req
        .rating
        .ok_or_else(|| AppError::validation("rating", "Rating is required"))
        .and_then(|r| {
            Rating::try_from(r).map_err(|e| AppError::validation("rating", e.to_string()))
        })?;

    let content = req
        .content
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty());
    if content
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_CONTENT_LEN)
    {
        return Err(AppError::validation("content", "Review is too long"));
    }

    Ok(NewReview {
        film: NewFilm {
            tmdb_id,
            media_type: req.media_type.unwrap_or_default(),
            title,
            release_date: parse_date("releaseDate", req.release_date.as_deref())?,
            poster_path: req.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: req.backdrop_path.filter(|p| !p.is_empty()),
        },
        rating,
        content,
        watched_date: parse_date("watchedDate", req.watched_date.as_deref())?,
        has_spoilers: req.has_spoilers,
        is_rewatch: req.is_rewatch,
    })
}

/// Caches the film if needed and stores the review, atomically.
pub async fn submit_review(db: &PgPool, user_id: Uuid, review: &NewReview) -> anyhow::Result<Uuid> {
    let mut tx = db.begin().await.context("begin tx")?;
    let movie_id = ensure_film(&mut *tx, &review.film).await?;
    let review_id = repo::insert_review(&mut *tx, user_id, movie_id, review).await?;
    tx.commit().await.context("commit tx")?;

    info!(%review_id, %user_id, %movie_id, rating = review.rating.as_f64(), "review stored");
    Ok(review_id)
}

/// Mean rating rounded half-up to one decimal, computed exactly.
///
/// With half-step counts `h` and `n` ratings the mean in tenths is
/// `10·Σh / 2n`; adding `n` before the integer division rounds half-up.
pub fn average_rating(ratings: &[Rating]) -> f64 {
    let n = ratings.len() as u64;
    if n == 0 {
        return 0.0;
    }
    let sum: u64 = ratings.iter().map(|r| u64::from(r.half_steps())).sum();
    let tenths = (10 * sum + n) / (2 * n);
    tenths as f64 / 10.0
}

fn to_view(row: ReviewRow) -> anyhow::Result<ReviewView> {
    let rating = Rating::try_from(row.rating)
        .with_context(|| format!("stored rating on review {}", row.id))?;
    Ok(ReviewView {
        id: row.id,
        rating,
        content: row.content,
        watched_date: row.watched_date,
        has_spoilers: row.has_spoilers,
        is_rewatch: row.is_rewatch,
        created_at: row.created_at,
        user: ReviewAuthor {
            id: row.user_id,
            username: row.username,
            avatar_url: row.avatar_url,
        },
    })
}

/// Builds the response from one read, so count and mean always agree.
pub fn aggregate(rows: Vec<ReviewRow>) -> anyhow::Result<FilmReviews> {
    let reviews = rows
        .into_iter()
        .map(to_view)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let ratings: Vec<Rating> = reviews.iter().map(|r| r.rating).collect();

    Ok(FilmReviews {
        average_rating: average_rating(&ratings),
        total_reviews: reviews.len() as i64,
        reviews,
    })
}

pub async fn get_reviews(
    db: &PgPool,
    tmdb_id: i64,
    media_type: MediaKind,
) -> anyhow::Result<FilmReviews> {
    let rows = repo::list_for_film(db, tmdb_id, media_type).await?;
    aggregate(rows)
}
