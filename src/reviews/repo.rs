use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{NewReview, ReviewRow};
use crate::catalog::MediaKind;

/// Insert a review for an already cached film.
pub async fn insert_review(
    conn: &mut PgConnection,
    user_id: Uuid,
    movie_id: Uuid,
    review: &NewReview,
) -> anyhow::Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO reviews (user_id, movie_id, rating, content, watched_date, has_spoilers, is_rewatch)
        VALUES ($1, $2, CAST($3 AS NUMERIC(2, 1)), $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(review.rating.as_f64())
    .bind(&review.content)
    .bind(review.watched_date)
    .bind(review.has_spoilers)
    .bind(review.is_rewatch)
    .fetch_one(conn)
    .await
    .context("insert review")?;

    Ok(id)
}

/// All reviews of one film with their authors, newest first.
///
/// A film that was never cached simply yields no rows.
pub async fn list_for_film(
    db: &PgPool,
    tmdb_id: i64,
    media_type: MediaKind,
) -> anyhow::Result<Vec<ReviewRow>> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT r.id, r.rating::float8 AS rating, r.content, r.watched_date,
               r.has_spoilers, r.is_rewatch, r.created_at,
               u.id AS user_id, u.username, u.avatar_url
          FROM reviews r
          JOIN movies m ON m.id = r.movie_id
          JOIN users u ON u.id = r.user_id
         WHERE m.tmdb_id = $1 AND m.media_type = $2
         ORDER BY r.created_at DESC, r.id DESC
        "#,
    )
    .bind(tmdb_id)
    .bind(media_type.as_str())
    .fetch_all(db)
    .await
    .context("list reviews by film")?;

    Ok(rows)
}
