use anyhow::Context;
use sqlx::PgConnection;
use uuid::Uuid;

use super::repo_types::{MediaKind, NewFilm};

/// Look up a cached film by its natural key.
pub async fn find_film_id(
    conn: &mut PgConnection,
    tmdb_id: i64,
    media_type: MediaKind,
) -> anyhow::Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
          FROM movies
         WHERE tmdb_id = $1 AND media_type = $2
        "#,
    )
    .bind(tmdb_id)
    .bind(media_type.as_str())
    .fetch_optional(conn)
    .await
    .context("find film by tmdb id")?;

    Ok(id)
}

/// Insert a film unless its natural key is taken.
///
/// Returns `None` when the unique constraint on (tmdb_id, media_type) fired.
/// `ON CONFLICT DO NOTHING` keeps an enclosing transaction usable afterwards.
pub async fn insert_film_if_absent(
    conn: &mut PgConnection,
    film: &NewFilm,
) -> anyhow::Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO movies (tmdb_id, media_type, title, release_date, poster_path, backdrop_path)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (tmdb_id, media_type) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(film.tmdb_id)
    .bind(film.media_type.as_str())
    .bind(&film.title)
    .bind(film.release_date)
    .bind(&film.poster_path)
    .bind(&film.backdrop_path)
    .fetch_optional(conn)
    .await
    .context("insert film")?;

    Ok(id)
}
