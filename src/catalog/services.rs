use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    repo,
    repo_types::{MediaKind, NewFilm},
};

/// Storage seam for the film cache.
#[async_trait]
pub trait FilmStore: Send {
    async fn find_film_id(
        &mut self,
        tmdb_id: i64,
        media_type: MediaKind,
    ) -> anyhow::Result<Option<Uuid>>;

    /// `Ok(None)` means another writer already owns the natural key.
    async fn insert_film_if_absent(&mut self, film: &NewFilm) -> anyhow::Result<Option<Uuid>>;
}

#[async_trait]
impl FilmStore for PgConnection {
    async fn find_film_id(
        &mut self,
        tmdb_id: i64,
        media_type: MediaKind,
    ) -> anyhow::Result<Option<Uuid>> {
        repo::find_film_id(self, tmdb_id, media_type).await
    }

    async fn insert_film_if_absent(&mut self, film: &NewFilm) -> anyhow::Result<Option<Uuid>> {
        repo::insert_film_if_absent(self, film).await
    }
}

/// Returns the local id for `film`, creating the row on first sight.
///
/// Two callers racing on an unseen key can both miss the lookup. The loser's
/// insert is swallowed by the unique constraint and it re-reads the winner's
/// row, so both observe the same id.
pub async fn ensure_film<S>(store: &mut S, film: &NewFilm) -> anyhow::Result<Uuid>
where
    S: FilmStore + ?Sized,
{
    if let Some(id) = store.find_film_id(film.tmdb_id, film.media_type).await? {
        return Ok(id);
    }

    if let Some(id) = store.insert_film_if_absent(film).await? {
        info!(film_id = %id, tmdb_id = film.tmdb_id, media_type = %film.media_type, "film cached");
        return Ok(id);
    }

    debug!(tmdb_id = film.tmdb_id, media_type = %film.media_type, "film inserted concurrently, re-reading");
    store
        .find_film_id(film.tmdb_id, film.media_type)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "film {}/{} missing after conflicting insert",
                film.media_type,
                film.tmdb_id
            )
        })
}
