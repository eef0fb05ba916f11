use crate::auth::SessionKeys;
use crate::config::AppConfig;
use crate::tmdb::{MetadataClient, TmdbClient};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub keys: SessionKeys,
    pub metadata: Arc<dyn MetadataClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // One connection per in-flight request; sessions hold none.
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let metadata = Arc::new(TmdbClient::new(&config.tmdb)?) as Arc<dyn MetadataClient>;

        Ok(Self::from_parts(db, config, metadata))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, metadata: Arc<dyn MetadataClient>) -> Self {
        Self {
            keys: SessionKeys::new(&config.jwt),
            db,
            config,
            metadata,
        }
    }

    /// State whose pool never connects and whose catalog is canned.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = crate::config::test_config();
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool ok");
        Self::with_pool(db)
    }

    /// Test state over a real pool, with the canned catalog.
    #[cfg(test)]
    pub fn with_pool(db: PgPool) -> Self {
        use crate::catalog::MediaKind;
        use crate::tmdb::{CatalogItem, MovieSummary};
        use async_trait::async_trait;

        #[derive(Clone)]
        struct FakeMetadata;
        #[async_trait]
        impl MetadataClient for FakeMetadata {
            async fn search_movies(&self, query: &str) -> anyhow::Result<Vec<MovieSummary>> {
                if query == "fail" {
                    anyhow::bail!("tmdb unavailable");
                }
                Ok(vec![MovieSummary {
                    id: 550,
                    title: format!("{query} result"),
                    poster_path: None,
                    backdrop_path: None,
                    release_date: Some("1999-10-15".into()),
                    vote_average: 8.4,
                    overview: String::new(),
                }])
            }
            async fn search_multi(&self, query: &str) -> anyhow::Result<Vec<CatalogItem>> {
                Ok(vec![CatalogItem {
                    id: 1399,
                    media_type: MediaKind::Tv,
                    title: format!("{query} series"),
                    release_date: None,
                    poster_path: None,
                    backdrop_path: None,
                    overview: String::new(),
                }])
            }
            async fn popular_movies(&self, _page: u32) -> anyhow::Result<Vec<MovieSummary>> {
                Ok(Vec::new())
            }
        }

        let config = Arc::new(crate::config::test_config());
        Self::from_parts(db, config, Arc::new(FakeMetadata))
    }
}
