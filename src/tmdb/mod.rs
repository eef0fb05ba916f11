use crate::state::AppState;
use axum::Router;

mod client;
pub mod handlers;
mod types;

pub use client::{MetadataClient, TmdbClient};
pub use types::{CatalogItem, MovieSummary};

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
