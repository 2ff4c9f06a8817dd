//! Catalog gateway over third-party show and movie listings.
//!
//! Each listing comes from a [`CatalogProvider`]: TVmaze for shows and TMDb
//! for movies. Providers own their caches; the gateway normalizes queries,
//! dispatches by kind and fans out invalidation.

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogKind, CatalogPage, CatalogQuery},
};

pub mod tmdb;
pub mod ttl_cache;
pub mod tvmaze;

pub use tmdb::TmdbProvider;
pub use ttl_cache::TtlCache;
pub use tvmaze::TvMazeProvider;

/// Source of one catalog listing
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// One page of the listing; `query` is already normalized
    async fn list(&self, query: &CatalogQuery) -> AppResult<CatalogPage>;

    /// Drops cached upstream data so the next listing refetches
    async fn invalidate(&self) -> AppResult<()>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[derive(Clone)]
pub struct CatalogGateway {
    shows: Arc<dyn CatalogProvider>,
    movies: Arc<dyn CatalogProvider>,
}

impl CatalogGateway {
    pub fn new(shows: Arc<dyn CatalogProvider>, movies: Arc<dyn CatalogProvider>) -> Self {
        Self { shows, movies }
    }

    fn provider(&self, kind: CatalogKind) -> &dyn CatalogProvider {
        match kind {
            CatalogKind::Show => self.shows.as_ref(),
            CatalogKind::Movie => self.movies.as_ref(),
        }
    }

    pub async fn list(&self, kind: CatalogKind, query: CatalogQuery) -> AppResult<CatalogPage> {
        let query = query.normalized();
        let provider = self.provider(kind);

        provider.list(&query).await.map_err(|e| {
            tracing::error!(
                provider = provider.name(),
                page = query.page,
                error = %e,
                "Catalog listing failed"
            );
            e
        })
    }

    /// Invalidates every provider; all are attempted even if one fails
    pub async fn invalidate(&self) -> AppResult<()> {
        let (shows, movies) = tokio::join!(self.shows.invalidate(), self.movies.invalidate());
        tracing::info!("Catalog caches invalidated");
        shows.and(movies)
    }
}
