//! TVmaze show listing
//!
//! TVmaze has no server-side search or genre filter on its `/shows` index, so
//! the first `MAX_UPSTREAM_PAGES` index pages are fetched once, kept in a
//! [`TtlCache`] and filtered and paginated locally.

use reqwest::{Client as HttpClient, StatusCode};
use std::{collections::BTreeSet, sync::Arc};

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{CatalogItem, CatalogPage, CatalogQuery, TvMazeShow},
    services::catalog::{CatalogProvider, TtlCache},
};

const MAX_UPSTREAM_PAGES: u32 = 16;
const LISTING_KEY: &str = "shows";

pub struct TvMazeProvider {
    http_client: HttpClient,
    api_url: String,
    listing: TtlCache<&'static str, Arc<Vec<CatalogItem>>>,
}

impl TvMazeProvider {
    pub fn new(api_url: String, ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            listing: TtlCache::new(ttl, clock),
        }
    }

    /// Fetches index pages until one is empty or missing
    async fn fetch_listing(&self) -> AppResult<Arc<Vec<CatalogItem>>> {
        let mut items = Vec::new();

        for page in 0..MAX_UPSTREAM_PAGES {
            let url = format!("{}/shows", self.api_url);
            let response = self
                .http_client
                .get(&url)
                .query(&[("page", page)])
                .send()
                .await?;

            // TVmaze answers 404 past the last index page
            if response.status() == StatusCode::NOT_FOUND {
                break;
            }
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::ExternalApi(format!(
                    "TVmaze API returned status {}: {}",
                    status, body
                )));
            }

            let shows: Vec<TvMazeShow> = response.json().await?;
            if shows.is_empty() {
                break;
            }
            items.extend(shows.into_iter().map(CatalogItem::from));
        }

        tracing::info!(shows = items.len(), "Fetched TVmaze listing");
        Ok(Arc::new(items))
    }
}

/// Filters `items` by name and genre, then cuts out the requested page.
/// The genre list always covers the whole listing so the client can offer
/// every filter.
pub fn select_page(items: &[CatalogItem], query: &CatalogQuery) -> CatalogPage {
    let search = query.search.as_deref().map(str::to_lowercase);

    let matching: Vec<&CatalogItem> = items
        .iter()
        .filter(|item| {
            search
                .as_deref()
                .map_or(true, |s| item.name.to_lowercase().contains(s))
        })
        .filter(|item| {
            query.genre.as_deref().map_or(true, |genre| {
                item.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
            })
        })
        .collect();

    let genres: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.genres.iter().map(String::as_str))
        .collect();

    CatalogPage {
        total_count: matching.len() as u64,
        items: matching
            .into_iter()
            .skip(query.offset())
            .take(query.page_size as usize)
            .cloned()
            .collect(),
        genres: genres.into_iter().map(str::to_string).collect(),
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TvMazeProvider {
    async fn list(&self, query: &CatalogQuery) -> AppResult<CatalogPage> {
        let listing = self
            .listing
            .get_or_try_insert_with(LISTING_KEY, || self.fetch_listing())
            .await?;
        Ok(select_page(&listing, query))
    }

    async fn invalidate(&self) -> AppResult<()> {
        self.listing.clear().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tvmaze"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogKind;

    fn show(id: u32, name: &str, genres: &[&str]) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            kind: CatalogKind::Show,
            name: name.to_string(),
            image_url: None,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            release_date: None,
            rating: None,
            overview: None,
        }
    }

    fn listing() -> Vec<CatalogItem> {
        vec![
            show(1, "Under the Dome", &["Drama", "Science-Fiction"]),
            show(2, "Person of Interest", &["Action", "Crime"]),
            show(3, "Bitten", &["Drama", "Horror"]),
            show(4, "Arrow", &["Action", "Drama"]),
            show(5, "True Detective", &["Crime", "Drama"]),
        ]
    }

    #[test]
    fn test_paginates_with_one_based_pages() {
        let query = CatalogQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        };
        let page = select_page(&listing(), &query);

        assert_eq!(page.total_count, 5);
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4"]);
    }

    #[test]
    fn test_filters_by_search_and_genre() {
        let query = CatalogQuery {
            search: Some("TRUE".to_string()),
            ..Default::default()
        };
        let page = select_page(&listing(), &query);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].name, "True Detective");

        let query = CatalogQuery {
            genre: Some("drama".to_string()),
            ..Default::default()
        };
        assert_eq!(select_page(&listing(), &query).total_count, 4);
    }

    #[test]
    fn test_genres_cover_whole_listing() {
        let query = CatalogQuery {
            genre: Some("Horror".to_string()),
            ..Default::default()
        };
        let page = select_page(&listing(), &query);
        assert_eq!(
            page.genres,
            vec!["Action", "Crime", "Drama", "Horror", "Science-Fiction"]
        );
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let query = CatalogQuery {
            page: 9,
            ..Default::default()
        };
        let page = select_page(&listing(), &query);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 5);
    }
}
