//! TMDb movie listing
//!
//! TMDb serves 20 movies per page, so a client page of `page_size` items is
//! assembled from `ceil(page_size / 20)` consecutive upstream pages. Upstream
//! responses and the genre list are cached in Redis.

use reqwest::Client as HttpClient;
use std::collections::{HashMap, HashSet};

use crate::{
    cached,
    db::{Cache, CacheKey, MOVIE_KEY_PATTERN},
    error::{AppError, AppResult},
    models::{CatalogPage, CatalogQuery, TmdbGenreList, TmdbListResponse},
    services::catalog::CatalogProvider,
};

const UPSTREAM_PAGE_SIZE: u32 = 20;
/// TMDb rejects page numbers above this
const MAX_UPSTREAM_PAGE: u32 = 500;
const PAGE_CACHE_TTL: u64 = 3600; // 1 hour
const GENRE_CACHE_TTL: u64 = 86400; // 1 day

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

/// Upstream pages backing one client page, as `(first, count)`.
/// `InvalidInput` when the page starts past the last page TMDb serves.
pub fn upstream_pages(query: &CatalogQuery) -> AppResult<(u32, u32)> {
    let needed = query.page_size.div_ceil(UPSTREAM_PAGE_SIZE).max(1);
    let first = (query.page.max(1) - 1)
        .checked_mul(needed)
        .and_then(|skipped| skipped.checked_add(1))
        .filter(|first| *first <= MAX_UPSTREAM_PAGE)
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Page {} is past the end of the listing", query.page))
        })?;
    Ok((first, needed.min(MAX_UPSTREAM_PAGE - first + 1)))
}

/// Merges upstream pages into one client page: de-duplicates by id, resolves
/// genre names, applies the genre filter and truncates to the page size.
pub fn assemble_page(
    responses: Vec<TmdbListResponse>,
    genres: &TmdbGenreList,
    query: &CatalogQuery,
) -> CatalogPage {
    let genre_names: HashMap<u32, String> = genres
        .genres
        .iter()
        .map(|g| (g.id, g.name.clone()))
        .collect();
    let total_count = responses
        .iter()
        .map(|r| r.total_results)
        .max()
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let items = responses
        .into_iter()
        .flat_map(|r| r.results)
        .filter(|movie| seen.insert(movie.id))
        .map(|movie| movie.into_item(&genre_names))
        .filter(|item| {
            query
                .genre
                .as_deref()
                .map_or(true, |genre| item.genres.iter().any(|g| g == genre))
        })
        .take(query.page_size as usize)
        .collect();

    CatalogPage {
        items,
        total_count,
        genres: genres.genres.iter().map(|g| g.name.clone()).collect(),
    }
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDb API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn genres(&self) -> AppResult<TmdbGenreList> {
        cached!(
            self.cache,
            CacheKey::MovieGenres,
            GENRE_CACHE_TTL,
            self.get_json::<TmdbGenreList>("/genre/movie/list", &[])
        )
    }

    async fn page(&self, page: u32, search: Option<&str>) -> AppResult<TmdbListResponse> {
        cached!(
            self.cache,
            CacheKey::MoviePage {
                page,
                search: search.map(str::to_string),
            },
            PAGE_CACHE_TTL,
            async move {
                let mut params = vec![("page", page.to_string())];
                let path = match search {
                    Some(term) => {
                        params.push(("query", term.to_string()));
                        "/search/movie"
                    }
                    None => "/movie/popular",
                };
                self.get_json::<TmdbListResponse>(path, &params).await
            }
        )
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn list(&self, query: &CatalogQuery) -> AppResult<CatalogPage> {
        let genres = self.genres().await?;
        let (first, count) = upstream_pages(query)?;

        let mut responses = Vec::with_capacity(count as usize);
        for page in first..first + count {
            let response = self.page(page, query.search.as_deref()).await?;
            let last_page = response.total_pages;
            responses.push(response);
            if page >= last_page {
                break;
            }
        }

        tracing::debug!(
            first_page = first,
            fetched = responses.len(),
            "Assembled TMDb listing"
        );
        Ok(assemble_page(responses, &genres, query))
    }

    async fn invalidate(&self) -> AppResult<()> {
        self.cache.invalidate_matching(MOVIE_KEY_PATTERN).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{catalog::TmdbGenre, TmdbMovie};

    fn movie(id: u64, title: &str, genre_ids: &[u32]) -> TmdbMovie {
        TmdbMovie {
            id,
            title: title.to_string(),
            poster_path: None,
            release_date: None,
            vote_average: None,
            overview: None,
            genre_ids: genre_ids.to_vec(),
        }
    }

    fn response(results: Vec<TmdbMovie>) -> TmdbListResponse {
        TmdbListResponse {
            results,
            total_results: 400,
            total_pages: 20,
        }
    }

    fn genres() -> TmdbGenreList {
        TmdbGenreList {
            genres: vec![
                TmdbGenre {
                    id: 28,
                    name: "Action".to_string(),
                },
                TmdbGenre {
                    id: 18,
                    name: "Drama".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_upstream_pages_for_page_size() {
        let query = |page, page_size| CatalogQuery {
            page,
            page_size,
            ..Default::default()
        };
        assert_eq!(upstream_pages(&query(1, 20)).unwrap(), (1, 1));
        assert_eq!(upstream_pages(&query(3, 20)).unwrap(), (3, 1));
        assert_eq!(upstream_pages(&query(1, 100)).unwrap(), (1, 5));
        assert_eq!(upstream_pages(&query(2, 100)).unwrap(), (6, 5));
        assert_eq!(upstream_pages(&query(2, 30)).unwrap(), (3, 2));
    }

    #[test]
    fn test_upstream_pages_stop_at_last_tmdb_page() {
        let query = |page, page_size| CatalogQuery {
            page,
            page_size,
            ..Default::default()
        };
        assert_eq!(upstream_pages(&query(500, 20)).unwrap(), (500, 1));
        assert_eq!(upstream_pages(&query(100, 100)).unwrap(), (496, 5));
        assert_eq!(upstream_pages(&query(167, 60)).unwrap(), (499, 2));

        for (page, page_size) in [(501, 20), (101, 100), (1_000_000_000, 100), (u32::MAX, 100)] {
            let err = upstream_pages(&query(page, page_size).normalized()).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "page {page}");
        }
    }

    #[test]
    fn test_assemble_dedupes_and_truncates() {
        let query = CatalogQuery {
            page_size: 2,
            ..Default::default()
        };
        let page = assemble_page(
            vec![
                response(vec![movie(1, "Heat", &[28]), movie(2, "Ronin", &[28])]),
                response(vec![movie(2, "Ronin", &[28]), movie(3, "Drive", &[18])]),
            ],
            &genres(),
            &query,
        );

        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(page.total_count, 400);
        assert_eq!(page.genres, vec!["Action", "Drama"]);
    }

    #[test]
    fn test_assemble_filters_by_resolved_genre() {
        let query = CatalogQuery {
            genre: Some("Drama".to_string()),
            ..Default::default()
        };
        let page = assemble_page(
            vec![response(vec![
                movie(1, "Heat", &[28]),
                movie(3, "Drive", &[18, 28]),
            ])],
            &genres(),
            &query,
        );

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Drive");
        assert_eq!(page.items[0].genres, vec!["Drama", "Action"]);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_invalidate_drops_cached_pages() {
        use crate::db::create_redis_client;

        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let (cache, writer) = Cache::new(create_redis_client(&url).unwrap()).await;
        let provider = TmdbProvider::new(
            cache.clone(),
            "key".to_string(),
            "http://unused".to_string(),
        );

        let popular = CacheKey::MoviePage {
            page: 3,
            search: None,
        };
        cache.set_in_background(&popular, &response(vec![movie(1, "Heat", &[28])]), 60);
        cache.set_in_background(&CacheKey::MovieGenres, &genres(), 60);
        writer.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(cache
            .get_from_cache::<TmdbListResponse>(&popular)
            .await
            .unwrap()
            .is_some());

        provider.invalidate().await.unwrap();

        assert!(cache
            .get_from_cache::<TmdbListResponse>(&popular)
            .await
            .unwrap()
            .is_none());
        assert!(cache
            .get_from_cache::<TmdbGenreList>(&CacheKey::MovieGenres)
            .await
            .unwrap()
            .is_none());
    }
}
