use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

const TMDB_IMAGE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Which listing a catalog query targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Show,
    Movie,
}

/// A show or movie as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub kind: CatalogKind,
    pub name: String,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub rating: Option<f64>,
    pub overview: Option<String>,
}

/// Paging and filter parameters for a listing
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub search: Option<String>,
    pub genre: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            genre: None,
        }
    }
}

impl CatalogQuery {
    /// Clamps paging and drops empty filters; a genre of `all` means no filter
    pub fn normalized(self) -> Self {
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let genre = self
            .genre
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty() && !g.eq_ignore_ascii_case("all"));

        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
            search,
            genre,
        }
    }

    /// Zero-based offset of the first item on the requested page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub total_count: u64,
    pub genres: Vec<String>,
}

// ============================================================================
// TVmaze API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeShow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub rating: Option<TvMazeRating>,
    #[serde(default)]
    pub image: Option<TvMazeImage>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeRating {
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeImage {
    pub medium: Option<String>,
    pub original: Option<String>,
}

impl From<TvMazeShow> for CatalogItem {
    fn from(show: TvMazeShow) -> Self {
        CatalogItem {
            id: show.id.to_string(),
            kind: CatalogKind::Show,
            name: show.name,
            image_url: show.image.and_then(|i| i.medium.or(i.original)),
            genres: show.genres,
            release_date: show.premiered,
            rating: show.rating.and_then(|r| r.average),
            overview: show.summary,
        }
    }
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// Response of `/movie/popular` and `/search/movie`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbListResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl TmdbMovie {
    /// Converts to a catalog item, resolving genre ids through `genres`
    pub fn into_item(self, genres: &HashMap<u32, String>) -> CatalogItem {
        CatalogItem {
            id: self.id.to_string(),
            kind: CatalogKind::Movie,
            name: self.title,
            image_url: self
                .poster_path
                .map(|path| format!("{}{}", TMDB_IMAGE_URL, path)),
            genres: self
                .genre_ids
                .iter()
                .filter_map(|id| genres.get(id).cloned())
                .collect(),
            release_date: self.release_date,
            rating: self.vote_average,
            overview: self.overview,
        }
    }
}

/// Response of `/genre/movie/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub id: u32,
    pub name: String,
}
