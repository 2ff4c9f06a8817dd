use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UserId;

/// Viewing status of a saved title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    Finished,
    WatchLater,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watching => "watching",
            WatchStatus::Finished => "finished",
            WatchStatus::WatchLater => "watch_later",
        }
    }

    /// Explicit status wins; otherwise the legacy `finished`/`watchLater` flags decide
    pub fn resolve(
        explicit: Option<WatchStatus>,
        finished: Option<bool>,
        watch_later: Option<bool>,
    ) -> Option<WatchStatus> {
        if explicit.is_some() {
            return explicit;
        }
        if finished == Some(true) {
            Some(WatchStatus::Finished)
        } else if watch_later == Some(true) {
            Some(WatchStatus::WatchLater)
        } else {
            None
        }
    }
}

impl FromStr for WatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watching" => Ok(WatchStatus::Watching),
            "finished" => Ok(WatchStatus::Finished),
            "watch_later" => Ok(WatchStatus::WatchLater),
            other => Err(format!("unknown watch status '{}'", other)),
        }
    }
}

/// A show saved to a user's list, with episode progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedShow {
    pub user_id: UserId,
    pub show_id: String,
    pub name: Option<String>,
    pub image: Option<serde_json::Value>,
    pub start_date: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub genres: Vec<String>,
    pub rating: Option<serde_json::Value>,
    pub status: Option<WatchStatus>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a save-show request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveShowInput {
    pub show_id: Option<String>,
    pub name: Option<String>,
    pub image: Option<serde_json::Value>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub rating: Option<serde_json::Value>,
    pub status: Option<WatchStatus>,
    pub finished: Option<bool>,
    pub watch_later: Option<bool>,
}

/// A movie saved to a user's list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedMovie {
    pub user_id: UserId,
    pub movie_id: String,
    pub name: Option<String>,
    pub image: Option<serde_json::Value>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub rating: Option<serde_json::Value>,
    pub status: Option<WatchStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a save-movie request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMovieInput {
    pub movie_id: Option<String>,
    pub name: Option<String>,
    pub image: Option<serde_json::Value>,
    #[serde(alias = "release_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub rating: Option<serde_json::Value>,
    pub status: Option<WatchStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_status_wins() {
        assert_eq!(
            WatchStatus::resolve(Some(WatchStatus::Watching), Some(true), None),
            Some(WatchStatus::Watching)
        );
    }

    #[test]
    fn test_legacy_flags_resolve_status() {
        assert_eq!(
            WatchStatus::resolve(None, Some(true), Some(true)),
            Some(WatchStatus::Finished)
        );
        assert_eq!(
            WatchStatus::resolve(None, Some(false), Some(true)),
            Some(WatchStatus::WatchLater)
        );
        assert_eq!(WatchStatus::resolve(None, None, None), None);
    }

    #[test]
    fn test_save_show_input_accepts_snake_case_dates() {
        let input: SaveShowInput = serde_json::from_str(
            r#"{"showId":"169","name":"Breaking Bad","start_date":"2008-01-20","season":"2","episode":"5"}"#,
        )
        .unwrap();
        assert_eq!(input.show_id.as_deref(), Some("169"));
        assert_eq!(input.start_date.as_deref(), Some("2008-01-20"));
        assert!(input.genres.is_empty());
    }

    #[test]
    fn test_status_round_trips_through_storage_text() {
        for status in [
            WatchStatus::Watching,
            WatchStatus::Finished,
            WatchStatus::WatchLater,
        ] {
            assert_eq!(status.as_str().parse::<WatchStatus>(), Ok(status));
        }
    }
}
